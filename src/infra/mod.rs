pub mod git;
pub mod ollama;

pub use git::GitCli;
pub use ollama::OllamaClient;
