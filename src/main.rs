mod cmd;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relchain::config::ReleaseConfig;
use relchain::context::AppContext;
use relchain::domain::version::VersionBump;
use relchain::error::ReleaseResult;
use relchain::infra::git::GitCli;
use relchain::infra::ollama::OllamaClient;

use crate::cmd::config::{self as config_cmd, ConfigArgs};

#[derive(Parser)]
#[command(name = "relchain", author, version, about = "Release preparation pipeline")]
struct Cli {
    /// Repository to operate on. Defaults to the current directory.
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the release chain: classify commits, bump the version, generate
    /// content, and commit and tag the result.
    Release(ReleaseArgs),
    /// Show pending commits and the release they would produce.
    Status,
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct ReleaseArgs {
    /// Force a specific bump instead of deriving it from the commits.
    #[arg(long, value_parser = parse_bump)]
    bump: Option<VersionBump>,

    /// Compute everything but write, commit, and tag nothing.
    #[arg(long)]
    dry_run: bool,
}

fn parse_bump(value: &str) -> Result<VersionBump, String> {
    VersionBump::parse(value)
        .ok_or_else(|| format!("'{value}' is not one of none, patch, minor, major"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relchain=info")),
        )
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> ReleaseResult<()> {
    let cli = Cli::parse();
    let repo_path = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Release(args) => {
            let ctx = build_context(&repo_path)?;
            cmd::release::run(&ctx, &repo_path, args.bump, args.dry_run).await
        }
        Commands::Status => {
            let ctx = build_context(&repo_path)?;
            cmd::status::run(&ctx, &repo_path).await
        }
    }
}

fn build_context(repo_path: &std::path::Path) -> ReleaseResult<AppContext> {
    let config = ReleaseConfig::load(repo_path)?;
    let version_control = Arc::new(GitCli::new(repo_path.to_path_buf()));
    let language_model = Arc::new(OllamaClient::new(&config.ai));
    let content_cache = relchain::config::config_directory()
        .ok()
        .map(|dir| dir.join("content_cache.json"));
    Ok(AppContext::new(
        config,
        version_control,
        language_model,
        content_cache,
    ))
}
