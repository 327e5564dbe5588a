pub mod commit;
pub mod content;
pub mod release;
pub mod version;

pub use commit::{CommitRecord, CommitSummary, CommitType, RawCommit};
pub use content::{ContentSource, GeneratedContent};
pub use release::{ReleaseContext, ReleaseOutcome, ReleaseStatus};
pub use version::VersionBump;
