use std::path::Path;

use relchain::context::AppContext;
use relchain::domain::version::VersionBump;
use relchain::error::ReleaseResult;
use relchain::workflow::release::execute_release;

pub async fn run(
    ctx: &AppContext,
    repo_path: &Path,
    bump: Option<VersionBump>,
    dry_run: bool,
) -> ReleaseResult<()> {
    let outcome = execute_release(ctx, repo_path, bump, dry_run).await?;

    if outcome.dry_run {
        println!(
            "Dry run: {} -> {} ({} bump, content from {})",
            outcome.previous_version,
            outcome.version,
            outcome.bump,
            outcome.content.source.as_str()
        );
        println!("Would update:");
        for path in &outcome.staged_files {
            println!("  {}", path.display());
        }
        println!("Would tag: {}", outcome.tag);
        println!("\n{}", outcome.content.release_notes);
    } else {
        println!(
            "Released {} ({} bump, content from {})",
            outcome.version,
            outcome.bump,
            outcome.content.source.as_str()
        );
        println!("Tagged: {}", outcome.tag);
    }
    Ok(())
}
