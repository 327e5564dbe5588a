use std::path::Path;

use relchain::context::AppContext;
use relchain::error::ReleaseResult;
use relchain::workflow::status::release_status;

pub async fn run(ctx: &AppContext, repo_path: &Path) -> ReleaseResult<()> {
    let status = release_status(ctx, repo_path).await?;

    println!("Current version: {}", status.current_version);
    println!("Pending commits: {}", status.pending_commits);
    if !status.contributors.is_empty() {
        let contributors: Vec<&str> = status.contributors.iter().map(String::as_str).collect();
        println!("Contributors: {}", contributors.join(", "));
    }
    println!("Suggested bump: {}", status.suggested_bump);
    if status.ready_for_release {
        println!("Ready for release.");
    } else {
        println!("No releasable changes.");
    }
    Ok(())
}
