//! Git repository bootstrap for freshly scaffolded projects

use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Initialize a repository in `dir` and record the scaffolded files as the
/// initial commit. Callers downgrade a failure here to a skipped step; a
/// missing git identity or an already-initialized directory must not abort
/// the whole flow.
pub async fn init_repository(dir: &Path) -> Result<()> {
    run_git(dir, &["init", "--quiet"]).await?;
    run_git(dir, &["add", "-A"]).await?;
    run_git(dir, &["commit", "--quiet", "-m", "Initial commit"]).await?;
    Ok(())
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .with_context(|| format!("Failed to spawn git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(())
}
