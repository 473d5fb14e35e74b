//! Git repository discovery.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::RerereError;

/// Run a git command in `dir` and return trimmed stdout, or a [`RerereError`].
fn git_cmd(dir: &Path, args: &[&str]) -> Result<String, RerereError> {
    let out = Command::new("git").args(args).current_dir(dir).output()?;
    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).trim_end().to_owned())
    } else {
        Err(RerereError::GitCommand {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
        })
    }
}

/// Locate the `.git` directory for the repository containing `dir`.
///
/// `git rev-parse --git-dir` returns a path relative to the working
/// directory when the caller sits at the repository root, so relative
/// results are resolved against `dir`.
///
/// # Errors
/// Returns [`RerereError::GitCommand`] when `dir` is not inside a git
/// repository or git itself fails.
pub fn discover_git_dir(dir: &Path) -> Result<PathBuf, RerereError> {
    let raw = git_cmd(dir, &["rev-parse", "--git-dir"])?;
    let path = PathBuf::from(&raw);
    let git_dir = if path.is_absolute() {
        path
    } else {
        dir.join(path)
    };
    debug!(git_dir = %git_dir.display(), "discovered git dir");
    Ok(git_dir)
}
