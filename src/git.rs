// Git helpers: resolve which commit is being published by shelling out
// to the local `git` binary.

use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("couldn't run `git {args}`: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`git {args}` failed: {stderr}")]
    Failed { args: String, stderr: String },
}

/// Run git with `args` inside `dir` and return trimmed stdout.
fn git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| GitError::Spawn {
            args: args.join(" "),
            source,
        })?;
    if !output.status.success() {
        return Err(GitError::Failed {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Full hash of `HEAD`.
pub fn head_commit(dir: &Path) -> Result<String, GitError> {
    git(dir, &["rev-parse", "HEAD"])
}

/// Tag pointing exactly at `HEAD`, if any.
pub fn exact_tag(dir: &Path) -> Option<String> {
    match git(dir, &["describe", "--exact-match", "HEAD"]) {
        Ok(tag) if !tag.is_empty() => Some(tag),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("no exact tag for HEAD: {e}");
            None
        }
    }
}

/// Version label sent with a tag record: the exact release tag when HEAD
/// has one, otherwise the commit hash itself.
pub fn release_version(dir: &Path, commit: &str) -> String {
    exact_tag(dir).unwrap_or_else(|| commit.to_string())
}
