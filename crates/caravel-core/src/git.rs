//! Git operations for the release pipeline.
//!
//! Shells out to `git` through the [`CommandRunner`] so the user's SSH
//! keys, signing setup, and hooks all apply. Mutating operations go
//! through [`CommandRunner::guarded`] and are therefore suppressed under
//! dry-run; inspection and fetching are not.

use camino::Utf8Path;
use tracing::debug;

use crate::runner::{CommandRunner, ExecError, ExecResult, StepOutput};

/// Check whether the working tree is clean (no staged or unstaged changes).
pub fn is_clean(runner: &CommandRunner, cwd: &Utf8Path) -> ExecResult<bool> {
    let out = runner.required(cwd, "git", &["status", "--porcelain"])?;
    let clean = out.stdout.trim().is_empty();
    debug!(clean, "working tree status");
    Ok(clean)
}

/// How many commits the local branch is behind its upstream.
///
/// Fetches first so the comparison is against fresh remote refs. No
/// upstream configured means there is nothing to be stale against, so
/// the answer is zero. A failed fetch is tolerated; the comparison then
/// runs against whatever refs are already local.
#[expect(clippy::literal_string_with_formatting_args)]
pub fn behind_upstream(runner: &CommandRunner, cwd: &Utf8Path) -> ExecResult<u64> {
    // @{upstream} is a git refspec, not a format arg
    match runner.required(cwd, "git", &["rev-parse", "--abbrev-ref", "@{upstream}"]) {
        Ok(_) => {}
        Err(ExecError::Failed { .. }) => {
            debug!("no upstream tracking branch");
            return Ok(0);
        }
        Err(e) => return Err(e),
    }

    if let Err(e) = runner.required(cwd, "git", &["fetch", "--quiet"]) {
        debug!(error = %e, "fetch failed; comparing against local refs");
    }

    let out = runner.required(cwd, "git", &["rev-list", "--count", "HEAD..@{upstream}"])?;
    let behind = out.stdout.trim().parse().unwrap_or(0);
    debug!(behind, "upstream comparison");
    Ok(behind)
}

/// Stage a single file (guarded).
pub fn stage(runner: &CommandRunner, cwd: &Utf8Path, path: &str) -> ExecResult<Option<StepOutput>> {
    runner.guarded(cwd, "git", &["add", path])
}

/// Stage everything, including deletions (guarded).
pub fn stage_all(runner: &CommandRunner, cwd: &Utf8Path) -> ExecResult<Option<StepOutput>> {
    runner.guarded(cwd, "git", &["add", "-A"])
}

/// Unstage a single file. Best-effort rollback helper; callers decide
/// whether a failure matters.
pub fn unstage(runner: &CommandRunner, cwd: &Utf8Path, path: &str) -> ExecResult<StepOutput> {
    runner.required(cwd, "git", &["reset", "-q", "--", path])
}

/// Commit staged changes (guarded).
pub fn commit(
    runner: &CommandRunner,
    cwd: &Utf8Path,
    message: &str,
) -> ExecResult<Option<StepOutput>> {
    runner.guarded(cwd, "git", &["commit", "-m", message])
}

/// Create an annotated tag (guarded).
pub fn tag(
    runner: &CommandRunner,
    cwd: &Utf8Path,
    name: &str,
    message: &str,
) -> ExecResult<Option<StepOutput>> {
    runner.guarded(cwd, "git", &["tag", "-a", name, "-m", message])
}

/// Push commits to the default remote (guarded).
pub fn push(runner: &CommandRunner, cwd: &Utf8Path) -> ExecResult<Option<StepOutput>> {
    runner.guarded(cwd, "git", &["push"])
}

/// Push tags to the default remote (guarded).
pub fn push_tags(runner: &CommandRunner, cwd: &Utf8Path) -> ExecResult<Option<StepOutput>> {
    runner.guarded(cwd, "git", &["push", "--tags"])
}

/// Clone a repository into a destination directory. Unconditional: the
/// mirror must be prepared even in a dry run.
pub fn clone(
    runner: &CommandRunner,
    cwd: &Utf8Path,
    url: &str,
    dest: &str,
) -> ExecResult<StepOutput> {
    runner.required(cwd, "git", &["clone", "--quiet", url, dest])
}

#[cfg(test)]
mod tests {
    use super::*;

    // Guard suppression is the contract worth pinning here; the
    // pipeline integration tests exercise the real git plumbing
    // against throwaway repositories.

    #[test]
    fn mutating_operations_skip_in_dry_run() {
        let runner = CommandRunner::new(true, false);
        let cwd = camino::Utf8PathBuf::from(".");

        assert!(stage(&runner, &cwd, "package.json").unwrap().is_none());
        assert!(stage_all(&runner, &cwd).unwrap().is_none());
        assert!(commit(&runner, &cwd, "Release v0.0.0").unwrap().is_none());
        assert!(tag(&runner, &cwd, "v0.0.0", "v0.0.0").unwrap().is_none());
        assert!(push(&runner, &cwd).unwrap().is_none());
        assert!(push_tags(&runner, &cwd).unwrap().is_none());
    }
}
