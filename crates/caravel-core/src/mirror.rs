//! Secondary-repo mirror: republish build artifacts under the same tag.
//!
//! Clones the secondary repository into a scratch directory, swaps its
//! tracked contents for the freshly built artifacts, and commits, tags,
//! and pushes in lockstep with the primary release. The clone and the
//! directory surgery are unconditional so a dry run still validates the
//! mirror; only the git mutations are guarded.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::git;
use crate::manifest::MirrorConfig;
use crate::runner::{CommandRunner, ExecError};

/// Errors from the mirror sub-procedure.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Filesystem manipulation failed.
    #[error("mirror failed at {path}: {source}")]
    Io {
        /// The path being manipulated.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A git command failed. The clone in particular is fatal to the
    /// whole pipeline — nothing useful can happen without it.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Result alias for mirror operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Mirror the build output into the secondary repository.
#[instrument(skip(runner, cfg), fields(repo = %cfg.repo_url, %tag))]
pub fn run(
    runner: &CommandRunner,
    project_root: &Utf8Path,
    cfg: &MirrorConfig,
    tag: &str,
    tag_message: &str,
) -> MirrorResult<()> {
    let work = project_root.join(&cfg.work_dir);

    // Idempotent cleanup of a previous run.
    if work.exists() {
        remove_tree(&work)?;
    }

    git::clone(runner, project_root, &cfg.repo_url, cfg.work_dir.as_str())?;

    clear_except_git(&work)?;
    copy_contents(&project_root.join(&cfg.build_dir), &work)?;

    git::stage_all(runner, &work)?;
    git::commit(runner, &work, &format!("Release {tag}"))?;
    git::tag(runner, &work, tag, tag_message)?;
    // Both pushes, independently, matching the primary repo.
    let branches = git::push(runner, &work);
    let tags = git::push_tags(runner, &work);
    branches?;
    tags?;

    if runner.is_dry_run() {
        debug!(%work, "dry-run: leaving mirror work dir in place");
    } else {
        remove_tree(&work)?;
    }

    Ok(())
}

/// Delete everything in the work dir except the `.git` metadata.
fn clear_except_git(work: &Utf8Path) -> MirrorResult<()> {
    for entry in read_dir(work)? {
        let entry = entry.map_err(|source| MirrorError::Io {
            path: work.to_owned(),
            source,
        })?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|p| MirrorError::Io {
            path: work.to_owned(),
            source: std::io::Error::other(format!("non-UTF-8 path: {}", p.display())),
        })?;
        if path.is_dir() {
            remove_tree(&path)?;
        } else {
            std::fs::remove_file(&path).map_err(|source| MirrorError::Io { path, source })?;
        }
    }
    Ok(())
}

/// Recursively copy the contents of `from` into `into`.
fn copy_contents(from: &Utf8Path, into: &Utf8Path) -> MirrorResult<()> {
    for entry in read_dir(from)? {
        let entry = entry.map_err(|source| MirrorError::Io {
            path: from.to_owned(),
            source,
        })?;
        let src = Utf8PathBuf::from_path_buf(entry.path()).map_err(|p| MirrorError::Io {
            path: from.to_owned(),
            source: std::io::Error::other(format!("non-UTF-8 path: {}", p.display())),
        })?;
        let dest = into.join(src.file_name().unwrap_or_default());
        if src.is_dir() {
            std::fs::create_dir_all(&dest).map_err(|source| MirrorError::Io {
                path: dest.clone(),
                source,
            })?;
            copy_contents(&src, &dest)?;
        } else {
            std::fs::copy(&src, &dest).map_err(|source| MirrorError::Io {
                path: dest.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

fn read_dir(path: &Utf8Path) -> MirrorResult<std::fs::ReadDir> {
    std::fs::read_dir(path).map_err(|source| MirrorError::Io {
        path: path.to_owned(),
        source,
    })
}

fn remove_tree(path: &Utf8Path) -> MirrorResult<()> {
    std::fs::remove_dir_all(path).map_err(|source| MirrorError::Io {
        path: path.to_owned(),
        source,
    })
}
