//! The fatal error taxonomy for the release pipeline.
//!
//! Everything here terminates the run with a single human-readable
//! message and exit code 1. The one tolerated failure — the GitHub
//! release call — never reaches this type; the orchestrator logs it
//! and moves on.

use thiserror::Error;

/// Errors that abort the release pipeline.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The working tree has uncommitted changes.
    #[error("working tree has uncommitted changes — commit or stash them first")]
    DirtyWorkingTree,

    /// The local branch is behind its upstream.
    #[error("local branch is {behind} commit(s) behind its upstream — pull first")]
    StaleBranch {
        /// How many commits behind.
        behind: u64,
    },

    /// Neither a bump kind nor a pre-release identifier was supplied.
    #[error("nothing to do: supply a bump kind (major, minor, patch, or a version) or --preid")]
    InvalidRequest,

    /// A changelog generator is declared but not installed.
    #[error("{tool} is declared in devDependencies but is not on PATH")]
    MissingChangelogTool {
        /// The generator's binary name.
        tool: String,
    },

    /// The build failed; the version bump was rolled back.
    #[error("build failed (version bump rolled back): {message}")]
    BuildFailed {
        /// The build command's failure report.
        message: String,
    },

    /// Could not update the changelog file.
    #[error("failed to update the changelog: {0}")]
    Changelog(#[source] std::io::Error),

    /// Version resolution failed.
    #[error(transparent)]
    Version(#[from] crate::version::VersionError),

    /// Repository URL parsing failed.
    #[error(transparent)]
    Remote(#[from] crate::remote::RemoteError),

    /// Manifest handling failed.
    #[error(transparent)]
    Manifest(#[from] crate::manifest::ManifestError),

    /// An external command failed.
    #[error(transparent)]
    Exec(#[from] crate::runner::ExecError),

    /// The secondary-repo mirror failed.
    #[error(transparent)]
    Mirror(#[from] crate::mirror::MirrorError),
}

/// Result alias using [`ReleaseError`].
pub type ReleaseResult<T> = Result<T, ReleaseError>;
