//! Core library for caravel.
//!
//! This crate provides the release pipeline used by the `caravel` CLI
//! and any downstream consumers.
//!
//! # Modules
//!
//! - [`changelog`] - Changelog generation via a declared generator tool
//! - [`error`] - The fatal error taxonomy and result alias
//! - [`git`] - Git operations for release workflows
//! - [`github`] - GitHub releases API collaborator
//! - [`manifest`] - The package.json model
//! - [`mirror`] - Secondary-repo mirroring of build artifacts
//! - [`pipeline`] - The release orchestrator (plan, then execute)
//! - [`remote`] - Repository identity parsing from manifest URLs
//! - [`runner`] - The step executor for external commands
//! - [`version`] - Version bump resolution
//!
//! # Quick Start
//!
//! ```no_run
//! use caravel_core::{BumpKind, ReleaseRequest, plan_release};
//! use camino::Utf8Path;
//!
//! let request = ReleaseRequest {
//!     bump: Some(BumpKind::Minor),
//!     dry_run: true,
//!     ..Default::default()
//! };
//!
//! let plan = plan_release(Utf8Path::new("."), request).expect("preflight failed");
//! println!("releasing {} -> {}", plan.previous, plan.next);
//! ```
#![deny(unsafe_code)]

pub mod changelog;

pub mod error;

pub mod git;

pub mod github;

pub mod manifest;

pub mod mirror;

pub mod pipeline;

pub mod remote;

pub mod runner;

pub mod version;

pub use error::{ReleaseError, ReleaseResult};

pub use manifest::{Manifest, MirrorConfig};

pub use pipeline::{
    ReleaseEvent, ReleaseOutcome, ReleasePlan, ReleaseRequest, Step, StepStatus, plan_release,
};

pub use runner::CommandRunner;

pub use version::BumpKind;

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
