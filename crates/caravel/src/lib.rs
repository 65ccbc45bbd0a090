//! Library interface for the `caravel` CLI.
//!
//! This crate exposes the CLI's argument parser as a library, primarily
//! for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`report`] - Terminal rendering of pipeline progress and results

pub mod report;

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG           Log filter (e.g., debug, caravel=trace)
    GITHUB_TOKEN       Token for creating GitHub releases (optional)
";

/// Command-line interface definition for caravel.
#[derive(Parser)]
#[command(name = "caravel")]
#[command(
    about = "One-command npm package releases: bump, test, build, tag, push, publish",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// Version bump: major, minor, patch, or an explicit version
    #[arg(value_name = "BUMP", required_unless_present = "preid")]
    pub bump: Option<String>,

    /// Pre-release identifier (e.g., "beta" yields 1.2.3-beta.0)
    #[arg(long, value_name = "ID")]
    pub preid: Option<String>,

    /// Release notes for the tag annotation and GitHub release
    #[arg(short = 'm', long, value_name = "TEXT")]
    pub notes: Option<String>,

    /// Preview the release without committing, pushing, or publishing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run as if started in DIR
    #[arg(short = 'C', long, value_name = "DIR")]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output the release summary as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
