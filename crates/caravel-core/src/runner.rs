//! The step executor: the effect boundary for external commands.
//!
//! Every external tool (git, npm, the changelog generator) is invoked
//! through a [`CommandRunner`]. Commands come in two flavors:
//!
//! - **required** — always executed, including under `--dry-run`
//!   (preflight checks, tests, builds, clones all fall in this bucket).
//! - **guarded** — suppressed under `--dry-run` (anything that commits,
//!   tags, pushes, or publishes).
//!
//! Arguments are structured lists, never interpolated shell strings, and
//! the runner never changes the process working directory — callers pass
//! the directory each command should run in.

use std::process::Command;

use camino::Utf8Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from command execution.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that failed to spawn.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited non-zero.
    #[error("`{command}` exited with status {status}: {detail}")]
    Failed {
        /// The rendered command line.
        command: String,
        /// The exit status code (-1 when killed by a signal).
        status: i32,
        /// Captured stderr (or stdout when stderr is empty).
        detail: String,
    },
}

/// Result alias for executor operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Captured output of an executed command.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Exit status code.
    pub status: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Executes external commands, suppressing dangerous ones under dry-run.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    dry_run: bool,
    verbose: bool,
}

impl CommandRunner {
    /// Create a runner.
    pub const fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }

    /// Whether guarded commands are being suppressed.
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a command that must succeed; executes even under dry-run.
    ///
    /// A non-zero exit is an [`ExecError::Failed`] carrying the captured
    /// output, which the pipeline treats as fatal.
    pub fn required(&self, cwd: &Utf8Path, program: &str, args: &[&str]) -> ExecResult<StepOutput> {
        let rendered = render(program, args);
        debug!(command = %rendered, %cwd, "running");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd.as_std_path())
            .output()
            .map_err(|source| ExecError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        // Captured output is only echoed when asked for; it still rides
        // along in the error report either way.
        if self.verbose {
            if !stdout.is_empty() {
                eprint!("{stdout}");
            }
            if !stderr.is_empty() {
                eprint!("{stderr}");
            }
        }

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_owned()
            } else {
                stderr.trim().to_owned()
            };
            return Err(ExecError::Failed {
                command: rendered,
                status: output.status.code().unwrap_or(-1),
                detail,
            });
        }

        Ok(StepOutput {
            status: output.status.code().unwrap_or(0),
            stdout,
            stderr,
        })
    }

    /// Run a side-effecting command, unless this is a dry run.
    ///
    /// Returns `Ok(None)` when the command was suppressed.
    pub fn guarded(
        &self,
        cwd: &Utf8Path,
        program: &str,
        args: &[&str],
    ) -> ExecResult<Option<StepOutput>> {
        if self.dry_run {
            info!(command = %render(program, args), "dry-run: skipping");
            return Ok(None);
        }
        self.required(cwd, program, args).map(Some)
    }
}

/// Render a program and argument list for logs and error messages.
fn render(program: &str, args: &[&str]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        if arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwd() -> camino::Utf8PathBuf {
        camino::Utf8PathBuf::from(".")
    }

    #[test]
    fn required_captures_stdout() {
        let runner = CommandRunner::new(false, false);
        let out = runner
            .required(&cwd(), "sh", &["-c", "printf hello"])
            .unwrap();
        assert_eq!(out.stdout, "hello");
        assert_eq!(out.status, 0);
    }

    #[test]
    fn required_failure_carries_status_and_detail() {
        let runner = CommandRunner::new(false, false);
        let err = runner
            .required(&cwd(), "sh", &["-c", "echo boom >&2; exit 3"])
            .unwrap_err();
        match err {
            ExecError::Failed {
                status, detail, ..
            } => {
                assert_eq!(status, 3);
                assert_eq!(detail, "boom");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn required_failure_falls_back_to_stdout_detail() {
        let runner = CommandRunner::new(false, false);
        let err = runner
            .required(&cwd(), "sh", &["-c", "echo oops; exit 1"])
            .unwrap_err();
        match err {
            ExecError::Failed { detail, .. } => assert_eq!(detail, "oops"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn required_runs_even_in_dry_run() {
        let runner = CommandRunner::new(true, false);
        let out = runner.required(&cwd(), "sh", &["-c", "printf ran"]).unwrap();
        assert_eq!(out.stdout, "ran");
    }

    #[test]
    fn guarded_skips_in_dry_run() {
        let runner = CommandRunner::new(true, false);
        // Would fail loudly if it actually executed.
        let out = runner.guarded(&cwd(), "sh", &["-c", "exit 1"]).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn guarded_executes_normally() {
        let runner = CommandRunner::new(false, false);
        let out = runner
            .guarded(&cwd(), "sh", &["-c", "printf live"])
            .unwrap();
        assert_eq!(out.unwrap().stdout, "live");
    }

    #[test]
    fn spawn_failure_reported() {
        let runner = CommandRunner::new(false, false);
        let err = runner
            .required(&cwd(), "definitely-not-a-real-binary", &[])
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn render_quotes_whitespace_args() {
        assert_eq!(
            render("git", &["commit", "-m", "Release v1.0.0"]),
            "git commit -m \"Release v1.0.0\""
        );
    }
}
