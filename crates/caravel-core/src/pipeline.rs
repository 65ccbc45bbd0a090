//! Release orchestrator — the pipeline state machine.
//!
//! # Two-phase workflow
//!
//! 1. **Plan** ([`plan_release`]) — load the manifest, verify the
//!    changelog tool, check the working tree and upstream, resolve the
//!    next version. All checks pass before anything is mutated.
//! 2. **Execute** ([`ReleasePlan::execute`]) — run the steps in order:
//!    test, bump, build, changelog, commit + tag, push, GitHub release,
//!    registry publish, secondary mirror. Events are emitted at step
//!    boundaries so the CLI can render progress.
//!
//! Failure policy: every failure is fatal and immediate except the
//! GitHub release call, which is logged and swallowed — by the time it
//! runs the tag is already pushed, and a missing release note should
//! not sink the release. A build failure additionally rolls back the
//! version bump (file restored, staging undone) before aborting; no
//! deeper rollback exists.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::changelog;
use crate::error::{ReleaseError, ReleaseResult};
use crate::git;
use crate::github::{self, ReleasePayload};
use crate::manifest::{MANIFEST_FILE, Manifest, ManifestError, MirrorConfig};
use crate::mirror;
use crate::remote;
use crate::runner::CommandRunner;
use crate::version::{self, BumpKind};

// ──────────────────────────────────────────────
// Request
// ──────────────────────────────────────────────

/// What the user asked for. Immutable once parsed from the CLI.
///
/// Invariant: `bump` and `preid` cannot both be absent (checked at plan
/// time and by the CLI's argument requirements).
#[derive(Debug, Clone, Default)]
pub struct ReleaseRequest {
    /// The version bump to apply.
    pub bump: Option<BumpKind>,
    /// Pre-release identifier (e.g., `"beta"`).
    pub preid: Option<String>,
    /// Suppress guarded commands; preview only.
    pub dry_run: bool,
    /// Echo captured command output.
    pub verbose: bool,
    /// Release notes for the tag annotation and GitHub release body.
    pub notes: Option<String>,
}

// ──────────────────────────────────────────────
// Steps and events
// ──────────────────────────────────────────────

/// Steps of the release pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Clean-tree and freshness checks (validated during planning).
    Preflight,
    /// Run the package's test script.
    Test,
    /// Write the new version into package.json and stage it.
    Bump,
    /// Run the package's build script.
    Build,
    /// Generate and prepend the changelog section.
    Changelog,
    /// Commit staged files and create the annotated tag.
    Commit,
    /// Push commits and tags.
    Push,
    /// Create the GitHub release.
    GithubRelease,
    /// Publish to the npm registry.
    Publish,
    /// Mirror build artifacts into the secondary repository.
    Mirror,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preflight => write!(f, "preflight"),
            Self::Test => write!(f, "test"),
            Self::Bump => write!(f, "bump"),
            Self::Build => write!(f, "build"),
            Self::Changelog => write!(f, "changelog"),
            Self::Commit => write!(f, "commit"),
            Self::Push => write!(f, "push"),
            Self::GithubRelease => write!(f, "github-release"),
            Self::Publish => write!(f, "publish"),
            Self::Mirror => write!(f, "mirror"),
        }
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StepStatus {
    /// The step ran and succeeded.
    Success {
        /// What happened.
        message: String,
    },
    /// The step did not apply.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// Dry run: the step's side effects were suppressed.
    DryRun {
        /// What would have happened.
        message: String,
    },
}

/// Events emitted while the pipeline runs, for progress display.
#[derive(Debug, Clone)]
pub enum ReleaseEvent {
    /// A step is starting.
    StepStarted(Step),
    /// A step finished with the given status.
    StepCompleted(Step, StepStatus),
}

/// Summary of a completed (or previewed) release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    /// The released version.
    pub version: Version,
    /// The version before the release.
    pub previous: Version,
    /// The git tag.
    pub tag: String,
    /// Per-step results, in order.
    pub steps: Vec<(Step, StepStatus)>,
    /// URL of the GitHub release, when one was created.
    pub release_url: Option<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

// ──────────────────────────────────────────────
// Plan
// ──────────────────────────────────────────────

/// A planned release, ready to execute.
#[derive(Debug)]
pub struct ReleasePlan {
    root: Utf8PathBuf,
    manifest: Manifest,
    request: ReleaseRequest,
    runner: CommandRunner,
    /// The version before the bump.
    pub previous: Version,
    /// The resolved next version.
    pub next: Version,
    /// The tag that will be created (`"v" + next`).
    pub tag: String,
    /// Release token, read from `GITHUB_TOKEN` at plan time. `None`
    /// disables the GitHub release step.
    pub github_token: Option<String>,
    /// GitHub API base URL, from `GITHUB_API_URL` or the public default.
    pub api_base: String,
    changelog_tool: Option<String>,
    mirror: Option<MirrorConfig>,
}

/// Plan a release: load the manifest, run the preflight checks, and
/// resolve the next version. Nothing is mutated.
///
/// Checks, in order: manifest loads; the request names a bump or a
/// preid; a declared changelog generator is actually installed (fail
/// fast, before any git traffic); the working tree is clean; the branch
/// is not behind its upstream.
#[instrument(skip(request), fields(%root, dry_run = request.dry_run))]
pub fn plan_release(root: &Utf8Path, request: ReleaseRequest) -> ReleaseResult<ReleasePlan> {
    let manifest = Manifest::load(root)?;

    if request.bump.is_none() && request.preid.is_none() {
        return Err(ReleaseError::InvalidRequest);
    }

    let changelog_tool = changelog::declared_tool(&manifest);
    if let Some(tool) = &changelog_tool
        && !changelog::is_available(tool)
    {
        return Err(ReleaseError::MissingChangelogTool { tool: tool.clone() });
    }

    let runner = CommandRunner::new(request.dry_run, request.verbose);

    if !git::is_clean(&runner, root)? {
        return Err(ReleaseError::DirtyWorkingTree);
    }

    let behind = git::behind_upstream(&runner, root)?;
    if behind > 0 {
        return Err(ReleaseError::StaleBranch { behind });
    }

    let previous = manifest.version()?;
    let next = version::resolve(&previous, request.bump.as_ref(), request.preid.as_deref())?;
    let tag = format!("v{next}");
    let mirror = manifest.mirror_config();
    let github_token = std::env::var(github::TOKEN_ENV).ok();
    let api_base = std::env::var(github::API_BASE_ENV)
        .unwrap_or_else(|_| github::DEFAULT_API_BASE.to_owned());

    debug!(%previous, %next, %tag, "release planned");

    Ok(ReleasePlan {
        root: root.to_owned(),
        manifest,
        request,
        runner,
        previous,
        next,
        tag,
        github_token,
        api_base,
        changelog_tool,
        mirror,
    })
}

// ──────────────────────────────────────────────
// Execute
// ──────────────────────────────────────────────

impl ReleasePlan {
    /// Execute the pipeline, emitting an event at every step boundary.
    #[instrument(skip(self, on_event), fields(version = %self.next, dry_run = self.request.dry_run))]
    pub fn execute(mut self, mut on_event: impl FnMut(ReleaseEvent)) -> ReleaseResult<ReleaseOutcome> {
        let mut steps: Vec<(Step, StepStatus)> = Vec::new();
        let runner = self.runner;
        let root = self.root.clone();
        let tag = self.tag.clone();
        let is_dry = self.request.dry_run;
        let notes = self.request.notes.clone();

        // ── Preflight (validated in the plan phase) ──
        on_event(ReleaseEvent::StepStarted(Step::Preflight));
        let status = StepStatus::Success {
            message: "working tree clean, branch up to date".into(),
        };
        on_event(ReleaseEvent::StepCompleted(Step::Preflight, status.clone()));
        steps.push((Step::Preflight, status));

        // ── Test: unconditional, even in a dry run ──
        on_event(ReleaseEvent::StepStarted(Step::Test));
        let status = if self.manifest.has_script("test") {
            runner.required(&root, "npm", &["test"])?;
            StepStatus::Success {
                message: "npm test passed".into(),
            }
        } else {
            StepStatus::Skipped {
                reason: "no test script in package.json".into(),
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Test, status.clone()));
        steps.push((Step::Test, status));

        // ── Bump: the write is unconditional (the build consumes it);
        //    only the staging is guarded ──
        on_event(ReleaseEvent::StepStarted(Step::Bump));
        self.manifest.set_version(&self.next);
        self.manifest.save()?;
        git::stage(&runner, &root, MANIFEST_FILE)?;
        let message = format!("package.json {} → {}", self.previous, self.next);
        let status = if is_dry {
            // The file edit happened; the staging did not.
            StepStatus::DryRun { message }
        } else {
            StepStatus::Success { message }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Bump, status.clone()));
        steps.push((Step::Bump, status));

        // ── Build: unconditional; failure rolls back the bump ──
        on_event(ReleaseEvent::StepStarted(Step::Build));
        let status = if self.manifest.has_script("build") {
            match runner.required(&root, "npm", &["run", "build"]) {
                Ok(_) => StepStatus::Success {
                    message: "npm run build succeeded".into(),
                },
                Err(e) => {
                    self.manifest.restore()?;
                    if !is_dry {
                        // Best effort — the restore above already undid the edit.
                        let _ = git::unstage(&runner, &root, MANIFEST_FILE);
                    }
                    return Err(ReleaseError::BuildFailed {
                        message: e.to_string(),
                    });
                }
            }
        } else {
            StepStatus::Skipped {
                reason: "no build script — nothing to build".into(),
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Build, status.clone()));
        steps.push((Step::Build, status));

        // ── Changelog: the rendered section doubles as the tag annotation ──
        on_event(ReleaseEvent::StepStarted(Step::Changelog));
        let (status, tag_message) = match &self.changelog_tool {
            Some(tool) => {
                let section =
                    changelog::generate_section(&runner, &root, tool, &tag, notes.as_deref())?;
                let path = root.join(changelog::CHANGELOG_FILE);
                changelog::prepend(&path, &section).map_err(ReleaseError::Changelog)?;
                git::stage(&runner, &root, changelog::CHANGELOG_FILE)?;
                let message = format!("updated {}", changelog::CHANGELOG_FILE);
                let status = if is_dry {
                    StepStatus::DryRun { message }
                } else {
                    StepStatus::Success { message }
                };
                (status, section)
            }
            None => {
                let message = notes
                    .as_deref()
                    .map_or_else(|| tag.clone(), |n| format!("{tag}\n\n{n}"));
                (
                    StepStatus::Skipped {
                        reason: "no changelog generator declared".into(),
                    },
                    message,
                )
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Changelog, status.clone()));
        steps.push((Step::Changelog, status));

        // ── Commit and tag ──
        on_event(ReleaseEvent::StepStarted(Step::Commit));
        git::commit(&runner, &root, &format!("Release {tag}"))?;
        git::tag(&runner, &root, &tag, &tag_message)?;
        let status = if is_dry {
            StepStatus::DryRun {
                message: format!("would commit and tag {tag}"),
            }
        } else {
            StepStatus::Success {
                message: format!("committed and tagged {tag}"),
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Commit, status.clone()));
        steps.push((Step::Commit, status));

        // ── Push: two independent pushes; attempt both before failing ──
        on_event(ReleaseEvent::StepStarted(Step::Push));
        let branches = git::push(&runner, &root);
        let tags = git::push_tags(&runner, &root);
        branches?;
        tags?;
        let status = if is_dry {
            StepStatus::DryRun {
                message: "would push commits and tags".into(),
            }
        } else {
            StepStatus::Success {
                message: "pushed commits and tags".into(),
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Push, status.clone()));
        steps.push((Step::Push, status));

        // ── GitHub release: the one tolerated failure ──
        on_event(ReleaseEvent::StepStarted(Step::GithubRelease));
        let mut release_url = None;
        let status = match &self.github_token {
            None => StepStatus::Skipped {
                reason: format!("{} not set", github::TOKEN_ENV),
            },
            Some(token) => {
                let repo_url = self
                    .manifest
                    .repository_url()
                    .ok_or(ManifestError::MissingField("repository"))?
                    .to_owned();
                let repo = remote::parse(&repo_url)?;

                if is_dry {
                    StepStatus::DryRun {
                        message: format!("would create GitHub release {} {tag}", repo.name),
                    }
                } else {
                    let body = match &self.changelog_tool {
                        Some(_) => tag_message.clone(),
                        None => notes.clone().unwrap_or_default(),
                    };
                    let payload = ReleasePayload {
                        tag_name: tag.clone(),
                        name: format!("{} {tag}", repo.name),
                        body,
                        draft: false,
                        prerelease: self.request.preid.is_some(),
                    };
                    match github::create_release(&self.api_base, &repo.owner, &repo.name, token, &payload)
                    {
                        Ok(url) => {
                            release_url = Some(url.clone());
                            StepStatus::Success {
                                message: format!("created release {url}"),
                            }
                        }
                        Err(e) => {
                            // The tag is already pushed; carry on.
                            warn!(error = %e, "github release failed; continuing");
                            StepStatus::Skipped {
                                reason: format!("github release failed: {e}"),
                            }
                        }
                    }
                }
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::GithubRelease, status.clone()));
        steps.push((Step::GithubRelease, status));

        // ── Registry publish ──
        on_event(ReleaseEvent::StepStarted(Step::Publish));
        let status = if self.manifest.is_private() {
            StepStatus::Skipped {
                reason: "private package — publish disabled".into(),
            }
        } else {
            runner.guarded(&root, "npm", &["publish"])?;
            if is_dry {
                StepStatus::DryRun {
                    message: "would run npm publish".into(),
                }
            } else {
                StepStatus::Success {
                    message: "published to the npm registry".into(),
                }
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Publish, status.clone()));
        steps.push((Step::Publish, status));

        // ── Secondary mirror ──
        on_event(ReleaseEvent::StepStarted(Step::Mirror));
        let status = if self.manifest.is_private() {
            StepStatus::Skipped {
                reason: "private package — mirror disabled".into(),
            }
        } else {
            match &self.mirror {
                None => StepStatus::Skipped {
                    reason: "no secondary repo configured".into(),
                },
                Some(cfg) => {
                    mirror::run(&runner, &root, cfg, &tag, &tag_message)?;
                    if is_dry {
                        StepStatus::DryRun {
                            message: format!("prepared mirror in {} (nothing pushed)", cfg.work_dir),
                        }
                    } else {
                        StepStatus::Success {
                            message: format!("mirrored {} to {}", cfg.build_dir, cfg.repo_url),
                        }
                    }
                }
            }
        };
        on_event(ReleaseEvent::StepCompleted(Step::Mirror, status.clone()));
        steps.push((Step::Mirror, status));

        let outcome = ReleaseOutcome {
            version: self.next.clone(),
            previous: self.previous.clone(),
            tag,
            steps,
            release_url,
            dry_run: is_dry,
        };

        info!(tag = %outcome.tag, dry_run = outcome.dry_run, "release complete");
        Ok(outcome)
    }
}
