//! caravel CLI
#![deny(unsafe_code)]

use anyhow::Context;
use caravel::{Cli, report};
use caravel_core::{BumpKind, ReleaseRequest, plan_release};
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;

    let env_filter = observability::env_filter(cli.quiet, cli.verbose);
    observability::init_observability(env_filter)?;

    debug!(
        bump = ?cli.bump,
        preid = ?cli.preid,
        dry_run = cli.dry_run,
        json = cli.json,
        "CLI initialized"
    );

    // Explicit versions are validated when the release is planned.
    let bump = cli.bump.as_deref().map(BumpKind::parse);

    let request = ReleaseRequest {
        bump,
        preid: cli.preid,
        dry_run: cli.dry_run,
        verbose: cli.verbose > 0,
        notes: cli.notes,
    };

    let is_dry = request.dry_run;
    let json = cli.json;

    let result = run(&cwd, request, is_dry, json);
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}

fn run(
    cwd: &camino::Utf8Path,
    request: ReleaseRequest,
    is_dry: bool,
    json: bool,
) -> anyhow::Result<()> {
    let plan = plan_release(cwd, request).context("release planning failed")?;

    if !json {
        if is_dry {
            println!("\n{}", "DRY RUN — no changes will be made".magenta().bold());
        }
        println!(
            "\n{}: {} → {}",
            "Release".bold(),
            plan.previous.to_string().dimmed(),
            plan.next.to_string().green().bold(),
        );
        println!();
    }

    let outcome = plan
        .execute(|event| {
            if !json {
                report::render_event(&event);
            }
        })
        .context("release failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        report::render_summary(&outcome);
    }

    Ok(())
}
