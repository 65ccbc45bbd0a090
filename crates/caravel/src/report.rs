//! Terminal rendering of pipeline progress and the final summary.

use owo_colors::OwoColorize;

use caravel_core::{ReleaseEvent, ReleaseOutcome, Step, StepStatus};

/// Render a pipeline event as a progress line.
pub fn render_event(event: &ReleaseEvent) {
    match event {
        // Steps are synchronous; the completion line carries the news.
        ReleaseEvent::StepStarted(_) => {}
        ReleaseEvent::StepCompleted(step, status) => render_step(*step, status),
    }
}

fn render_step(step: Step, status: &StepStatus) {
    match status {
        StepStatus::Success { message } => {
            println!(
                "  {} {} {}",
                "✓".green(),
                step.to_string().bold(),
                message.dimmed(),
            );
        }
        StepStatus::Skipped { reason } => {
            println!(
                "  {} {} {}",
                "–".yellow(),
                step.to_string().bold(),
                format!("skipped: {reason}").dimmed(),
            );
        }
        StepStatus::DryRun { message } => {
            println!(
                "  {} {} {}",
                "○".magenta(),
                step.to_string().bold(),
                message.dimmed(),
            );
        }
    }
}

/// Render the final summary.
pub fn render_summary(outcome: &ReleaseOutcome) {
    println!();
    if outcome.dry_run {
        println!(
            "{} Dry run complete — {} would be released ({} steps previewed)",
            "✓".green(),
            outcome.tag.bold(),
            outcome.steps.len(),
        );
    } else {
        println!(
            "{} {} ({} → {})",
            "✓".green().bold(),
            format!("Released {}", outcome.tag).green().bold(),
            outcome.previous.to_string().dimmed(),
            outcome.version,
        );
        if let Some(url) = &outcome.release_url {
            println!("  {}", url.cyan());
        }
    }
}
