//! Terminal output for mission runs.

use colored::Colorize;

use mission_flow::{
    AttemptStage, MissionId, MissionObserver, MissionResult, MissionState, MissionStatus,
    PersistenceReport, RunStats, SourceAttempt,
};

/// Prints one line per finished candidate while the mission runs.
pub struct ProgressPrinter;

impl MissionObserver for ProgressPrinter {
    fn on_transition(&self, _mission_id: &MissionId, _from: MissionState, to: MissionState) {
        if !to.is_terminal() {
            eprintln!(
                "{} {} {}",
                "→".bright_blue(),
                to.to_string().dimmed(),
                format!("{:>3.0}%", to.progress()).dimmed()
            );
        }
    }

    fn on_attempt_finished(&self, _mission_id: &MissionId, attempt: &SourceAttempt) {
        match attempt.stage {
            AttemptStage::Succeeded => eprintln!(
                "  {} {} {}",
                "✓".green(),
                attempt.url,
                format!("(score {:.2})", attempt.score.unwrap_or_default()).dimmed()
            ),
            _ => {
                let reason = attempt
                    .failure_kind()
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                eprintln!("  {} {} {}", "✗".red(), attempt.url, format!("({reason})").dimmed());
            }
        }
    }
}

fn status_label(status: MissionStatus) -> colored::ColoredString {
    match status {
        MissionStatus::Complete => status.to_string().bright_green().bold(),
        MissionStatus::Partial => status.to_string().bright_yellow().bold(),
        MissionStatus::Failed => status.to_string().bright_red().bold(),
    }
}

/// Print a finished mission: status, sources, summary.
pub fn print_result(result: &MissionResult) {
    println!();
    println!(
        "{} {}  {}",
        "Mission".bold(),
        result.mission_id.to_string().cyan(),
        status_label(result.status)
    );
    println!("{} {}", "Topic:".bold(), result.topic);
    println!(
        "{} {} ({} fetcher, {} style)",
        "Sources:".bold(),
        format!(
            "{} attempted, {} kept, {} excluded",
            result.total_attempted(),
            result.successful.len(),
            result.excluded.len()
        ),
        result.fetcher_capability,
        result.summary_style
    );

    if !result.successful.is_empty() {
        println!();
        println!("{}", "Kept".bright_green().bold());
        for attempt in &result.successful {
            println!("  {:.2}  {}", attempt.score.unwrap_or_default(), attempt.url);
        }
    }

    if !result.excluded.is_empty() {
        println!();
        println!("{}", "Excluded".bright_yellow().bold());
        for excluded in &result.excluded {
            println!("  {}  {}", excluded.attempt.url, excluded.reason.to_string().dimmed());
        }
    }

    println!();
    match (&result.summary, &result.summary_error) {
        (Some(summary), _) => println!("{summary}"),
        (None, Some(error)) => println!("{} {}", "No summary:".yellow(), error),
        (None, None) => println!("{}", "No summary: no source met the quality bar".yellow()),
    }
}

/// Warn about persistence problems; they never change the exit code.
pub fn print_persistence(report: &PersistenceReport) {
    if let Some(error) = &report.result_error {
        eprintln!("{} result not saved: {}", "warning:".yellow().bold(), error);
    }
    if let Some(error) = &report.log_error {
        eprintln!("{} run not logged: {}", "warning:".yellow().bold(), error);
    }
}

/// Print run log totals and per-domain source quality.
pub fn print_stats(stats: &RunStats) {
    if stats.total_runs == 0 {
        println!("{}", "No missions logged yet".yellow());
        return;
    }

    println!(
        "{} {}  ({} complete, {} partial, {} failed)",
        "Missions:".bold(),
        stats.total_runs,
        stats.complete.to_string().bright_green(),
        stats.partial.to_string().bright_yellow(),
        stats.failed.to_string().bright_red()
    );
    println!("{} {:.0}%", "Success rate:".bold(), stats.success_rate * 100.0);
    println!("{} {:.0} ms", "Mean run time:".bold(), stats.mean_total_ms);

    if !stats.domains.is_empty() {
        println!();
        println!("{}", "Domains".bold());
        for domain in &stats.domains {
            let score = domain
                .mean_score
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "  - ".to_string());
            println!(
                "  {}  {}  {}",
                score,
                domain.domain,
                format!("({} of {} kept)", domain.kept, domain.sources).dimmed()
            );
        }
    }
}
