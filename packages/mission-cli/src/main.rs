//! Command-line front end for the mission flow controller.
//!
//! `mission run` executes one mission with the reference collaborators and
//! writes the result under the output directory. `mission show` prints a
//! previously written result. `mission stats` summarizes the run log.

mod config;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mission_flow::{
    ExtractiveSummarizer, FetchCapability, FetcherExt, HeuristicScorer, HtmlExtractor,
    HttpFetcher, JsonFileSink, JsonlRunLog, MissionController, MissionRequest, MissionStatus,
    RunStats, SourceFetcher, SummaryStyle, WebFetcher,
};

use crate::config::Config;
use crate::report::{print_persistence, print_result, print_stats, ProgressPrinter};

#[derive(Parser)]
#[command(name = "mission")]
#[command(about = "Run research missions: fetch, score and summarize sources on a topic")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one mission
    Run {
        /// Research topic
        #[arg(long)]
        topic: String,

        /// Candidate URL (repeat for more)
        #[arg(long = "url", required = true)]
        urls: Vec<String>,

        #[arg(long, default_value_t = 5)]
        max_sources: usize,

        /// Minimum quality score in [0, 1]
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,

        /// technical, executive or casual
        #[arg(long, default_value = "technical")]
        style: SummaryStyle,

        /// Also fold in same-site pages each source links to
        #[arg(long)]
        explore: bool,

        /// Overrides MISSION_OUTPUT_DIR
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the result as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Pretty-print a persisted mission result
    Show { file: PathBuf },

    /// Summarize every mission in the run log
    Stats {
        /// Overrides MISSION_OUTPUT_DIR
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the stats as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

/// Exit code for a mission that aborted instead of finishing.
const EXIT_ABORTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mission_flow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            topic,
            urls,
            max_sources,
            threshold,
            style,
            explore,
            output_dir,
            json,
        } => {
            let mut config = Config::from_env()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            let request = MissionRequest::new(topic)
                .with_urls(urls)
                .with_max_sources(max_sources)
                .with_quality_threshold(threshold)
                .with_style(style);
            let capability = if explore {
                FetchCapability::Exploratory
            } else {
                FetchCapability::Direct
            };

            run_mission(&config, request, capability, json).await
        }
        Commands::Show { file } => {
            let result = JsonFileSink::load(&file)
                .await
                .with_context(|| format!("Failed to read mission result from {}", file.display()))?;
            print_result(&result);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats { output_dir, json } => {
            let mut config = Config::from_env()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            let log = JsonlRunLog::new(config.run_log_path());
            let entries = log
                .entries()
                .await
                .with_context(|| format!("Failed to read run log {}", log.path().display()))?;
            let stats = RunStats::from_entries(&entries);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_fetcher(config: &Config, capability: FetchCapability) -> Arc<dyn SourceFetcher> {
    let mut http = HttpFetcher::new();
    if let Some(user_agent) = &config.user_agent {
        http = http.with_user_agent(user_agent.clone());
    }
    let web = WebFetcher::for_capability(capability, http);

    match config.requests_per_second {
        Some(rps) => Arc::new(web.rate_limited(rps)),
        None => Arc::new(web),
    }
}

async fn run_mission(
    config: &Config,
    request: MissionRequest,
    capability: FetchCapability,
    json: bool,
) -> Result<ExitCode> {
    let results = JsonFileSink::new(&config.output_dir);
    let controller = MissionController::new(
        build_fetcher(config, capability),
        HtmlExtractor::new(),
        HeuristicScorer::new(),
        ExtractiveSummarizer::new(),
        results.clone(),
        JsonlRunLog::new(config.run_log_path()),
    )
    .with_config(config.mission.clone())
    .with_observer(ProgressPrinter);

    // Ctrl-C cancels the mission instead of killing the process mid-write
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let run = controller.run_with_cancel(request, cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run.result)?);
    } else {
        print_result(&run.result);
    }
    print_persistence(&run.persistence);
    if run.persistence.result_error.is_none() {
        tracing::info!(
            path = %results.path_for(&run.result.mission_id).display(),
            "Result saved"
        );
    }

    Ok(match run.result.status {
        MissionStatus::Complete | MissionStatus::Partial => ExitCode::SUCCESS,
        MissionStatus::Failed => ExitCode::FAILURE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses_repeated_urls_and_style() {
        let cli = Cli::try_parse_from([
            "mission", "run", "--topic", "wildfire AI", "--url", "https://a.org/", "--url",
            "https://b.org/", "--style", "executive", "--explore",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { urls, style, explore, max_sources, .. } => {
                assert_eq!(urls.len(), 2);
                assert_eq!(style, SummaryStyle::Executive);
                assert!(explore);
                assert_eq!(max_sources, 5);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_stats_takes_output_dir_and_json() {
        let cli = Cli::try_parse_from(["mission", "stats", "--output-dir", "/tmp/m", "--json"]).unwrap();

        match cli.command {
            Commands::Stats { output_dir, json } => {
                assert_eq!(output_dir, Some(PathBuf::from("/tmp/m")));
                assert!(json);
            }
            _ => panic!("expected stats"),
        }
    }

    #[test]
    fn test_run_requires_a_url() {
        assert!(Cli::try_parse_from(["mission", "run", "--topic", "wildfire"]).is_err());
    }
}
