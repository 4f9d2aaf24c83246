//! anime-select CLI - Pick the best-matching anime search result using Claude.
//!
//! Prints one JSON object on stdout; exits non-zero iff it carries `error`.

use anime_select::models::EXAMPLE_CONFIG;
use anime_select::{ReferenceRecord, SelectionResult, SelectorError, preflight, select_anime};
use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "anime-select")]
#[command(version)]
#[command(about = "Select the best matching anime from search results using Claude")]
struct Cli {
    /// Anime title from MAL
    #[arg(long, required_unless_present = "example_config")]
    mal_title: Option<String>,

    /// Number of episodes from MAL
    #[arg(long)]
    episodes: Option<u32>,

    /// Year from MAL
    #[arg(long)]
    year: Option<u32>,

    /// Anime type from MAL (TV, Movie, etc)
    #[arg(long)]
    anime_type: Option<String>,

    /// JSON array of candidate titles
    #[arg(long, required_unless_present = "example_config")]
    candidates: Option<String>,

    /// Anthropic API key (optional, uses env var if not provided)
    #[arg(long)]
    api_key: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output (on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Show example configuration and exit
    #[arg(long)]
    example_config: bool,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

/// Result record for a command line clap rejected.
///
/// `None` for help and version requests, which clap prints itself.
fn argument_error(e: &clap::Error) -> Option<SelectionResult> {
    match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => {
            // First paragraph of clap's rendering, folded onto one line
            let rendered = e.to_string();
            let message = rendered
                .lines()
                .take_while(|line| !line.trim().is_empty())
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ");
            let message = message.strip_prefix("error: ").unwrap_or(&message);
            Some(SelectorError::InvalidInput(format!("Invalid arguments: {message}")).into_result())
        }
    }
}

/// Run one selection. Every failure becomes a result record.
async fn run(cli: Cli) -> SelectionResult {
    let (candidates, config) = match preflight(
        cli.candidates.as_deref().unwrap_or_default(),
        cli.config.as_deref(),
    ) {
        Ok(ready) => ready,
        Err(e) => return e.into_result(),
    };

    let reference = ReferenceRecord {
        title: cli.mal_title.unwrap_or_default(),
        episodes: cli.episodes,
        year: cli.year,
        anime_type: cli.anime_type,
    };
    debug!(
        title = %reference.title,
        candidates = candidates.len(),
        model = %config.anthropic.model,
        "Selecting"
    );

    select_anime(&reference, &candidates, cli.api_key.as_deref(), &config).await
}

/// Print the result line and derive the exit status from it.
fn emit(result: &SelectionResult) -> Result<ExitCode> {
    let line = serde_json::to_string(result).context("Failed to serialize selection result")?;
    println!("{line}");
    Ok(ExitCode::from(result.exit_code()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match argument_error(&e) {
            Some(result) => {
                let _ = e.print();
                return emit(&result);
            }
            None => e.exit(),
        },
    };
    setup_logging(cli.verbose)?;

    if cli.example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(ExitCode::SUCCESS);
    }

    let result = run(cli).await;
    emit(&result)
}
