//! Pronounce - download and cache word pronunciation MP3s
//!
//! Command-line entry point: parses arguments, initializes logging, and
//! dispatches to the download, cache-info, or clear-cache handlers. Per-word
//! failures are logged and reflected in the exit code without aborting the
//! rest of the batch.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use pronounce::cache::CacheIndex;
use pronounce::cli::{AccentArg, Cli, Command};
use pronounce::downloader::Downloader;
use pronounce::fetch::Fetcher;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Configures the process-wide logger. Verbose mode lowers the filter to
/// debug; otherwise RUST_LOG is honored with an info default.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Dispatches the parsed subcommand.
async fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Download { words, accent } => {
            let downloader = Downloader::new(cli.download_config())?;
            if process_words(&downloader, words, *accent).await {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::CacheInfo { words } => {
            let index = CacheIndex::new(&cli.output_dir);
            show_cache_info(&index, words)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ClearCache { words } => {
            let index = CacheIndex::new(&cli.output_dir);
            clear_cache(&index, words)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Downloads pronunciations for each word in turn.
///
/// A word counts as successful when at least one accent produced a file.
/// Returns false if any word produced nothing.
async fn process_words<F: Fetcher>(
    downloader: &Downloader<F>,
    words: &[String],
    accent: AccentArg,
) -> bool {
    let mut success = true;

    for word in words {
        let mut paths = Vec::new();
        match accent {
            AccentArg::All => {
                paths = downloader.resolve_all_accents(word).await;
            }
            single => {
                for &accent in single.accents() {
                    match downloader.resolve(word, accent).await {
                        Ok(path) => paths.push(path),
                        Err(e) => error!("Error processing '{}': {}", word, e),
                    }
                }
            }
        }

        if paths.is_empty() {
            error!("No pronunciations downloaded for '{}'", word);
            success = false;
        }
    }

    success
}

/// Prints cache metadata as pretty JSON, for the given words or for all.
fn show_cache_info(index: &CacheIndex, words: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if words.is_empty() {
        let listing = index.list_all(None)?;
        if listing.is_empty() {
            println!("No cached files found");
        } else {
            println!("\nCache information:");
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        return Ok(());
    }

    for word in words {
        let listing = index.list_all(Some(word))?;
        match listing.get(word.as_str()) {
            Some(entries) => {
                println!("\nCache info for '{}':", word);
                println!("{}", serde_json::to_string_pretty(entries)?);
            }
            None => println!("No cache info found for '{}'", word),
        }
    }
    Ok(())
}

/// Deletes cached files and metadata, for the given words or for all.
fn clear_cache(index: &CacheIndex, words: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut removed = 0;
    if words.is_empty() {
        removed += index.clear(None)?;
    } else {
        for word in words {
            removed += index.clear(Some(word))?;
        }
    }

    info!("Removed {} cache entries", removed);
    println!("Removed {} cached pronunciation(s)", removed);
    Ok(())
}
