//! Command-line interface parsing for the pronunciation downloader
//!
//! This module defines the clap surface: the `download`, `cache-info`, and
//! `clear-cache` subcommands plus the global flags controlling the output
//! directory, timeout, and cache behavior.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::accent::Accent;
use crate::downloader::DownloadConfig;

/// Download pronunciation MP3 files from Google's dictionary service
#[derive(Parser, Debug)]
#[command(name = "pronounce")]
#[command(about = "Download and cache word pronunciation MP3s")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory to save pronunciations
    #[arg(
        short = 'o',
        long,
        global = true,
        value_name = "DIR",
        default_value = "pronunciations"
    )]
    pub output_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(short = 't', long, global = true, value_name = "SECONDS", default_value_t = 10)]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable cache usage
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Force download even if cached
    #[arg(long, global = true)]
    pub force_download: bool,
}

/// Subcommands of the pronunciation downloader.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download pronunciations
    Download {
        /// One or more words to download pronunciations for
        #[arg(required = true)]
        words: Vec<String>,

        /// Accent to download
        #[arg(short, long, value_enum, default_value = "all")]
        accent: AccentArg,
    },

    /// Show cache information
    CacheInfo {
        /// Optional words to show cache info for. If none provided, shows all.
        words: Vec<String>,
    },

    /// Clear cached files
    ClearCache {
        /// Optional words to clear cache for. If none provided, clears all.
        words: Vec<String>,
    },
}

/// Accent selection accepted by the download subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccentArg {
    /// British English only
    Gb,
    /// American English only
    Us,
    /// Every supported accent
    All,
}

impl AccentArg {
    /// Returns the accents this selection expands to.
    pub fn accents(&self) -> &'static [Accent] {
        match self {
            AccentArg::Gb => &[Accent::Gb],
            AccentArg::Us => &[Accent::Us],
            AccentArg::All => Accent::all(),
        }
    }
}

impl Cli {
    /// Builds the download configuration from the parsed global flags.
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            output_dir: self.output_dir.clone(),
            timeout_secs: self.timeout,
            use_cache: !self.no_cache,
            force_download: self.force_download,
        }
    }
}
