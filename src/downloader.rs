//! Download orchestration: cache lookup composed with network fetch
//!
//! The `Downloader` resolves a (word, accent) pair to a local audio file,
//! consulting the cache index first and falling back to the fetcher on a
//! miss. Words and accents are processed one at a time; there is no
//! parallelism across requests.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::accent::Accent;
use crate::cache::{CacheError, CacheIndex};
use crate::fetch::{FetchError, Fetcher, HttpFetcher};

/// Per-invocation download settings.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory audio files and cache metadata are stored under
    pub output_dir: PathBuf,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Whether to consult and record the cache index
    pub use_cache: bool,
    /// Whether to fetch even when a cached file exists
    pub force_download: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("pronunciations"),
            timeout_secs: 10,
            use_cache: true,
            force_download: false,
        }
    }
}

/// Errors that can occur while resolving a pronunciation.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The network fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cache could not be read or written
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Resolves words to locally stored pronunciation files.
///
/// Generic over the [`Fetcher`] so tests can script the network side.
pub struct Downloader<F: Fetcher = HttpFetcher> {
    config: DownloadConfig,
    index: CacheIndex,
    fetcher: F,
}

impl Downloader<HttpFetcher> {
    /// Creates a downloader backed by the real HTTP fetcher.
    pub fn new(config: DownloadConfig) -> Result<Self, DownloadError> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> Downloader<F> {
    /// Creates a downloader with a custom fetcher implementation.
    pub fn with_fetcher(config: DownloadConfig, fetcher: F) -> Self {
        let index = CacheIndex::new(&config.output_dir);
        Self {
            config,
            index,
            fetcher,
        }
    }

    /// Returns the cache index this downloader stores into.
    pub fn cache(&self) -> &CacheIndex {
        &self.index
    }

    /// Resolves (word, accent) to a local audio file path.
    ///
    /// Returns the cached path without network access when caching is
    /// enabled, a fresh entry exists, and no forced download was requested.
    /// Otherwise performs a single fetch; the result is persisted through
    /// the cache index when caching is enabled, or written as a bare audio
    /// file when it is not.
    pub async fn resolve(&self, word: &str, accent: Accent) -> Result<PathBuf, DownloadError> {
        if self.config.use_cache && !self.config.force_download {
            if let Some(entry) = self.index.lookup(word, accent)? {
                info!(word, %accent, path = %entry.file_path.display(), "using cached pronunciation");
                return Ok(entry.file_path);
            }
            debug!(word, %accent, "cache miss");
        }

        let audio = self.fetcher.fetch(word, accent).await?;
        let source_url = self.fetcher.source_url(word, accent);

        let path = if self.config.use_cache {
            self.index.store(word, accent, &source_url, &audio)?.file_path
        } else {
            self.index.write_audio(word, accent, &audio)?
        };

        info!(word, %accent, path = %path.display(), bytes = audio.len(), "downloaded pronunciation");
        Ok(path)
    }

    /// Resolves a word for every supported accent, independently.
    ///
    /// Failures are logged and skipped; the returned paths are the accents
    /// that succeeded. An empty result is not an error at this level, the
    /// caller decides whether zero successes constitutes failure.
    pub async fn resolve_all_accents(&self, word: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for &accent in Accent::all() {
            match self.resolve(word, accent).await {
                Ok(path) => paths.push(path),
                Err(e) => {
                    warn!(word, %accent, error = %e, "failed to resolve pronunciation");
                }
            }
        }
        paths
    }
}
