//! Google dictionary pronunciation fetcher
//!
//! This module provides the `Fetcher` trait and its HTTP implementation,
//! which downloads pronunciation MP3s from Google's static dictionary sound
//! service. Each fetch is a single attempt bounded by the configured
//! timeout; there is no internal retry.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::accent::Accent;

/// Base URL for Google's static dictionary sound files
const DICTIONARY_SOUNDS_BASE_URL: &str = "https://ssl.gstatic.com/dictionary/static/sounds/20200429";

/// Errors that can occur when fetching a pronunciation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The service has no pronunciation for this word and accent
    #[error("no pronunciation found for '{word}' ({accent})")]
    NotFound { word: String, accent: Accent },

    /// The request failed at the transport level
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// The service answered with an unexpected status
    #[error("service returned HTTP {status}")]
    Service { status: StatusCode },
}

/// Source of pronunciation audio, keyed by word and accent.
///
/// The downloader is generic over this trait so tests can substitute a
/// scripted fetcher for the real HTTP client.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the pronunciation audio for (word, accent).
    async fn fetch(&self, word: &str, accent: Accent) -> Result<Bytes, FetchError>;

    /// Returns the URL audio for (word, accent) is fetched from, recorded
    /// in cache metadata alongside the stored file.
    fn source_url(&self, word: &str, accent: Accent) -> String;
}

/// Fetcher backed by Google's dictionary sound service over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests are bounded by the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Network)?;
        Ok(Self {
            client,
            base_url: DICTIONARY_SOUNDS_BASE_URL.to_string(),
        })
    }

    /// Creates a fetcher with a custom HTTP client and service URL.
    #[allow(dead_code)]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Returns the request URL for (word, accent).
    pub fn pronunciation_url(&self, word: &str, accent: Accent) -> String {
        format!(
            "{}/{}--_{}_1.mp3",
            self.base_url,
            word.to_lowercase(),
            accent.code()
        )
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, word: &str, accent: Accent) -> Result<Bytes, FetchError> {
        let url = self.pronunciation_url(word, accent);
        tracing::debug!(word, %accent, url, "requesting pronunciation");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                word: word.to_string(),
                accent,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Service { status });
        }

        let audio = response.bytes().await.map_err(map_transport_error)?;
        if audio.is_empty() {
            // The service occasionally answers 200 with an empty body for
            // words it has no recording of; treat that the same as a 404.
            return Err(FetchError::NotFound {
                word: word.to_string(),
                accent,
            });
        }

        tracing::debug!(word, %accent, bytes = audio.len(), "pronunciation received");
        Ok(audio)
    }

    fn source_url(&self, word: &str, accent: Accent) -> String {
        self.pronunciation_url(word, accent)
    }
}

/// Maps a reqwest transport failure onto the fetch error taxonomy.
fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e)
    }
}
