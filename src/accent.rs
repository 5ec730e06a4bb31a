//! Accent variants supported by the pronunciation service.
//!
//! This module defines the two-value accent enum used throughout the
//! downloader, cache index, and CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pronunciation accent variants offered by the dictionary service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    /// British English
    Gb,
    /// American English
    Us,
}

impl Accent {
    /// Returns a slice containing all accent variants.
    pub fn all() -> &'static [Accent] {
        &[Accent::Gb, Accent::Us]
    }

    /// Returns the accent code used in service request URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Accent::Gb => "gb",
            Accent::Us => "us",
        }
    }

    /// Returns the file name under which this accent's audio is stored.
    pub fn file_name(&self) -> &'static str {
        match self {
            Accent::Gb => "gb.mp3",
            Accent::Us => "us.mp3",
        }
    }

}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
