//! Pronunciation downloader library
//!
//! This module exposes the accent, cache, CLI, downloader, and fetch
//! modules for use in integration tests.

pub mod accent;
pub mod cache;
pub mod cli;
pub mod downloader;
pub mod fetch;
