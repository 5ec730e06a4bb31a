//! Cache module for storing downloaded pronunciations on disk
//!
//! This module provides a cache index that persists audio files and their
//! fetch metadata to the filesystem. Audio files and the JSON index are both
//! written via temp-file-then-rename so a crash mid-store cannot leave a
//! dangling metadata record.

mod index;

pub use index::{CacheEntry, CacheError, CacheIndex};
