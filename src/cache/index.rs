//! Cache index for persisting pronunciation audio and fetch metadata
//!
//! Provides a `CacheIndex` that stores one MP3 per (word, accent) under a
//! per-word directory, plus a sidecar `cache_index.json` describing every
//! cached file. All writes go through a temp file and an atomic rename so
//! that a metadata record never references a half-written audio file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::accent::Accent;

/// File name of the JSON metadata record kept next to the audio files.
const INDEX_FILE: &str = "cache_index.json";

/// Metadata recorded for a single cached pronunciation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The word this pronunciation is for
    pub word: String,
    /// Accent variant of the recording
    pub accent: Accent,
    /// Path of the stored audio file
    pub file_path: PathBuf,
    /// When the audio was fetched
    pub fetched_at: DateTime<Utc>,
    /// URL the audio was fetched from
    pub source_url: String,
}

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata record exists but cannot be parsed
    #[error("corrupt cache metadata in {path}: {source}")]
    CorruptMetadata {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// On-disk index shape: word -> accent -> entry.
type IndexMap = BTreeMap<String, BTreeMap<Accent, CacheEntry>>;

/// Manages the cache directory: audio files plus the JSON metadata record.
///
/// Layout under the root directory:
/// - `<root>/<word>/<accent>.mp3` — one audio file per (word, accent)
/// - `<root>/cache_index.json` — metadata for every cached file
#[derive(Debug, Clone)]
pub struct CacheIndex {
    /// Directory where audio files and the index are stored
    root: PathBuf,
}

impl CacheIndex {
    /// Creates a cache index rooted at the given directory.
    ///
    /// The directory is created lazily on the first store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the path where audio for (word, accent) is stored.
    pub fn audio_path(&self, word: &str, accent: Accent) -> PathBuf {
        self.root.join(word).join(accent.file_name())
    }

    /// Returns the path of the JSON metadata record.
    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Looks up the cache entry for (word, accent).
    ///
    /// Returns `None` on a miss, or when the recorded file no longer exists
    /// or is empty — a stale record is treated as a miss rather than served.
    ///
    /// # Errors
    /// Returns `CacheError::CorruptMetadata` if the index file exists but
    /// cannot be parsed.
    pub fn lookup(&self, word: &str, accent: Accent) -> Result<Option<CacheEntry>, CacheError> {
        let index = self.load_index()?;
        let entry = match index.get(word).and_then(|accents| accents.get(&accent)) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };

        if file_has_content(&entry.file_path) {
            Ok(Some(entry))
        } else {
            tracing::debug!(word, %accent, "cache entry has no backing file, treating as miss");
            Ok(None)
        }
    }

    /// Writes audio bytes for (word, accent) without touching the metadata
    /// record. Used when caching is disabled but the file is still wanted.
    ///
    /// The bytes go to a temp file first and are renamed into place.
    pub fn write_audio(
        &self,
        word: &str,
        accent: Accent,
        audio: &[u8],
    ) -> Result<PathBuf, CacheError> {
        let path = self.audio_path(word, accent);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let tmp = path.with_extension("mp3.tmp");
        fs::write(&tmp, audio)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Stores audio bytes and records a cache entry for (word, accent).
    ///
    /// The audio file is durably written before the index is updated, and
    /// the index itself is replaced atomically, so a crash at any point
    /// leaves either the previous state or the complete new one.
    ///
    /// # Errors
    /// Returns `CacheError::Io` on filesystem failure, or
    /// `CacheError::CorruptMetadata` if an existing index cannot be parsed.
    pub fn store(
        &self,
        word: &str,
        accent: Accent,
        source_url: &str,
        audio: &[u8],
    ) -> Result<CacheEntry, CacheError> {
        // Refuse to parse-error later: the index must be readable before we
        // merge a new entry into it.
        let mut index = self.load_index()?;

        let file_path = self.write_audio(word, accent, audio)?;

        let entry = CacheEntry {
            word: word.to_string(),
            accent,
            file_path,
            fetched_at: Utc::now(),
            source_url: source_url.to_string(),
        };

        index
            .entry(word.to_string())
            .or_default()
            .insert(accent, entry.clone());
        self.save_index(&index)?;

        Ok(entry)
    }

    /// Removes cached files and metadata, for one word or for everything.
    ///
    /// Returns the number of cache entries removed. Audio files and the
    /// per-word directories are deleted along with their index records;
    /// clearing everything also removes word directories that have no index
    /// record, such as files written with caching disabled.
    pub fn clear(&self, word: Option<&str>) -> Result<usize, CacheError> {
        let mut index = self.load_index()?;

        match word {
            Some(word) => {
                let removed = index.remove(word).map(|accents| accents.len()).unwrap_or(0);
                remove_dir_if_present(&self.root.join(word))?;
                self.save_index(&index)?;
                Ok(removed)
            }
            None => {
                let removed = index.values().map(|accents| accents.len()).sum();
                // Sweep every word directory, not just indexed ones, so
                // files written with caching disabled are cleared too.
                match fs::read_dir(&self.root) {
                    Ok(entries) => {
                        for dir_entry in entries {
                            let path = dir_entry?.path();
                            if path.is_dir() {
                                remove_dir_if_present(&path)?;
                            }
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                remove_file_if_present(&self.index_path())?;
                Ok(removed)
            }
        }
    }

    /// Lists cache entries, for one word or for everything.
    ///
    /// Returns a map from word to that word's entries, sorted by word and
    /// accent. Reports what the metadata record says without validating the
    /// backing files; `lookup` is the validating read.
    pub fn list_all(
        &self,
        word: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<CacheEntry>>, CacheError> {
        let index = self.load_index()?;
        let listing = index
            .into_iter()
            .filter(|(w, _)| word.map_or(true, |want| want == w))
            .map(|(w, accents)| (w, accents.into_values().collect()))
            .collect();
        Ok(listing)
    }

    /// Reads the index file, returning an empty index when it doesn't exist.
    fn load_index(&self) -> Result<IndexMap, CacheError> {
        let path = self.index_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IndexMap::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|source| CacheError::CorruptMetadata { path, source })
    }

    /// Replaces the index file atomically via a temp file and rename.
    fn save_index(&self, index: &IndexMap) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;

        let json = serde_json::to_string_pretty(index)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Returns true when the path exists as a non-empty regular file.
fn file_has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_index() -> (CacheIndex, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let index = CacheIndex::new(temp_dir.path());
        (index, temp_dir)
    }

    #[test]
    fn test_store_then_lookup_roundtrip() {
        let (index, _temp_dir) = create_test_index();

        let stored = index
            .store("hello", Accent::Us, "https://example.com/hello", b"AUDIO")
            .expect("Store should succeed");

        let found = index
            .lookup("hello", Accent::Us)
            .expect("Lookup should succeed")
            .expect("Entry should exist");

        assert_eq!(found, stored);
        assert!(found.file_path.exists(), "Audio file should exist");
        let len = fs::metadata(&found.file_path).unwrap().len();
        assert!(len > 0, "Audio file should be non-empty");
    }

    #[test]
    fn test_store_places_audio_under_word_directory() {
        let (index, temp_dir) = create_test_index();

        index
            .store("hello", Accent::Us, "https://example.com/hello", b"AUDIO")
            .expect("Store should succeed");

        let expected = temp_dir.path().join("hello").join("us.mp3");
        assert!(expected.exists(), "Audio should land at <root>/hello/us.mp3");
        assert_eq!(fs::read(&expected).unwrap(), b"AUDIO");
    }

    #[test]
    fn test_lookup_returns_none_for_missing_word() {
        let (index, _temp_dir) = create_test_index();

        let result = index.lookup("nonexistent", Accent::Gb).expect("Lookup should succeed");

        assert!(result.is_none(), "Should return None for missing word");
    }

    #[test]
    fn test_lookup_is_keyed_by_accent() {
        let (index, _temp_dir) = create_test_index();

        index
            .store("hello", Accent::Us, "https://example.com/hello", b"AUDIO")
            .expect("Store should succeed");

        let other = index.lookup("hello", Accent::Gb).expect("Lookup should succeed");
        assert!(other.is_none(), "GB entry should not exist after storing US only");
    }

    #[test]
    fn test_lookup_treats_deleted_file_as_miss() {
        let (index, _temp_dir) = create_test_index();

        let entry = index
            .store("hello", Accent::Us, "https://example.com/hello", b"AUDIO")
            .expect("Store should succeed");
        fs::remove_file(&entry.file_path).expect("Should delete audio file");

        let result = index.lookup("hello", Accent::Us).expect("Lookup should succeed");
        assert!(result.is_none(), "Entry without a backing file should be a miss");
    }

    #[test]
    fn test_lookup_treats_empty_file_as_miss() {
        let (index, _temp_dir) = create_test_index();

        let entry = index
            .store("hello", Accent::Us, "https://example.com/hello", b"AUDIO")
            .expect("Store should succeed");
        fs::write(&entry.file_path, b"").expect("Should truncate audio file");

        let result = index.lookup("hello", Accent::Us).expect("Lookup should succeed");
        assert!(result.is_none(), "Entry with an empty file should be a miss");
    }

    #[test]
    fn test_store_leaves_no_temp_files() {
        let (index, temp_dir) = create_test_index();

        index
            .store("hello", Accent::Us, "https://example.com/hello", b"AUDIO")
            .expect("Store should succeed");

        let mut stack = vec![temp_dir.path().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let name = path.file_name().unwrap().to_string_lossy().into_owned();
                    assert!(!name.ends_with(".tmp"), "Temp file left behind: {}", name);
                }
            }
        }
    }

    #[test]
    fn test_clear_word_removes_entries_and_files() {
        let (index, temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url", b"AUDIO").unwrap();
        index.store("hello", Accent::Gb, "url", b"AUDIO").unwrap();
        index.store("world", Accent::Us, "url", b"AUDIO").unwrap();

        let removed = index.clear(Some("hello")).expect("Clear should succeed");

        assert_eq!(removed, 2, "Both hello entries should be removed");
        assert!(!temp_dir.path().join("hello").exists(), "Word directory should be gone");
        assert!(index.lookup("hello", Accent::Us).unwrap().is_none());
        assert!(index.lookup("world", Accent::Us).unwrap().is_some(), "Other words untouched");
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let (index, temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url", b"AUDIO").unwrap();
        index.store("world", Accent::Gb, "url", b"AUDIO").unwrap();

        let removed = index.clear(None).expect("Clear should succeed");

        assert_eq!(removed, 2);
        assert!(!temp_dir.path().join("hello").exists());
        assert!(!temp_dir.path().join("world").exists());
        assert!(!temp_dir.path().join(INDEX_FILE).exists(), "Index file should be gone");
        assert!(index.list_all(None).unwrap().is_empty());
    }

    #[test]
    fn test_clear_all_sweeps_unindexed_directories() {
        let (index, temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url", b"AUDIO").unwrap();
        // A word directory written with caching disabled has no index record.
        index.write_audio("world", Accent::Gb, b"AUDIO").unwrap();

        let removed = index.clear(None).expect("Clear should succeed");

        assert_eq!(removed, 1, "Only indexed entries are counted");
        assert!(!temp_dir.path().join("hello").exists());
        assert!(
            !temp_dir.path().join("world").exists(),
            "Unindexed word directories should be cleared too"
        );
    }

    #[test]
    fn test_clear_unknown_word_removes_nothing() {
        let (index, _temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url", b"AUDIO").unwrap();

        let removed = index.clear(Some("nonexistent")).expect("Clear should succeed");
        assert_eq!(removed, 0);
        assert!(index.lookup("hello", Accent::Us).unwrap().is_some());
    }

    #[test]
    fn test_list_all_groups_entries_by_word() {
        let (index, _temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url", b"AUDIO").unwrap();
        index.store("hello", Accent::Gb, "url", b"AUDIO").unwrap();
        index.store("world", Accent::Us, "url", b"AUDIO").unwrap();

        let listing = index.list_all(None).expect("List should succeed");

        assert_eq!(listing.len(), 2);
        assert_eq!(listing["hello"].len(), 2);
        assert_eq!(listing["world"].len(), 1);
    }

    #[test]
    fn test_list_all_filters_by_word() {
        let (index, _temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url", b"AUDIO").unwrap();
        index.store("world", Accent::Us, "url", b"AUDIO").unwrap();

        let listing = index.list_all(Some("hello")).expect("List should succeed");

        assert_eq!(listing.len(), 1);
        assert!(listing.contains_key("hello"));
    }

    #[test]
    fn test_list_all_on_empty_cache_is_empty() {
        let (index, _temp_dir) = create_test_index();

        let listing = index.list_all(None).expect("List should succeed");
        assert!(listing.is_empty());
    }

    #[test]
    fn test_corrupt_index_surfaces_corrupt_metadata() {
        let (index, temp_dir) = create_test_index();

        fs::write(temp_dir.path().join(INDEX_FILE), b"not json").unwrap();

        let result = index.lookup("hello", Accent::Us);
        assert!(matches!(result, Err(CacheError::CorruptMetadata { .. })));
    }

    #[test]
    fn test_store_overwrites_existing_entry() {
        let (index, _temp_dir) = create_test_index();

        index.store("hello", Accent::Us, "url-one", b"FIRST").unwrap();
        index.store("hello", Accent::Us, "url-two", b"SECOND").unwrap();

        let entry = index.lookup("hello", Accent::Us).unwrap().unwrap();
        assert_eq!(entry.source_url, "url-two");
        assert_eq!(fs::read(&entry.file_path).unwrap(), b"SECOND");
    }

    #[test]
    fn test_write_audio_does_not_touch_index() {
        let (index, temp_dir) = create_test_index();

        let path = index
            .write_audio("hello", Accent::Us, b"AUDIO")
            .expect("Write should succeed");

        assert!(path.exists());
        assert!(!temp_dir.path().join(INDEX_FILE).exists(), "No index should be written");
        assert!(index.lookup("hello", Accent::Us).unwrap().is_none());
    }
}
