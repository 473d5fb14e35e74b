//! The durable resolution cache.
//!
//! An append-only collection of [`ResolutionRecord`]s, loaded wholesale into
//! memory per invocation, mutated in memory, and flushed atomically. Exactly
//! one writer is assumed per invocation; durability comes from the
//! write-to-temp + fsync + rename sequence in [`ResolutionCache::persist`] —
//! a crash mid-persist leaves the previous cache file readable.
//!
//! On disk the cache is a single JSON document at
//! `<git_dir>/fuzzy-rerere/cache.json`:
//!
//! ```json
//! { "records": [ { "id": "…", "signature": { … }, "resolution": [ … ], "recorded_at": … } ] }
//! ```
//!
//! Line sequences are stored verbatim (exact whitespace, empty lines) —
//! matching compares lines by exact equality, so storage must be lossless.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RerereError;
use crate::model::ResolutionRecord;

/// Name of the cache file inside the fuzzy-rerere directory.
const CACHE_FILE: &str = "cache.json";

/// On-disk shape of the cache.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    records: Vec<ResolutionRecord>,
}

// ---------------------------------------------------------------------------
// ResolutionCache
// ---------------------------------------------------------------------------

/// In-memory view of the persisted cache. Records keep insertion order;
/// nothing is ever mutated or removed.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    records: Vec<ResolutionRecord>,
    ids: HashSet<String>,
}

impl ResolutionCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical cache file path under a git dir.
    #[must_use]
    pub fn path_in(git_dir: &Path) -> PathBuf {
        git_dir.join("fuzzy-rerere").join(CACHE_FILE)
    }

    /// Load the cache from `path`.
    ///
    /// A missing file is an empty cache. A file that exists but cannot be
    /// read or parsed is [`RerereError::CacheCorrupt`] — never silently
    /// treated as empty, since that would discard recorded resolutions on
    /// the next persist.
    ///
    /// # Errors
    /// Returns [`RerereError::CacheCorrupt`] on unreadable or malformed data.
    pub fn load(path: &Path) -> Result<Self, RerereError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache file; starting empty");
                return Ok(Self::new());
            }
            Err(err) => {
                return Err(RerereError::CacheCorrupt {
                    path: path.to_owned(),
                    detail: err.to_string(),
                });
            }
        };

        let file: CacheFile =
            serde_json::from_str(&text).map_err(|err| RerereError::CacheCorrupt {
                path: path.to_owned(),
                detail: err.to_string(),
            })?;

        let ids = file.records.iter().map(|r| r.id.clone()).collect();
        debug!(records = file.records.len(), "loaded resolution cache");
        Ok(Self {
            records: file.records,
            ids,
        })
    }

    /// Append a record, preserving all existing records.
    ///
    /// Returns `false` (and stores nothing) when a record with the same
    /// content id is already present — re-saving an identical resolution is
    /// a no-op, while distinct resolutions of the same conflict accumulate.
    pub fn append(&mut self, record: ResolutionRecord) -> bool {
        if self.ids.contains(&record.id) {
            debug!(id = %record.id, "duplicate record; skipping append");
            return false;
        }
        self.ids.insert(record.id.clone());
        self.records.push(record);
        true
    }

    /// Every stored record, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[ResolutionRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the cache to `path` atomically.
    ///
    /// Serializes to JSON, writes a temporary file in the same directory
    /// (same filesystem, so the rename cannot cross devices), fsyncs it, and
    /// renames over the target. A crash at any point leaves either the old
    /// file or the new file — never a truncated one.
    ///
    /// # Errors
    /// Returns [`RerereError::CacheWrite`] on any I/O or serialization failure.
    pub fn persist(&self, path: &Path) -> Result<(), RerereError> {
        let write_err = |detail: String| RerereError::CacheWrite {
            path: path.to_owned(),
            detail,
        };

        let file = CacheFile {
            records: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| write_err(format!("serialize: {e}")))?;

        let dir = path
            .parent()
            .ok_or_else(|| write_err("cache path has no parent directory".to_owned()))?;
        fs::create_dir_all(dir)
            .map_err(|e| write_err(format!("create {}: {e}", dir.display())))?;

        let tmp_path = dir.join(".cache.json.tmp");
        let mut tmp = fs::File::create(&tmp_path)
            .map_err(|e| write_err(format!("create {}: {e}", tmp_path.display())))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| write_err(format!("write {}: {e}", tmp_path.display())))?;
        tmp.sync_all()
            .map_err(|e| write_err(format!("fsync {}: {e}", tmp_path.display())))?;
        drop(tmp);

        fs::rename(&tmp_path, path).map_err(|e| {
            write_err(format!(
                "rename {} -> {}: {e}",
                tmp_path.display(),
                path.display()
            ))
        })?;

        debug!(records = self.records.len(), path = %path.display(), "persisted cache");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
