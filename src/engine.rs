//! Orchestration of the mark / save / reapply pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::apply::apply_all;
use crate::cache::ResolutionCache;
use crate::config::RerereConfig;
use crate::error::RerereError;
use crate::model::{ConflictSignature, ResolutionRecord, SourceBuffer};
use crate::parse::{ParseWarning, parse_conflicts};
use crate::ranker::find_best;
use crate::snapshot;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What `mark-conflicts` did for each requested file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkReport {
    /// Files snapshotted, paired with the number of conflicts found in each.
    pub snapshotted: Vec<(PathBuf, usize)>,
}

/// What `save-resolutions` recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Snapshots that yielded at least one resolution.
    pub files_processed: usize,
    /// New records appended to the cache.
    pub saved: usize,
    /// Derived resolutions already present in the cache.
    pub duplicates: usize,
}

/// Outcome for one conflict during `reapply-resolutions`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictOutcome {
    /// 1-based line the conflict starts at, in the file as it was read.
    pub line: usize,
    /// The applied record's id and body similarity, or `None` when no
    /// cached resolution cleared the threshold.
    pub applied: Option<(String, f64)>,
}

/// Per-file reapply results, in sorted-filename order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReapplyReport {
    pub files: Vec<(PathBuf, Vec<ConflictOutcome>)>,
}

impl ReapplyReport {
    /// Conflicts a cached resolution was spliced into.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.outcomes().filter(|o| o.applied.is_some()).count()
    }

    /// Conflicts left for manual resolution.
    #[must_use]
    pub fn unresolved(&self) -> usize {
        self.outcomes().filter(|o| o.applied.is_none()).count()
    }

    fn outcomes(&self) -> impl Iterator<Item = &ConflictOutcome> {
        self.files.iter().flat_map(|(_, outcomes)| outcomes.iter())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The fuzzy-rerere engine: ties parsing, the cache, matching, and the
/// snapshot store together under one git dir and one config.
#[derive(Debug)]
pub struct Rerereric {
    config: RerereConfig,
    git_dir: PathBuf,
}

impl Rerereric {
    #[must_use]
    pub fn new(config: RerereConfig, git_dir: PathBuf) -> Self {
        Self { config, git_dir }
    }

    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        ResolutionCache::path_in(&self.git_dir)
    }

    /// Snapshot each file's current (conflicted) content so resolutions can
    /// be recovered later. Files without conflict markers are snapshotted
    /// too; `save-resolutions` discards them.
    ///
    /// # Errors
    /// Fails if any file or its snapshot cannot be read/written.
    pub fn mark_conflicts(&self, files: &[PathBuf]) -> Result<MarkReport, RerereError> {
        let mut report = MarkReport::default();
        for file in files {
            let buffer = read_buffer(file)?;
            let (conflicts, warnings) = parse_conflicts(buffer.lines(), self.config.context);
            log_warnings(file, &warnings);
            if conflicts.is_empty() {
                warn!(file = %file.display(), "no conflict markers found");
            }
            snapshot::write_snapshot(&self.git_dir, file)?;
            report.snapshotted.push((file.clone(), conflicts.len()));
        }
        Ok(report)
    }

    /// Compare every snapshot against its now-resolved file and record the
    /// replacement text for each conflict.
    ///
    /// Snapshots are deleted only after the cache has been persisted, so a
    /// failed write leaves everything re-runnable. Snapshots without
    /// conflicts, or whose source file no longer exists, are dropped with a
    /// warning.
    ///
    /// # Errors
    /// Fails on unreadable snapshots, a corrupt cache, or a failed persist.
    pub fn save_resolutions(&self) -> Result<SaveReport, RerereError> {
        let cache_path = self.cache_path();
        let mut cache = ResolutionCache::load(&cache_path)?;
        let mut report = SaveReport::default();
        let mut processed = Vec::new();

        for (snapshot_path, source) in snapshot::list_snapshots(&self.git_dir)? {
            let pre = read_buffer(&snapshot_path)?;
            let (conflicts, warnings) = parse_conflicts(pre.lines(), self.config.context);
            log_warnings(&source, &warnings);

            if conflicts.is_empty() {
                warn!(file = %source.display(), "snapshot has no conflicts, discarding");
                snapshot::remove_snapshot(&snapshot_path)?;
                continue;
            }

            let post = match read_buffer(&source) {
                Ok(post) => post,
                Err(_) if !source.exists() => {
                    warn!(file = %source.display(), "resolved file is gone, discarding snapshot");
                    snapshot::remove_snapshot(&snapshot_path)?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let derived = snapshot::derive_resolutions(&pre, &post, &conflicts);
            for d in derived {
                let conflict = &conflicts[d.conflict_index];
                let signature = ConflictSignature {
                    file: source.clone(),
                    block: conflict.block.clone(),
                    context: conflict.context.clone(),
                };
                let record = ResolutionRecord::new(signature, d.resolution);
                if cache.append(record) {
                    report.saved += 1;
                } else {
                    report.duplicates += 1;
                }
            }

            report.files_processed += 1;
            processed.push(snapshot_path);
        }

        cache.persist(&cache_path)?;
        for snapshot_path in processed {
            snapshot::remove_snapshot(&snapshot_path)?;
        }

        info!(
            saved = report.saved,
            duplicates = report.duplicates,
            "recorded resolutions"
        );
        Ok(report)
    }

    /// Resolve conflicts in `files` from the cache where a recorded
    /// resolution matches closely enough.
    ///
    /// Files are visited in sorted order and each file's conflicts are
    /// reported in document order; a conflict no record matches is an
    /// `unresolved` outcome, not an error. A file is rewritten only when at
    /// least one resolution applied.
    ///
    /// # Errors
    /// Fails on unreadable/unwritable files or a corrupt cache.
    pub fn reapply_resolutions(&self, files: &[PathBuf]) -> Result<ReapplyReport, RerereError> {
        let cache = ResolutionCache::load(&self.cache_path())?;
        if cache.is_empty() {
            debug!("resolution cache is empty");
        }

        let mut sorted: Vec<&PathBuf> = files.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut report = ReapplyReport::default();
        for file in sorted {
            let buffer = read_buffer(file)?;
            let (conflicts, warnings) = parse_conflicts(buffer.lines(), self.config.context);
            log_warnings(file, &warnings);

            let mut outcomes = Vec::with_capacity(conflicts.len());
            let mut patches = Vec::new();
            for conflict in &conflicts {
                let signature = ConflictSignature {
                    file: file.clone(),
                    block: conflict.block.clone(),
                    context: conflict.context.clone(),
                };
                match find_best(&signature, cache.records(), self.config.similarity) {
                    Some(m) => {
                        info!(
                            file = %file.display(),
                            line = conflict.block.start_line,
                            similarity = m.body_similarity,
                            from = %m.record.signature.file.display(),
                            "applying cached resolution"
                        );
                        patches.push((
                            (conflict.block.start_line, conflict.block.end_line),
                            m.record.resolution.clone(),
                        ));
                        outcomes.push(ConflictOutcome {
                            line: conflict.block.start_line,
                            applied: Some((m.record.id.clone(), m.body_similarity)),
                        });
                    }
                    None => {
                        debug!(
                            file = %file.display(),
                            line = conflict.block.start_line,
                            "no cached resolution cleared the threshold"
                        );
                        outcomes.push(ConflictOutcome {
                            line: conflict.block.start_line,
                            applied: None,
                        });
                    }
                }
            }

            if !patches.is_empty() {
                let patched = apply_all(&buffer, &patches);
                fs::write(file, patched.to_text()).map_err(|e| RerereError::file_io(file, &e))?;
            }
            report.files.push((file.clone(), outcomes));
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn read_buffer(path: &Path) -> Result<SourceBuffer, RerereError> {
    let text = fs::read_to_string(path).map_err(|e| RerereError::file_io(path, &e))?;
    Ok(SourceBuffer::from_text(&text))
}

fn log_warnings(file: &Path, warnings: &[ParseWarning]) {
    for warning in warnings {
        warn!(file = %file.display(), "{warning}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
