//! Pre-resolution snapshots and resolution derivation.
//!
//! `mark-conflicts` saves each conflicted file verbatim under
//! `<git_dir>/fuzzy-rerere/snapshots/` (path separators encoded as `__`).
//! After the developer resolves the conflicts in place, `save-resolutions`
//! aligns the resolved file against its snapshot to recover exactly what
//! replaced each conflict block.
//!
//! The alignment is a forward scan: starting at the conflict's position in
//! both versions, consume resolved-file lines until a window of
//! [`REQUIRED_MATCHING_LINES`] consecutive non-empty lines matches the
//! snapshot's post-conflict content (restarting the window on any mismatch),
//! or until the snapshot reaches its next `<<<<<<<`. Everything consumed
//! before the window locked in is the resolution text. Offsets accumulate
//! across conflicts in the same file, since each resolution shifts the lines
//! below it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::RerereError;
use crate::model::SourceBuffer;
use crate::parse::ParsedConflict;

/// Consecutive non-empty matching lines required to anchor the end of a
/// resolution against the snapshot's post-conflict content.
const REQUIRED_MATCHING_LINES: usize = 3;

/// File extension for snapshots.
const SNAPSHOT_EXT: &str = "pre";

// ---------------------------------------------------------------------------
// Snapshot store
// ---------------------------------------------------------------------------

/// Directory that holds `.pre` snapshots under a git dir.
#[must_use]
pub fn snapshot_dir(git_dir: &Path) -> PathBuf {
    git_dir.join("fuzzy-rerere").join("snapshots")
}

/// Encode a source path into a flat snapshot file name
/// (`src/lib.rs` → `src__lib.rs.pre`).
fn snapshot_name(file: &Path) -> String {
    let encoded = file.to_string_lossy().replace('/', "__");
    format!("{encoded}.{SNAPSHOT_EXT}")
}

/// Recover the source path from a snapshot file name.
fn source_path(snapshot: &Path) -> Option<PathBuf> {
    let name = snapshot.file_name()?.to_string_lossy();
    let stem = name.strip_suffix(&format!(".{SNAPSHOT_EXT}"))?;
    Some(PathBuf::from(stem.replace("__", "/")))
}

/// Save `file`'s current content verbatim as a snapshot.
///
/// # Errors
/// Returns [`RerereError::FileIo`] if the source cannot be read or the
/// snapshot cannot be written.
pub fn write_snapshot(git_dir: &Path, file: &Path) -> Result<PathBuf, RerereError> {
    let content = fs::read_to_string(file).map_err(|e| RerereError::file_io(file, &e))?;

    let dir = snapshot_dir(git_dir);
    fs::create_dir_all(&dir).map_err(|e| RerereError::file_io(&dir, &e))?;

    let path = dir.join(snapshot_name(file));
    fs::write(&path, content).map_err(|e| RerereError::file_io(&path, &e))?;
    debug!(file = %file.display(), snapshot = %path.display(), "saved pre-resolution snapshot");
    Ok(path)
}

/// Every snapshot currently on disk, as `(snapshot_path, source_path)`
/// pairs, sorted by snapshot name for deterministic processing order.
///
/// # Errors
/// Returns [`RerereError::FileIo`] if the snapshot directory cannot be read.
pub fn list_snapshots(git_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>, RerereError> {
    let dir = snapshot_dir(git_dir);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RerereError::file_io(&dir, &e)),
    };

    let mut snapshots = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RerereError::file_io(&dir, &e))?;
        let path = entry.path();
        if let Some(source) = source_path(&path) {
            snapshots.push((path, source));
        }
    }
    snapshots.sort();
    Ok(snapshots)
}

/// Remove a processed (or useless) snapshot. Missing files are fine.
///
/// # Errors
/// Returns [`RerereError::FileIo`] if the file exists but cannot be removed.
pub fn remove_snapshot(path: &Path) -> Result<(), RerereError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RerereError::file_io(path, &e)),
    }
}

// ---------------------------------------------------------------------------
// Resolution derivation
// ---------------------------------------------------------------------------

/// A conflict's replacement text recovered by aligning resolved content
/// against the snapshot. `conflict_index` refers to the parsed conflict list
/// the derivation ran over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedResolution {
    pub conflict_index: usize,
    pub resolution: Vec<String>,
}

/// For each conflict parsed out of the snapshot (`pre`), recover the lines
/// that replaced it in the resolved buffer (`post`).
#[must_use]
pub fn derive_resolutions(
    pre: &SourceBuffer,
    post: &SourceBuffer,
    conflicts: &[ParsedConflict],
) -> Vec<DerivedResolution> {
    let pre_lines = pre.lines();
    let post_lines = post.lines();

    let mut derived = Vec::with_capacity(conflicts.len());
    // Cumulative length difference between resolutions and the blocks they
    // replaced, for mapping snapshot positions into the resolved buffer.
    let mut offset: isize = 0;

    for (conflict_index, conflict) in conflicts.iter().enumerate() {
        // 0-based marker positions in the snapshot.
        let pre_start = conflict.block.start_line - 1;
        let pre_end = conflict.block.end_line - 1;

        #[allow(clippy::cast_possible_wrap)]
        let shifted = pre_start as isize + offset;
        let post_start = usize::try_from(shifted.max(0)).unwrap_or(0);
        let mut post_end = post_start;

        let mut post_line = post_start;
        let mut pre_line = pre_end + 1;
        let mut matches = 0usize;

        // A conflict with no snapshot content after it has nothing to anchor
        // against; whatever remains of the resolved buffer is its resolution.
        if pre_line >= pre_lines.len() {
            post_end = post_lines.len().max(post_start);
        }

        while post_line < post_lines.len() && pre_line < pre_lines.len() {
            if pre_lines[pre_line].starts_with("<<<<<<<") {
                break;
            }
            if post_lines[post_line] == pre_lines[pre_line] {
                if !pre_lines[pre_line].trim().is_empty() {
                    matches += 1;
                }
                pre_line += 1;
            } else {
                // restart the anchor window from just past the conflict
                matches = 0;
                pre_line = pre_end + 1;
                post_end = post_line + 1;
            }
            post_line += 1;

            if matches == REQUIRED_MATCHING_LINES {
                break;
            }
        }

        let resolution = post_lines
            .get(post_start..post_end)
            .unwrap_or(&[])
            .to_vec();

        #[allow(clippy::cast_possible_wrap)]
        {
            let block_len = (pre_end - pre_start + 1) as isize;
            offset += resolution.len() as isize - block_len;
        }

        derived.push(DerivedResolution {
            conflict_index,
            resolution,
        });
    }

    derived
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
