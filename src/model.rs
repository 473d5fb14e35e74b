//! Data model for conflict matching — blocks, context windows, signatures,
//! and persisted resolution records.
//!
//! [`ConflictBlock`] and [`ContextWindow`] are transient per-parse constructs.
//! [`ConflictSignature`] is the fuzzy-comparable identity of a conflict and
//! [`ResolutionRecord`] is the durable unit the cache accumulates. Records
//! serialize line sequences losslessly — exact whitespace and empty lines —
//! because matching compares lines by exact string equality.

use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// ConflictBlock
// ---------------------------------------------------------------------------

/// A single `<<<<<<<`…`=======`…`>>>>>>>` region found in a buffer.
///
/// Line numbers are 1-based and inclusive: `start_line` is the `<<<<<<<`
/// marker line, `end_line` the `>>>>>>>` marker line. The marker lines
/// themselves are not part of `ours`/`theirs`/`base`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictBlock {
    /// Line of the `<<<<<<<` marker (1-based, inclusive).
    pub start_line: usize,

    /// Line of the `>>>>>>>` marker (1-based, inclusive).
    pub end_line: usize,

    /// Lines between `<<<<<<<` and the `=======` divider
    /// (or the `|||||||` base divider, when present).
    pub ours: Vec<String>,

    /// Lines between the `=======` divider and `>>>>>>>`.
    pub theirs: Vec<String>,

    /// Lines between `|||||||` and `=======`, for diff3-style conflicts.
    pub base: Option<Vec<String>>,
}

impl ConflictBlock {
    /// Number of buffer lines the block spans, markers included.
    #[must_use]
    pub const fn span(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

impl fmt::Display for ConflictBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflict at lines {}-{} ({} ours / {} theirs)",
            self.start_line,
            self.end_line,
            self.ours.len(),
            self.theirs.len()
        )
    }
}

// ---------------------------------------------------------------------------
// ContextWindow
// ---------------------------------------------------------------------------

/// The lines immediately surrounding a conflict in its source buffer.
///
/// Each side holds at most the configured number of context lines; fewer at
/// buffer boundaries or when another conflict sits closer than that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Lines immediately before the `<<<<<<<` marker, in document order.
    pub preceding: Vec<String>,

    /// Lines immediately after the `>>>>>>>` marker, in document order.
    pub following: Vec<String>,
}

// ---------------------------------------------------------------------------
// ConflictSignature
// ---------------------------------------------------------------------------

/// The fuzzy-matchable identity of a conflict: its body, its surroundings,
/// and where it was found.
///
/// Signatures are compared, never required to be byte-identical. The conflict
/// body is the primary identity; context, filename, and line number are
/// secondary ranking evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSignature {
    /// Path of the file the conflict was found in.
    pub file: PathBuf,

    /// The conflict body and its location in that file.
    pub block: ConflictBlock,

    /// Surrounding lines captured at parse time.
    pub context: ContextWindow,
}

impl ConflictSignature {
    /// The 1-based line the conflict starts at.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.block.start_line
    }
}

// ---------------------------------------------------------------------------
// ResolutionRecord
// ---------------------------------------------------------------------------

/// A persisted resolution: what the conflict looked like and what the
/// developer replaced it with. Immutable once written; the cache holds many.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// Content-derived identifier (16 hex chars of a SHA-256 digest over
    /// the signature and resolution). Stable across re-saves of the same
    /// resolution.
    pub id: String,

    /// The conflict this resolution was recorded for.
    pub signature: ConflictSignature,

    /// The replacement lines, verbatim.
    pub resolution: Vec<String>,

    /// Unix timestamp in milliseconds at record creation.
    pub recorded_at: u64,
}

impl ResolutionRecord {
    /// Create a record for `signature` resolved to `resolution`, stamped now.
    #[must_use]
    pub fn new(signature: ConflictSignature, resolution: Vec<String>) -> Self {
        let id = record_id(&signature, &resolution);
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        Self {
            id,
            signature,
            resolution,
            recorded_at,
        }
    }
}

/// Derive the content id for a (signature, resolution) pair.
///
/// Sections are separated by NUL bytes and lines by newlines so that
/// differently-split content never collides.
#[must_use]
pub fn record_id(signature: &ConflictSignature, resolution: &[String]) -> String {
    let mut hasher = Sha256::new();

    let mut feed_lines = |lines: &[String]| {
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update([0u8]);
    };

    feed_lines(&signature.block.ours);
    feed_lines(&signature.block.theirs);
    feed_lines(signature.block.base.as_deref().unwrap_or(&[]));
    feed_lines(&signature.context.preceding);
    feed_lines(&signature.context.following);
    feed_lines(resolution);

    hasher.update(signature.file.to_string_lossy().as_bytes());
    hasher.update([0u8]);
    hasher.update(signature.block.start_line.to_le_bytes());
    hasher.update(signature.block.end_line.to_le_bytes());

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in &digest[..8] {
        use fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

// ---------------------------------------------------------------------------
// SourceBuffer
// ---------------------------------------------------------------------------

/// A text buffer as a line sequence, remembering whether the original text
/// ended with a newline so that read → patch → write is byte-faithful for
/// untouched content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceBuffer {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl SourceBuffer {
    /// Split `text` into lines. An empty string maps to zero lines.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self {
                lines: Vec::new(),
                trailing_newline: false,
            };
        }
        let trailing_newline = text.ends_with('\n');
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
        if trailing_newline {
            // split leaves one empty trailing element
            lines.pop();
        }
        Self {
            lines,
            trailing_newline,
        }
    }

    /// Build a buffer from owned lines, with an explicit trailing-newline flag.
    #[must_use]
    pub const fn from_lines(lines: Vec<String>, trailing_newline: bool) -> Self {
        Self {
            lines,
            trailing_newline,
        }
    }

    /// The buffer's lines, without terminators.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether the original text ended with a newline.
    #[must_use]
    pub const fn has_trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    /// Reassemble the buffer into text.
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.lines.is_empty() {
            return if self.trailing_newline {
                "\n".to_owned()
            } else {
                String::new()
            };
        }
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
