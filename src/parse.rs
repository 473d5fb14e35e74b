//! Conflict-marker extraction.
//!
//! Scans a line buffer for `<<<<<<<` / `|||||||` / `=======` / `>>>>>>>`
//! regions and captures each well-formed block together with its surrounding
//! context window. Malformed markers are reported as warnings and the rest of
//! the buffer is still scanned — a broken block never aborts the parse.
//!
//! Marker detection is column-0 anchored. `<<<<<<<`, `|||||||`, and
//! `>>>>>>>` may carry a trailing label after a space (git writes
//! `<<<<<<< HEAD`); the `=======` divider must be the whole line.
//!
//! Pure over its input — no I/O.

use std::fmt;

use crate::model::{ConflictBlock, ContextWindow};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One well-formed conflict with its captured surroundings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedConflict {
    pub block: ConflictBlock,
    pub context: ContextWindow,
}

/// A non-fatal problem found while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line the problem was detected at.
    pub line: usize,
    pub kind: WarningKind,
}

/// The ways a conflict region can be malformed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// A `<<<<<<<` block reached end of buffer without `>>>>>>>`.
    UnterminatedConflict,
    /// A new `<<<<<<<` appeared inside an open block; the open block is
    /// abandoned and scanning restarts at the new marker.
    RestartedConflict,
    /// `>>>>>>>` arrived before any `=======` divider.
    MissingDivider,
    /// A `|||||||` base divider appeared after `=======`.
    MisplacedBaseDivider,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            WarningKind::UnterminatedConflict => "conflict marker never terminated",
            WarningKind::RestartedConflict => {
                "new conflict marker opened before the previous one closed"
            }
            WarningKind::MissingDivider => "conflict closed without a ======= divider",
            WarningKind::MisplacedBaseDivider => "||||||| base divider after =======",
        };
        write!(f, "line {}: {what}; block skipped", self.line)
    }
}

// ---------------------------------------------------------------------------
// Marker predicates
// ---------------------------------------------------------------------------

fn is_labeled_marker(line: &str, marker: &str) -> bool {
    line == marker || (line.starts_with(marker) && line.as_bytes().get(7) == Some(&b' '))
}

fn is_conflict_start(line: &str) -> bool {
    is_labeled_marker(line, "<<<<<<<")
}

fn is_conflict_end(line: &str) -> bool {
    is_labeled_marker(line, ">>>>>>>")
}

fn is_base_divider(line: &str) -> bool {
    is_labeled_marker(line, "|||||||")
}

fn is_divider(line: &str) -> bool {
    line == "======="
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Scanning,
    InOurs,
    InBase,
    InTheirs,
}

/// Extract every well-formed conflict from `lines`, in document order, each
/// with up to `context_lines` of surrounding context.
///
/// The preceding window never reaches into an earlier conflict; the following
/// window stops early at the next `<<<<<<<` so one conflict's evidence never
/// includes another's markers.
#[must_use]
pub fn parse_conflicts(
    lines: &[String],
    context_lines: usize,
) -> (Vec<ParsedConflict>, Vec<ParseWarning>) {
    let mut conflicts = Vec::new();
    let mut warnings = Vec::new();

    let mut state = State::Scanning;
    // 0-based index of the current block's `<<<<<<<` line.
    let mut block_start = 0usize;
    // 0-based index one past the previous block's `>>>>>>>` line.
    let mut prev_block_end = 0usize;
    let mut ours: Vec<String> = Vec::new();
    let mut base: Vec<String> = Vec::new();
    let mut theirs: Vec<String> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if is_conflict_start(line) {
            if state != State::Scanning {
                warnings.push(ParseWarning {
                    line: block_start + 1,
                    kind: WarningKind::RestartedConflict,
                });
            }
            state = State::InOurs;
            block_start = i;
            ours.clear();
            base.clear();
            theirs.clear();
            continue;
        }

        match state {
            State::Scanning => {
                // stray dividers and end markers are plain text here
            }
            State::InOurs => {
                if is_base_divider(line) {
                    state = State::InBase;
                } else if is_divider(line) {
                    state = State::InTheirs;
                } else if is_conflict_end(line) {
                    warnings.push(ParseWarning {
                        line: i + 1,
                        kind: WarningKind::MissingDivider,
                    });
                    state = State::Scanning;
                } else {
                    ours.push(line.clone());
                }
            }
            State::InBase => {
                if is_divider(line) {
                    state = State::InTheirs;
                } else if is_conflict_end(line) {
                    warnings.push(ParseWarning {
                        line: i + 1,
                        kind: WarningKind::MissingDivider,
                    });
                    state = State::Scanning;
                } else {
                    base.push(line.clone());
                }
            }
            State::InTheirs => {
                if is_base_divider(line) {
                    warnings.push(ParseWarning {
                        line: i + 1,
                        kind: WarningKind::MisplacedBaseDivider,
                    });
                    state = State::Scanning;
                } else if is_conflict_end(line) {
                    let block = ConflictBlock {
                        start_line: block_start + 1,
                        end_line: i + 1,
                        ours: std::mem::take(&mut ours),
                        theirs: std::mem::take(&mut theirs),
                        base: if base.is_empty() {
                            None
                        } else {
                            Some(std::mem::take(&mut base))
                        },
                    };
                    let context = capture_context(
                        lines,
                        block_start,
                        i,
                        prev_block_end,
                        context_lines,
                    );
                    conflicts.push(ParsedConflict { block, context });
                    base.clear();
                    prev_block_end = i + 1;
                    state = State::Scanning;
                } else {
                    theirs.push(line.clone());
                }
            }
        }
    }

    if state != State::Scanning {
        warnings.push(ParseWarning {
            line: block_start + 1,
            kind: WarningKind::UnterminatedConflict,
        });
    }

    (conflicts, warnings)
}

/// Up to `n` lines before `start` (not reaching past the previous block's
/// end) and up to `n` lines after `end` (stopping at the next `<<<<<<<`).
/// Indices are 0-based.
fn capture_context(
    lines: &[String],
    start: usize,
    end: usize,
    prev_block_end: usize,
    n: usize,
) -> ContextWindow {
    let before_from = start.saturating_sub(n).max(prev_block_end);
    let preceding = lines[before_from..start].to_vec();

    let mut following = Vec::with_capacity(n);
    for line in lines.iter().skip(end + 1).take(n) {
        if is_conflict_start(line) {
            break;
        }
        following.push(line.clone());
    }

    ContextWindow {
        preceding,
        following,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
