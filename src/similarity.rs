//! Line-sequence similarity scoring.
//!
//! Implements the classic sequence-matcher ratio over whole lines: find the
//! longest common contiguous block, recurse into the gaps on either side, and
//! report `2 * M / (len(a) + len(b))` where `M` is the total matched length.
//! The comparison unit is a whole line under exact string equality.
//!
//! Pure and stateless — same inputs always produce the same score. Candidate
//! positions are scanned in document order, so results never depend on hash
//! iteration order.

use std::collections::HashMap;

use crate::model::ConflictSignature;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalized similarity of two line sequences, in `[0, 1]`.
///
/// Properties:
/// - `score(a, a) == 1.0` (two empty sequences also score 1.0)
/// - `score(a, b) == score(b, a)`
/// - `score(a, b) == 0.0` when `a` and `b` share no line
#[must_use]
pub fn score(a: &[String], b: &[String]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(a, b).iter().map(|m| m.size).sum();
    #[allow(clippy::cast_precision_loss)]
    let ratio = 2.0 * matched as f64 / total as f64;
    ratio
}

/// Combined conflict-body similarity of two signatures: the mean of the
/// ours/ours and theirs/theirs scores. This is the primary identity used by
/// the threshold filter.
#[must_use]
pub fn body_similarity(a: &ConflictSignature, b: &ConflictSignature) -> f64 {
    let ours = score(&a.block.ours, &b.block.ours);
    let theirs = score(&a.block.theirs, &b.block.theirs);
    (ours + theirs) / 2.0
}

/// Combined context similarity of two signatures: the mean of the
/// preceding/preceding and following/following scores.
#[must_use]
pub fn context_similarity(a: &ConflictSignature, b: &ConflictSignature) -> f64 {
    let before = score(&a.context.preceding, &b.context.preceding);
    let after = score(&a.context.following, &b.context.following);
    (before + after) / 2.0
}

// ---------------------------------------------------------------------------
// Matching blocks
// ---------------------------------------------------------------------------

/// A maximal run of equal lines: `a[a_start..a_start+size] ==
/// b[b_start..b_start+size]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MatchRun {
    a_start: usize,
    b_start: usize,
    size: usize,
}

/// Non-overlapping, order-preserving matching runs between `a` and `b`,
/// found by repeatedly taking the longest common contiguous block and
/// recursing into the unmatched gaps on each side.
fn matching_blocks(a: &[String], b: &[String]) -> Vec<MatchRun> {
    let mut runs = Vec::new();
    // Explicit work stack instead of recursion; regions are processed in a
    // deterministic order and the result is sorted at the end anyway.
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let run = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if run.size == 0 {
            continue;
        }
        runs.push(run);
        if a_lo < run.a_start && b_lo < run.b_start {
            pending.push((a_lo, run.a_start, b_lo, run.b_start));
        }
        if run.a_start + run.size < a_hi && run.b_start + run.size < b_hi {
            pending.push((run.a_start + run.size, a_hi, run.b_start + run.size, b_hi));
        }
    }

    runs.sort_unstable_by_key(|r| (r.a_start, r.b_start));
    runs
}

/// The longest block of consecutive equal lines within
/// `a[a_lo..a_hi]` × `b[b_lo..b_hi]`.
///
/// Ties break toward the earliest position in `a`, then in `b`, because
/// candidates are scanned in ascending order and only a strictly longer run
/// replaces the current best.
fn longest_match(
    a: &[String],
    b: &[String],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> MatchRun {
    // Index every line of b's window by content. Positions are pushed in
    // ascending order so each bucket stays sorted.
    let mut b_positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, line) in b.iter().enumerate().take(b_hi).skip(b_lo) {
        b_positions.entry(line.as_str()).or_default().push(j);
    }

    let mut best = MatchRun {
        a_start: a_lo,
        b_start: b_lo,
        size: 0,
    };
    // run_lengths[j] = length of the run ending at (i, j)
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for i in a_lo..a_hi {
        let mut next_lengths: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_positions.get(a[i].as_str()) {
            for &j in positions {
                let len = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev).copied())
                    .unwrap_or(0)
                    + 1;
                next_lengths.insert(j, len);
                if len > best.size {
                    best = MatchRun {
                        a_start: i + 1 - len,
                        b_start: j + 1 - len,
                        size: len,
                    };
                }
            }
        }
        run_lengths = next_lengths;
    }

    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
