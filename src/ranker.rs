//! Candidate selection and ranking.
//!
//! Given a freshly parsed [`ConflictSignature`], filter the cached records by
//! conflict-body similarity and context similarity against a threshold, then
//! rank the survivors with a composite ordering key compared
//! lexicographically:
//!
//! 1. exact filename match beats non-match
//! 2. higher context similarity beats lower
//! 3. smaller line-number distance beats larger
//! 4. earlier insertion beats later (the documented final tie-break)
//!
//! The key is an explicit [`RankKey`] with an `Ord` impl rather than nested
//! conditionals, so each level is auditable and testable on its own. Level 4
//! makes keys totally distinct, so selection is deterministic regardless of
//! how the maximum is taken.

use std::cmp::Ordering;

use crate::model::{ConflictSignature, ResolutionRecord};
use crate::similarity::{body_similarity, context_similarity};

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A cached record that cleared the threshold, with its scores.
#[derive(Clone, Debug)]
pub struct Match<'a> {
    /// The winning (or surviving) record.
    pub record: &'a ResolutionRecord,
    /// Mean of ours/ours and theirs/theirs similarity. Always `>= threshold`.
    pub body_similarity: f64,
    /// Mean of preceding/preceding and following/following similarity.
    /// Always `>= threshold`.
    pub context_similarity: f64,
    /// Whether the record was saved from the same filename.
    pub same_file: bool,
    /// `|query line - record line|`.
    pub line_distance: u64,
}

// ---------------------------------------------------------------------------
// RankKey
// ---------------------------------------------------------------------------

/// Composite ordering key; a larger key ranks higher.
#[derive(Clone, Copy, Debug)]
struct RankKey {
    same_file: bool,
    context_similarity: f64,
    line_distance: u64,
    insertion_index: usize,
}

impl RankKey {
    const fn of(m: &Match<'_>, insertion_index: usize) -> Self {
        Self {
            same_file: m.same_file,
            context_similarity: m.context_similarity,
            line_distance: m.line_distance,
            insertion_index,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.same_file
            .cmp(&other.same_file)
            .then_with(|| self.context_similarity.total_cmp(&other.context_similarity))
            // smaller distance ranks higher
            .then_with(|| other.line_distance.cmp(&self.line_distance))
            // earlier insertion ranks higher
            .then_with(|| other.insertion_index.cmp(&self.insertion_index))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// All records whose body similarity *and* context similarity reach
/// `threshold` (a candidate scoring exactly at the threshold is accepted),
/// in insertion order.
///
/// A near-perfect conflict body in unfamiliar surroundings is not a match:
/// the context gate keeps a resolution recorded in one region of code from
/// being spliced into a lookalike conflict somewhere unrelated.
#[must_use]
pub fn candidates<'a>(
    signature: &ConflictSignature,
    records: &'a [ResolutionRecord],
    threshold: f64,
) -> Vec<Match<'a>> {
    records
        .iter()
        .filter_map(|record| {
            let body = body_similarity(signature, &record.signature);
            if body < threshold {
                return None;
            }
            let context = context_similarity(signature, &record.signature);
            if context < threshold {
                return None;
            }
            Some(Match {
                record,
                body_similarity: body,
                context_similarity: context,
                same_file: signature.file == record.signature.file,
                line_distance: signature.line().abs_diff(record.signature.line()) as u64,
            })
        })
        .collect()
}

/// The single best-matching record for `signature`, or `None` when no record
/// clears the threshold.
#[must_use]
pub fn find_best<'a>(
    signature: &ConflictSignature,
    records: &'a [ResolutionRecord],
    threshold: f64,
) -> Option<Match<'a>> {
    candidates(signature, records, threshold)
        .into_iter()
        .enumerate()
        .max_by_key(|(index, m)| RankKey::of(m, *index))
        .map(|(_, m)| m)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
