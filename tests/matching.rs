//! Fuzzy matching, thresholds, and ranking through the full engine.

mod common;

use common::{conflict_text, setup_repo};
use rerereric::config::RerereConfig;

/// Record one resolution: the given conflict in `file`, resolved to
/// `resolution` (a single line).
fn record(
    repo: &common::TestRepo,
    file: &str,
    text: &str,
    resolution: &str,
) {
    let path = repo.write(file, text);
    let eng = repo.engine();
    eng.mark_conflicts(std::slice::from_ref(&path)).unwrap();

    // Re-parse to find what surrounds the conflict so the resolved file
    // keeps everything except the block itself.
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| l.starts_with("<<<<<<<")).unwrap();
    let end = lines.iter().position(|l| l.starts_with(">>>>>>>")).unwrap();
    let mut resolved: Vec<&str> = lines[..start].to_vec();
    resolved.push(resolution);
    resolved.extend_from_slice(&lines[end + 1..]);
    let mut resolved_text = resolved.join("\n");
    resolved_text.push('\n');

    repo.write(file, &resolved_text);
    eng.save_resolutions().unwrap();
}

#[test]
fn near_identical_conflict_matches_above_the_threshold() {
    let repo = setup_repo();

    let recorded = conflict_text(
        "use std::fs;",
        &["let a = 1;", "let b = 2;", "let c = 3;", "let d = 4;"],
        &["let a = 10;", "let b = 20;", "let c = 30;", "let d = 40;"],
        "fn main() {}",
    );
    record(&repo, "a.rs", &recorded, "let merged = true;");

    // One line changed on each side: 3 of 4 lines per side still match,
    // so body similarity is 0.75.
    let drifted = conflict_text(
        "use std::fs;",
        &["let a = 1;", "let b = 2;", "let c = 3;", "let e = 5;"],
        &["let a = 10;", "let b = 20;", "let c = 30;", "let e = 50;"],
        "fn main() {}",
    );
    let b = repo.write("b.rs", &drifted);

    // Default threshold 0.8 rejects the match.
    let strict = repo.engine();
    let report = strict.reapply_resolutions(std::slice::from_ref(&b)).unwrap();
    assert_eq!(report.applied(), 0);
    assert_eq!(report.unresolved(), 1);

    // 0.7 accepts it.
    let lenient = repo.engine_with(RerereConfig {
        similarity: 0.7,
        ..RerereConfig::default()
    });
    let report = lenient.reapply_resolutions(std::slice::from_ref(&b)).unwrap();
    assert_eq!(report.applied(), 1);
    assert!(repo.read(&b).contains("let merged = true;"));
}

#[test]
fn threshold_is_inclusive() {
    let repo = setup_repo();

    let recorded = conflict_text("ctx", &["one", "two"], &["three", "four"], "more");
    record(&repo, "a.txt", &recorded, "picked");

    // Half the lines of each side match: body similarity is exactly 0.5.
    let half = conflict_text("ctx", &["one", "changed"], &["three", "altered"], "more");
    let b = repo.write("b.txt", &half);

    let at_threshold = repo.engine_with(RerereConfig {
        similarity: 0.5,
        ..RerereConfig::default()
    });
    let report = at_threshold
        .reapply_resolutions(std::slice::from_ref(&b))
        .unwrap();
    assert_eq!(report.applied(), 1);
}

#[test]
fn half_context_match_depends_on_the_threshold() {
    let repo = setup_repo();

    let recorded = conflict_text("x1\nx2", &["a", "b"], &["c", "d"], "y1\ny2");
    let a = repo.write("a.txt", &recorded);
    let eng = repo.engine();
    eng.mark_conflicts(std::slice::from_ref(&a)).unwrap();
    repo.write("a.txt", "x1\nx2\na\nc\ny1\ny2\n");
    let saved = eng.save_resolutions().unwrap();
    assert_eq!(saved.saved, 1);

    // Identical conflict body, but only the preceding context matches:
    // context similarity is 0.5.
    let drifted = conflict_text("x1\nx2", &["a", "b"], &["c", "d"], "z1\nz2");

    // 0.9 rejects on context despite the perfect body.
    let strict = repo.engine_with(RerereConfig {
        similarity: 0.9,
        ..RerereConfig::default()
    });
    let b = repo.write("b.txt", &drifted);
    let report = strict.reapply_resolutions(std::slice::from_ref(&b)).unwrap();
    assert_eq!(report.applied(), 0);
    assert_eq!(report.unresolved(), 1);
    assert_eq!(repo.read(&b), drifted);

    // 0.4 accepts.
    let lenient = repo.engine_with(RerereConfig {
        similarity: 0.4,
        ..RerereConfig::default()
    });
    let c = repo.write("c.txt", &drifted);
    let report = lenient.reapply_resolutions(std::slice::from_ref(&c)).unwrap();
    assert_eq!(report.applied(), 1);
    assert_eq!(repo.read(&c), "x1\nx2\na\nc\nz1\nz2\n");
}

#[test]
fn record_from_the_same_filename_wins() {
    let repo = setup_repo();

    let text = conflict_text("shared ctx", &["mine"], &["theirs"], "shared tail");
    // Identical conflict resolved differently in two files.
    record(&repo, "left.txt", &text, "left resolution");
    record(&repo, "right.txt", &text, "right resolution");

    // A fresh conflict in right.txt prefers the record saved from right.txt.
    let target = repo.write("right.txt", &text);
    let report = repo
        .engine()
        .reapply_resolutions(std::slice::from_ref(&target))
        .unwrap();
    assert_eq!(report.applied(), 1);
    assert_eq!(repo.read(&target), "shared ctx\nright resolution\nshared tail\n");
}

#[test]
fn closer_context_wins_over_farther() {
    let repo = setup_repo();

    // Same conflict body, different surroundings.
    let matching_ctx = conflict_text("alpha beta", &["x"], &["y"], "gamma delta");
    let other_ctx = conflict_text("unrelated here", &["x"], &["y"], "nothing alike");
    record(&repo, "a.txt", &matching_ctx, "context pick");
    record(&repo, "b.txt", &other_ctx, "stray pick");

    let target = repo.write("c.txt", &matching_ctx);
    let report = repo
        .engine()
        .reapply_resolutions(std::slice::from_ref(&target))
        .unwrap();
    assert_eq!(report.applied(), 1);
    assert_eq!(repo.read(&target), "alpha beta\ncontext pick\ngamma delta\n");
}

#[test]
fn nearer_line_wins_when_context_ties() {
    let repo = setup_repo();

    // One file with the same conflict at two distant positions, resolved
    // differently. Identical padding everywhere makes the contexts tie, so
    // ranking falls through to line distance.
    let pad3 = "pad\n".repeat(3);
    let pad40 = "pad\n".repeat(40);
    let top = conflict_text(&pad3, &["x"], &["y"], &pad3);
    let bottom = conflict_text("", &["x"], &["y"], &pad3);
    let combined = format!("{top}{pad40}{bottom}");

    let path = repo.write("a.txt", &combined);
    let eng = repo.engine();
    eng.mark_conflicts(std::slice::from_ref(&path)).unwrap();

    // Resolve the top conflict to "near pick" and the bottom to "far pick".
    let resolved = format!("{pad3}near pick\n{pad3}{pad40}far pick\n{pad3}");
    repo.write("a.txt", &resolved);
    let saved = eng.save_resolutions().unwrap();
    assert_eq!(saved.saved, 2);

    // A new conflict near the bottom of a similarly shaped file picks the
    // record recorded farther down.
    let query = format!("pad\n{pad3}{pad40}{bottom}");
    let target = repo.write("b.txt", &query);
    let report = eng.reapply_resolutions(std::slice::from_ref(&target)).unwrap();
    assert_eq!(report.applied(), 1);
    assert!(repo.read(&target).contains("far pick"));
    assert!(!repo.read(&target).contains("near pick"));
}

#[test]
fn completely_different_conflict_never_matches() {
    let repo = setup_repo();

    let recorded = conflict_text("a", &["original lines"], &["other lines"], "z");
    record(&repo, "a.txt", &recorded, "whatever");

    let unrelated = conflict_text("a", &["nothing shared"], &["at all"], "z");
    let b = repo.write("b.txt", &unrelated);
    let report = repo
        .engine()
        .reapply_resolutions(std::slice::from_ref(&b))
        .unwrap();
    assert_eq!(report.applied(), 0);
    assert_eq!(report.unresolved(), 1);
    assert_eq!(repo.read(&b), unrelated);
}
