//! Rewriting conflict blocks with recorded resolutions.
//!
//! [`apply_resolution`] splices a replacement into a line range; every other
//! line is untouched. Because a resolution may have a different length than
//! the block it replaces, callers patching several conflicts in one buffer
//! must apply them bottom-to-top (see [`apply_all`]) so earlier blocks' line
//! numbers stay valid — stale absolute line numbers are never used after a
//! splice.

use crate::model::SourceBuffer;

/// Replace lines `start_line..=end_line` (1-based, inclusive) of `buffer`
/// with `resolution`, verbatim.
///
/// The range is clamped to the buffer, so a block at the very end of a file
/// splices cleanly.
#[must_use]
pub fn apply_resolution(
    buffer: &SourceBuffer,
    start_line: usize,
    end_line: usize,
    resolution: &[String],
) -> SourceBuffer {
    let lines = buffer.lines();
    let start = start_line.saturating_sub(1).min(lines.len());
    let end = end_line.min(lines.len()).max(start);

    let mut patched = Vec::with_capacity(lines.len() - (end - start) + resolution.len());
    patched.extend_from_slice(&lines[..start]);
    patched.extend_from_slice(resolution);
    patched.extend_from_slice(&lines[end..]);

    SourceBuffer::from_lines(patched, buffer.has_trailing_newline())
}

/// Apply several resolutions to one buffer.
///
/// `patches` pairs a `(start_line, end_line)` block with its replacement
/// text; line numbers refer to the *original* buffer. Patches are applied in
/// descending start-line order so each splice leaves the line numbers of the
/// blocks above it untouched.
#[must_use]
pub fn apply_all(buffer: &SourceBuffer, patches: &[((usize, usize), Vec<String>)]) -> SourceBuffer {
    let mut ordered: Vec<&((usize, usize), Vec<String>)> = patches.iter().collect();
    ordered.sort_by_key(|((start, _), _)| std::cmp::Reverse(*start));

    let mut result = buffer.clone();
    for ((start, end), resolution) in ordered {
        result = apply_resolution(&result, *start, *end, resolution);
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_conflicts;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn replaces_exactly_the_block() {
        let buf = SourceBuffer::from_text("keep1\nold1\nold2\nkeep2\n");
        let out = apply_resolution(&buf, 2, 3, &lines(&["new"]));
        assert_eq!(out.to_text(), "keep1\nnew\nkeep2\n");
    }

    #[test]
    fn longer_resolution_grows_the_buffer() {
        let buf = SourceBuffer::from_text("a\nX\nb\n");
        let out = apply_resolution(&buf, 2, 2, &lines(&["one", "two", "three"]));
        assert_eq!(out.to_text(), "a\none\ntwo\nthree\nb\n");
    }

    #[test]
    fn empty_resolution_deletes_the_block() {
        let buf = SourceBuffer::from_text("a\nX\nY\nb\n");
        let out = apply_resolution(&buf, 2, 3, &[]);
        assert_eq!(out.to_text(), "a\nb\n");
    }

    #[test]
    fn block_at_end_of_file() {
        let buf = SourceBuffer::from_text("a\nX\nY\n");
        let out = apply_resolution(&buf, 2, 3, &lines(&["z"]));
        assert_eq!(out.to_text(), "a\nz\n");
    }

    #[test]
    fn missing_trailing_newline_is_preserved() {
        let buf = SourceBuffer::from_text("a\nX\nb");
        let out = apply_resolution(&buf, 2, 2, &lines(&["y"]));
        assert_eq!(out.to_text(), "a\ny\nb");
    }

    #[test]
    fn second_conflict_found_at_shifted_position_after_first_patch() {
        // A multi-line resolution of a different length than the first block,
        // followed by a second conflict further down: re-parsing the patched
        // buffer must find the second conflict at its shifted location.
        let text = "\
top
<<<<<<< a
one
=======
two
>>>>>>> b
middle
<<<<<<< a
three
=======
four
>>>>>>> b
bottom
";
        let buf = SourceBuffer::from_text(text);
        let (conflicts, _) = parse_conflicts(buf.lines(), 1);
        assert_eq!(conflicts.len(), 2);

        let first = &conflicts[0].block;
        let resolution = lines(&["r1", "r2", "r3"]);
        let patched = apply_resolution(&buf, first.start_line, first.end_line, &resolution);

        let (remaining, _) = parse_conflicts(patched.lines(), 1);
        assert_eq!(remaining.len(), 1);
        // first block spanned 5 lines, replaced by 3 → shift of -2
        assert_eq!(remaining[0].block.start_line, conflicts[1].block.start_line - 2);
        assert_eq!(remaining[0].block.ours, ["three"]);
    }

    #[test]
    fn apply_all_handles_original_line_numbers() {
        let buf = SourceBuffer::from_text("a\nX\nb\nY\nc\n");
        let out = apply_all(
            &buf,
            &[
                ((2, 2), lines(&["x1", "x2"])),
                ((4, 4), lines(&["y1"])),
            ],
        );
        assert_eq!(out.to_text(), "a\nx1\nx2\nb\ny1\nc\n");
    }

    #[test]
    fn apply_all_order_independence() {
        let buf = SourceBuffer::from_text("a\nX\nb\nY\nc\n");
        let forward = apply_all(
            &buf,
            &[((2, 2), lines(&["p"])), ((4, 4), lines(&["q", "r"]))],
        );
        let backward = apply_all(
            &buf,
            &[((4, 4), lines(&["q", "r"])), ((2, 2), lines(&["p"]))],
        );
        assert_eq!(forward, backward);
    }
}
