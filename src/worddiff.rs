//! Word-level highlighting for modified lines.
//!
//! Runs over the side-by-side alignment: only deletion/addition pairs get
//! segments. The whole pass shares one deadline; when it runs out the result
//! is marked incomplete and the remaining lines render without emphasis.

use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

use similar::{Algorithm, ChangeTag, TextDiff};

use crate::domain::{align, DiffFile, PairKind};

/// Lines longer than this (in bytes) are not word-diffed.
pub const MAX_LINE_BYTES: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Unchanged,
    Added,
    Deleted,
}

/// A byte range of a line's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub range: Range<usize>,
    pub kind: SegmentKind,
}

/// (file index, hunk index, line index within the hunk)
type LineId = (usize, usize, usize);

#[derive(Debug, Default, Clone)]
pub struct WordDiff {
    segments: HashMap<LineId, Vec<Segment>>,
    complete: bool,
}

impl WordDiff {
    pub fn segments(&self, file: usize, hunk: usize, line: usize) -> Option<&[Segment]> {
        self.segments.get(&(file, hunk, line)).map(Vec::as_slice)
    }

    /// `false` if the deadline cut the pass short.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of lines with segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Compute segments for every modified pair in `files`.
pub fn enrich(files: &[DiffFile], deadline: Instant) -> WordDiff {
    let mut out = WordDiff {
        segments: HashMap::new(),
        complete: true,
    };

    'files: for (fi, file) in files.iter().enumerate() {
        for (hi, hunk) in file.hunks.iter().enumerate() {
            if Instant::now() >= deadline {
                out.complete = false;
                break 'files;
            }
            for pair in align(hunk) {
                if pair.kind(hunk) != Some(PairKind::Modification) {
                    continue;
                }
                if Instant::now() >= deadline {
                    out.complete = false;
                    break 'files;
                }
                let (Some(li), Some(ri)) = (pair.left, pair.right) else {
                    continue;
                };
                let (old, new) = (&hunk.lines[li].content, &hunk.lines[ri].content);
                if old.len() > MAX_LINE_BYTES || new.len() > MAX_LINE_BYTES {
                    continue;
                }
                let (old_segs, new_segs) = diff_words(old, new, deadline);
                out.segments.insert((fi, hi, li), old_segs);
                out.segments.insert((fi, hi, ri), new_segs);
            }
        }
    }

    if !out.complete {
        tracing::debug!(lines = out.segments.len(), "word diff stopped at deadline");
    }
    out
}

/// Split `old` and `new` into unchanged and changed runs. The segments of
/// each side cover its whole content, in order.
pub fn diff_words(old: &str, new: &str, deadline: Instant) -> (Vec<Segment>, Vec<Segment>) {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .deadline(deadline)
        .diff_words(old, new);

    let mut old_segs = Vec::new();
    let mut new_segs = Vec::new();
    let mut old_pos = 0;
    let mut new_pos = 0;

    for change in diff.iter_all_changes() {
        let len = change.value().len();
        match change.tag() {
            ChangeTag::Equal => {
                push_segment(&mut old_segs, old_pos..old_pos + len, SegmentKind::Unchanged);
                push_segment(&mut new_segs, new_pos..new_pos + len, SegmentKind::Unchanged);
                old_pos += len;
                new_pos += len;
            }
            ChangeTag::Delete => {
                push_segment(&mut old_segs, old_pos..old_pos + len, SegmentKind::Deleted);
                old_pos += len;
            }
            ChangeTag::Insert => {
                push_segment(&mut new_segs, new_pos..new_pos + len, SegmentKind::Added);
                new_pos += len;
            }
        }
    }

    (old_segs, new_segs)
}

fn push_segment(segments: &mut Vec<Segment>, range: Range<usize>, kind: SegmentKind) {
    if range.is_empty() {
        return;
    }
    if let Some(last) = segments.last_mut() {
        if last.kind == kind && last.range.end == range.start {
            last.range.end = range.end;
            return;
        }
    }
    segments.push(Segment { range, kind });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiffHunk, LineKind};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    fn covers(segments: &[Segment], text: &str) -> bool {
        let mut pos = 0;
        for seg in segments {
            if seg.range.start != pos {
                return false;
            }
            pos = seg.range.end;
        }
        pos == text.len()
    }

    #[test]
    fn changed_word_is_isolated() {
        let (old, new) = diff_words("let x = 1;", "let y = 1;", later());

        assert!(covers(&old, "let x = 1;"));
        assert!(covers(&new, "let y = 1;"));
        let deleted: Vec<&str> = old
            .iter()
            .filter(|s| s.kind == SegmentKind::Deleted)
            .map(|s| &"let x = 1;"[s.range.clone()])
            .collect();
        assert_eq!(deleted, vec!["x"]);
        let added: Vec<&str> = new
            .iter()
            .filter(|s| s.kind == SegmentKind::Added)
            .map(|s| &"let y = 1;"[s.range.clone()])
            .collect();
        assert_eq!(added, vec!["y"]);
    }

    #[test]
    fn identical_lines_are_one_unchanged_segment() {
        let (old, new) = diff_words("same text", "same text", later());
        assert_eq!(
            old,
            vec![Segment {
                range: 0..9,
                kind: SegmentKind::Unchanged
            }]
        );
        assert_eq!(old, new);
    }

    #[test]
    fn enrich_only_touches_modified_pairs() {
        let hunk = DiffHunk::from_body(
            1,
            1,
            &[
                (LineKind::Context, "fn main() {"),
                (LineKind::Deletion, "    let a = 1;"),
                (LineKind::Addition, "    let a = 2;"),
                (LineKind::Addition, "    let b = 3;"),
            ],
        );
        let files = vec![DiffFile::modified("main.rs", vec![hunk])];
        let wd = enrich(&files, later());

        assert!(wd.is_complete());
        assert_eq!(wd.len(), 2);
        assert!(wd.segments(0, 0, 2).is_some());
        assert!(wd.segments(0, 0, 3).is_some());
        assert!(wd.segments(0, 0, 1).is_none());
        assert!(wd.segments(0, 0, 4).is_none());
    }

    #[test]
    fn long_lines_are_skipped() {
        let long = "x".repeat(MAX_LINE_BYTES + 1);
        let hunk = DiffHunk::from_body(1, 1, &[(LineKind::Deletion, &long), (LineKind::Addition, "short")]);
        let wd = enrich(&[DiffFile::modified("a", vec![hunk])], later());
        assert!(wd.is_empty());
        assert!(wd.is_complete());
    }

    #[test]
    fn expired_deadline_marks_result_incomplete() {
        let hunk = DiffHunk::from_body(1, 1, &[(LineKind::Deletion, "a"), (LineKind::Addition, "b")]);
        let wd = enrich(&[DiffFile::modified("a", vec![hunk])], Instant::now());
        assert!(!wd.is_complete());
        assert!(wd.is_empty());
    }
}
