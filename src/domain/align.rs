//! Side-by-side line alignment.
//!
//! A hunk is turned into rows of (left, right) pairs. Pairs hold hunk-relative
//! indices into [`DiffHunk::lines`], never copies of the content, so a pair is
//! only meaningful together with the hunk it was produced from.

use super::types::{DiffHunk, DiffLine, LineKind};

/// One side-by-side row. Indices point into the owning hunk's `lines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignedPair {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// Shape of an aligned pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairKind {
    HunkHeader,
    Context,
    Modification,
    Deletion,
    Addition,
}

impl AlignedPair {
    fn left_only(index: usize) -> Self {
        Self {
            left: Some(index),
            right: None,
        }
    }

    fn right_only(index: usize) -> Self {
        Self {
            left: None,
            right: Some(index),
        }
    }

    fn both(left: usize, right: usize) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    /// Resolve the indices against the hunk the pair came from.
    pub fn resolve<'a>(&self, hunk: &'a DiffHunk) -> (Option<&'a DiffLine>, Option<&'a DiffLine>) {
        (
            self.left.and_then(|i| hunk.lines.get(i)),
            self.right.and_then(|i| hunk.lines.get(i)),
        )
    }

    /// Classify the pair. Returns `None` if the indices do not match `hunk`.
    pub fn kind(&self, hunk: &DiffHunk) -> Option<PairKind> {
        match self.resolve(hunk) {
            (Some(l), None) if l.kind == LineKind::HunkHeader => Some(PairKind::HunkHeader),
            (Some(l), None) if l.kind == LineKind::Deletion => Some(PairKind::Deletion),
            (None, Some(r)) if r.kind == LineKind::Addition => Some(PairKind::Addition),
            (Some(l), Some(r)) if l.kind == LineKind::Context && self.left == self.right => {
                debug_assert_eq!(r.kind, LineKind::Context);
                Some(PairKind::Context)
            }
            (Some(l), Some(r)) if l.kind == LineKind::Deletion && r.kind == LineKind::Addition => {
                Some(PairKind::Modification)
            }
            _ => None,
        }
    }
}

/// Align one hunk for side-by-side display.
///
/// Deletion runs are paired index-for-index with the addition run that
/// immediately follows them; leftovers on either side get a blank partner.
/// Additions that do not directly follow deletions stay unpaired.
pub fn align(hunk: &DiffHunk) -> Vec<AlignedPair> {
    let lines = &hunk.lines;
    let mut pairs = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        match lines[i].kind {
            LineKind::HunkHeader => {
                pairs.push(AlignedPair::left_only(i));
                i += 1;
            }
            LineKind::Context => {
                pairs.push(AlignedPair::both(i, i));
                i += 1;
            }
            LineKind::Addition => {
                pairs.push(AlignedPair::right_only(i));
                i += 1;
            }
            LineKind::Deletion => {
                let del_start = i;
                let del_end = run_end(lines, del_start, LineKind::Deletion);
                let add_end = run_end(lines, del_end, LineKind::Addition);

                let deletions = del_end - del_start;
                let additions = add_end - del_end;
                let paired = deletions.min(additions);

                for k in 0..paired {
                    pairs.push(AlignedPair::both(del_start + k, del_end + k));
                }
                for k in del_start + paired..del_end {
                    pairs.push(AlignedPair::left_only(k));
                }
                for k in del_end + paired..add_end {
                    pairs.push(AlignedPair::right_only(k));
                }

                i = add_end;
            }
        }
    }

    pairs
}

/// First index at or after `start` whose kind is not `kind`.
fn run_end(lines: &[DiffLine], start: usize, kind: LineKind) -> usize {
    lines[start..]
        .iter()
        .position(|l| l.kind != kind)
        .map_or(lines.len(), |offset| start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::domain::types::LineKind::{Addition as A, Context as C, Deletion as D};

    fn kinds(hunk: &DiffHunk) -> Vec<PairKind> {
        align(hunk)
            .iter()
            .map(|p| p.kind(hunk).expect("well-formed pair"))
            .collect()
    }

    fn contents(hunk: &DiffHunk) -> Vec<(Option<&str>, Option<&str>)> {
        align(hunk)
            .iter()
            .map(|p| {
                let (l, r) = p.resolve(hunk);
                (l.map(|l| l.content.as_str()), r.map(|r| r.content.as_str()))
            })
            .collect()
    }

    #[test]
    fn modification_collapses_into_one_row() {
        let hunk = DiffHunk::from_body(1, 1, &[(C, "a"), (D, "old"), (A, "new"), (C, "b")]);
        let header = hunk.header.clone();

        assert_eq!(
            contents(&hunk),
            vec![
                (Some(header.as_str()), None),
                (Some("a"), Some("a")),
                (Some("old"), Some("new")),
                (Some("b"), Some("b")),
            ]
        );
        assert_eq!(
            kinds(&hunk),
            vec![
                PairKind::HunkHeader,
                PairKind::Context,
                PairKind::Modification,
                PairKind::Context
            ]
        );
    }

    #[test]
    fn equal_runs_pair_completely() {
        let hunk = DiffHunk::from_body(1, 1, &[(D, "1"), (D, "2"), (D, "3"), (A, "x"), (A, "y"), (A, "z")]);
        let kinds = kinds(&hunk);
        assert_eq!(kinds.iter().filter(|k| **k == PairKind::Modification).count(), 3);
        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn longer_deletion_run_leaves_left_only_rows() {
        let hunk = DiffHunk::from_body(1, 1, &[(D, "1"), (D, "2"), (D, "3"), (A, "x")]);
        assert_eq!(
            contents(&hunk)[1..].to_vec(),
            vec![(Some("1"), Some("x")), (Some("2"), None), (Some("3"), None)]
        );
    }

    #[test]
    fn longer_addition_run_leaves_right_only_rows() {
        let hunk = DiffHunk::from_body(1, 1, &[(D, "1"), (A, "x"), (A, "y"), (A, "z")]);
        assert_eq!(
            contents(&hunk)[1..].to_vec(),
            vec![(Some("1"), Some("x")), (None, Some("y")), (None, Some("z"))]
        );
    }

    #[test]
    fn addition_before_deletion_is_not_paired() {
        let hunk = DiffHunk::from_body(1, 1, &[(A, "x"), (D, "1")]);
        assert_eq!(
            kinds(&hunk)[1..].to_vec(),
            vec![PairKind::Addition, PairKind::Deletion]
        );
    }

    #[test]
    fn context_between_runs_prevents_pairing() {
        let hunk = DiffHunk::from_body(1, 1, &[(D, "1"), (C, "c"), (A, "x")]);
        assert_eq!(
            kinds(&hunk)[1..].to_vec(),
            vec![PairKind::Deletion, PairKind::Context, PairKind::Addition]
        );
    }

    #[test]
    fn empty_hunk_aligns_to_nothing() {
        let hunk = DiffHunk::new(0, 0, "", Vec::new());
        assert!(align(&hunk).is_empty());
    }

    #[test]
    fn every_line_is_covered_exactly_once() {
        let hunk = DiffHunk::from_body(
            1,
            1,
            &[
                (A, "a0"),
                (C, "c0"),
                (D, "d0"),
                (D, "d1"),
                (A, "a1"),
                (C, "c1"),
                (D, "d2"),
                (A, "a2"),
                (A, "a3"),
                (A, "a4"),
                (D, "d3"),
            ],
        );

        let mut seen = vec![0usize; hunk.lines.len()];
        for pair in align(&hunk) {
            match (pair.left, pair.right) {
                (Some(l), Some(r)) if l == r => seen[l] += 1,
                (l, r) => {
                    if let Some(l) = l {
                        seen[l] += 1;
                    }
                    if let Some(r) = r {
                        seen[r] += 1;
                    }
                }
            }
        }
        assert!(seen.iter().all(|&n| n == 1), "coverage: {seen:?}");
    }

    #[test]
    fn pairs_preserve_line_order() {
        let hunk = DiffHunk::from_body(1, 1, &[(D, "1"), (D, "2"), (A, "x"), (C, "c"), (A, "y")]);
        let lefts: Vec<usize> = align(&hunk).iter().filter_map(|p| p.left).collect();
        let rights: Vec<usize> = align(&hunk).iter().filter_map(|p| p.right).collect();
        assert!(lefts.windows(2).all(|w| w[0] <= w[1]));
        assert!(rights.windows(2).all(|w| w[0] <= w[1]));
    }
}
