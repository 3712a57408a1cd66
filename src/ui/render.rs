//! Turns one virtual row into one ANSI-styled terminal line.
//!
//! Output never exceeds the requested width. Content is cut silently, headers
//! get an ellipsis. Side-by-side rows are padded so the divider always sits
//! in the same column.

use crate::domain::{DiffFile, DiffLine, LineKind, PairKind};
use crate::worddiff::{Segment, SegmentKind};

use ratatui::style::Style;

use super::ansi::{AnsiLine, DigitBuf};
use super::styles::{CellKind, CellStyle, StyleTable};
use super::theme::Palette;

/// Cells for one line number.
const NUM_WIDTH: usize = 4;

const DIVIDER: &str = "│";

/// One line of content together with its word-diff segments, if any.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub line: &'a DiffLine,
    pub segments: Option<&'a [Segment]>,
}

impl<'a> Cell<'a> {
    pub fn plain(line: &'a DiffLine) -> Self {
        Self {
            line,
            segments: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum UnifiedRow<'a> {
    FileHeader(&'a DiffFile),
    Separator,
    Line(Cell<'a>),
}

#[derive(Debug, Clone, Copy)]
pub enum SplitRow<'a> {
    FileHeader(&'a DiffFile),
    Separator,
    Pair {
        kind: PairKind,
        left: Option<Cell<'a>>,
        right: Option<Cell<'a>>,
    },
}

#[derive(Debug, Clone)]
pub struct LineRenderer {
    styles: StyleTable,
}

impl LineRenderer {
    pub fn new(palette: &Palette) -> Self {
        Self {
            styles: StyleTable::new(palette),
        }
    }

    pub fn set_palette(&mut self, palette: &Palette) {
        self.styles = StyleTable::new(palette);
    }

    pub fn render_unified(&self, row: UnifiedRow<'_>, width: u16) -> String {
        let width = usize::from(width);
        if width == 0 {
            return String::new();
        }
        match row {
            UnifiedRow::FileHeader(file) => self.file_header(file, width),
            UnifiedRow::Separator => String::new(),
            UnifiedRow::Line(cell) if cell.line.kind == LineKind::HunkHeader => {
                self.hunk_header(&cell.line.content, width)
            }
            UnifiedRow::Line(cell) => self.unified_line(cell, width),
        }
    }

    pub fn render_side_by_side(&self, row: SplitRow<'_>, width: u16) -> String {
        let width = usize::from(width);
        if width == 0 {
            return String::new();
        }
        match row {
            SplitRow::FileHeader(file) => self.file_header(file, width),
            SplitRow::Separator => String::new(),
            SplitRow::Pair {
                kind: PairKind::HunkHeader,
                left,
                ..
            } => {
                let text = left.map_or("", |c| c.line.content.as_str());
                self.hunk_header(text, width)
            }
            SplitRow::Pair { kind, left, right } => self.split_line(kind, left, right, width),
        }
    }

    fn file_header(&self, file: &DiffFile, width: usize) -> String {
        let s = &self.styles;
        let mut out = AnsiLine::with_capacity(width + 64);

        let mut fits = out.push_ellipsized(" ", s.file_path, width);
        if let Some(old) = file.renamed_from() {
            fits = fits
                && out.push_ellipsized(old, s.file_path, width)
                && out.push_ellipsized(" → ", s.file_path, width)
                && out.push_ellipsized(&file.new_path, s.file_path, width);
        } else {
            fits = fits && out.push_ellipsized(file.file_hash(), s.file_path, width);
        }

        if file.is_binary {
            fits = fits && out.push_ellipsized(" binary", s.file_note, width);
        } else {
            fits = fits && push_count(&mut out, " +", file.additions, "", s.stat_addition, width);
            fits = fits && push_count(&mut out, " -", file.deletions, "", s.stat_deletion, width);
        }

        let status = if file.is_untracked {
            Some(" (untracked)")
        } else if file.is_new {
            Some(" (new)")
        } else if file.is_deleted {
            Some(" (deleted)")
        } else {
            None
        };
        if let Some(note) = status {
            fits = fits && out.push_ellipsized(note, s.file_note, width);
        }
        if fits && file.is_renamed && file.similarity > 0 {
            push_count(&mut out, " ", usize::from(file.similarity), "%", s.file_note, width);
        }

        out.pad_to(width, s.file_header);
        out.finish()
    }

    fn hunk_header(&self, text: &str, width: usize) -> String {
        let style = self.styles.hunk_header;
        let mut out = AnsiLine::with_capacity(width + 32);
        out.push_ellipsized(text, style, width);
        out.pad_to(width, style);
        out.finish()
    }

    fn unified_line(&self, cell: Cell<'_>, width: usize) -> String {
        let kind = match cell.line.kind {
            LineKind::Addition => CellKind::Addition,
            LineKind::Deletion => CellKind::Deletion,
            _ => CellKind::Context,
        };
        let style = self.styles.cell(kind);
        let mut out = AnsiLine::with_capacity(width + 64);

        out.push_number(cell.line.old_line_num, NUM_WIDTH, style.gutter, width);
        out.push_clipped(" ", style.gutter, width);
        out.push_number(cell.line.new_line_num, NUM_WIDTH, style.gutter, width);
        out.push_clipped(" ", style.gutter, width);

        write_content(&mut out, cell, style, width);
        if let Some(fill) = style.fill {
            out.pad_to(width, fill);
        }
        out.finish()
    }

    fn split_line(
        &self,
        kind: PairKind,
        left: Option<Cell<'_>>,
        right: Option<Cell<'_>>,
        width: usize,
    ) -> String {
        let column = width.saturating_sub(1) / 2;
        let (left_kind, right_kind) = match kind {
            PairKind::Context => (CellKind::Context, CellKind::Context),
            PairKind::Modification => (CellKind::Deletion, CellKind::Addition),
            PairKind::Deletion => (CellKind::Deletion, CellKind::Empty),
            PairKind::Addition => (CellKind::Empty, CellKind::Addition),
            PairKind::HunkHeader => (CellKind::Context, CellKind::Empty),
        };

        let mut out = AnsiLine::with_capacity(width * 2 + 64);
        self.split_cell(&mut out, left, left_kind, true, column);
        out.push_clipped(DIVIDER, self.styles.divider, width);
        self.split_cell(&mut out, right, right_kind, false, 2 * column + 1);
        out.finish()
    }

    fn split_cell(&self, out: &mut AnsiLine, cell: Option<Cell<'_>>, kind: CellKind, old_side: bool, end: usize) {
        let style = self.styles.cell(kind);
        let cell = match (kind, cell) {
            (CellKind::Empty, _) | (_, None) => None,
            (_, Some(cell)) => Some(cell),
        };

        match cell {
            Some(cell) => {
                let num = if old_side {
                    cell.line.old_line_num
                } else {
                    cell.line.new_line_num
                };
                out.push_number(num, NUM_WIDTH, style.gutter, end);
                out.push_clipped(" ", style.gutter, end);
                write_content(out, cell, style, end);
                out.pad_to(end, style.fill.unwrap_or(style.text));
            }
            None => out.pad_to(end, self.styles.cell(CellKind::Empty).text),
        }
    }
}

/// `prefix`, the digits of `n`, then `suffix`, ellipsized at `limit`.
fn push_count(out: &mut AnsiLine, prefix: &str, n: usize, suffix: &str, style: Style, limit: usize) -> bool {
    let mut digits = DigitBuf::default();
    out.push_ellipsized(prefix, style, limit)
        && out.push_ellipsized(digits.format(n as u64), style, limit)
        && out.push_ellipsized(suffix, style, limit)
}

/// Prefix character then the content, cut at `limit`.
fn write_content(out: &mut AnsiLine, cell: Cell<'_>, style: &CellStyle, limit: usize) {
    let mut prefix = [0u8; 4];
    if !out.push_clipped(cell.line.prefix().encode_utf8(&mut prefix), style.prefix, limit) {
        return;
    }

    let content = cell.line.content.as_str();
    let segments = cell
        .segments
        .filter(|segs| segs.iter().all(|s| content.get(s.range.clone()).is_some()));

    match segments {
        Some(segments) if !segments.is_empty() => {
            for seg in segments {
                let text = &content[seg.range.clone()];
                let seg_style = match seg.kind {
                    SegmentKind::Unchanged => style.text,
                    SegmentKind::Added | SegmentKind::Deleted => style.emphasis,
                };
                if !out.push_clipped(text, seg_style, limit) {
                    return;
                }
            }
        }
        _ => {
            out.push_clipped(content, style.text, limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiffHunk, LineKind};
    use crate::ui::ansi::{display_width, plain};
    use crate::ui::theme::{resolve, DEFAULT_THEME};
    use pretty_assertions::assert_eq;

    fn renderer() -> LineRenderer {
        LineRenderer::new(&resolve(DEFAULT_THEME).palette)
    }

    fn hunk() -> DiffHunk {
        DiffHunk::from_body(
            10,
            10,
            &[
                (LineKind::Context, "fn main() {"),
                (LineKind::Deletion, "    old();"),
                (LineKind::Addition, "    new();"),
            ],
        )
    }

    #[test]
    fn unified_context_line_has_both_numbers() {
        let h = hunk();
        let out = renderer().render_unified(UnifiedRow::Line(Cell::plain(&h.lines[1])), 80);
        assert_eq!(plain(&out), "  10   10  fn main() {");
    }

    #[test]
    fn unified_changed_lines_fill_the_width() {
        let h = hunk();
        let r = renderer();
        let del = plain(&r.render_unified(UnifiedRow::Line(Cell::plain(&h.lines[2])), 40));
        let add = plain(&r.render_unified(UnifiedRow::Line(Cell::plain(&h.lines[3])), 40));

        assert!(del.starts_with("  11      -    old();"), "{del:?}");
        assert!(add.starts_with("       11 +    new();"), "{add:?}");
        assert_eq!(display_width(&del), 40);
        assert_eq!(display_width(&add), 40);
    }

    #[test]
    fn long_content_is_cut_without_ellipsis() {
        let line = DiffLine::context(1, 1, "x".repeat(200));
        let out = plain(&renderer().render_unified(UnifiedRow::Line(Cell::plain(&line)), 30));
        assert_eq!(display_width(&out), 30);
        assert!(!out.contains('…'));
    }

    #[test]
    fn hunk_header_is_ellipsized() {
        let line = DiffLine::hunk_header("@@ -1,200 +1,200 @@ fn a_rather_long_function_name()");
        let out = plain(&renderer().render_unified(UnifiedRow::Line(Cell::plain(&line)), 20));
        assert_eq!(display_width(&out), 20);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn file_header_shows_path_and_stats() {
        let file = DiffFile::modified("src/lib.rs", vec![hunk()]);
        let out = plain(&renderer().render_unified(UnifiedRow::FileHeader(&file), 60));
        assert!(out.starts_with(" src/lib.rs +1 -1"), "{out:?}");
        assert_eq!(display_width(&out), 60);

        let binary = DiffFile::binary("logo.png");
        let out = plain(&renderer().render_unified(UnifiedRow::FileHeader(&binary), 60));
        assert!(out.starts_with(" logo.png binary"), "{out:?}");
    }

    #[test]
    fn file_header_renders_counts_and_rename() {
        let mut file = DiffFile::modified("new.rs", Vec::new());
        file.old_path = "old.rs".to_string();
        file.is_renamed = true;
        file.similarity = 100;
        file.additions = 12345;
        let out = plain(&renderer().render_unified(UnifiedRow::FileHeader(&file), 60));
        assert!(out.starts_with(" old.rs → new.rs +12345 -0 100%"), "{out:?}");

        let out = plain(&renderer().render_unified(UnifiedRow::FileHeader(&file), 20));
        assert_eq!(display_width(&out), 20);
        assert!(out.ends_with('…'), "{out:?}");
    }

    #[test]
    fn separator_and_zero_width_render_empty() {
        let r = renderer();
        assert_eq!(r.render_unified(UnifiedRow::Separator, 80), "");
        let h = hunk();
        assert_eq!(r.render_unified(UnifiedRow::Line(Cell::plain(&h.lines[1])), 0), "");
    }

    #[test]
    fn split_modification_keeps_divider_column() {
        let h = hunk();
        let r = renderer();
        for width in [21u16, 40, 81] {
            let out = plain(&r.render_side_by_side(
                SplitRow::Pair {
                    kind: PairKind::Modification,
                    left: Some(Cell::plain(&h.lines[2])),
                    right: Some(Cell::plain(&h.lines[3])),
                },
                width,
            ));
            let column = (usize::from(width) - 1) / 2;
            let divider_at = out.chars().position(|c| c == '│').unwrap();
            assert_eq!(divider_at, column, "width {width}: {out:?}");
            assert_eq!(display_width(&out), 2 * column + 1);
        }
    }

    #[test]
    fn split_one_sided_rows_leave_the_other_side_blank() {
        let h = hunk();
        let out = plain(&renderer().render_side_by_side(
            SplitRow::Pair {
                kind: PairKind::Addition,
                left: None,
                right: Some(Cell::plain(&h.lines[3])),
            },
            41,
        ));
        let (left, right) = out.split_once('│').unwrap();
        assert_eq!(left, " ".repeat(20));
        assert!(right.starts_with("  11 +    new();"), "{right:?}");
    }

    #[test]
    fn word_segments_keep_the_text_intact() {
        let h = hunk();
        let segments = vec![
            Segment {
                range: 0..4,
                kind: SegmentKind::Unchanged,
            },
            Segment {
                range: 4..10,
                kind: SegmentKind::Added,
            },
        ];
        let r = renderer();
        let with = r.render_unified(
            UnifiedRow::Line(Cell {
                line: &h.lines[3],
                segments: Some(&segments),
            }),
            40,
        );
        let without = r.render_unified(UnifiedRow::Line(Cell::plain(&h.lines[3])), 40);
        assert_ne!(with, without);
        assert_eq!(plain(&with), plain(&without));
    }

    #[test]
    fn out_of_range_segments_fall_back_to_plain() {
        let h = hunk();
        let segments = vec![Segment {
            range: 0..500,
            kind: SegmentKind::Added,
        }];
        let r = renderer();
        let with = r.render_unified(
            UnifiedRow::Line(Cell {
                line: &h.lines[3],
                segments: Some(&segments),
            }),
            40,
        );
        let without = r.render_unified(UnifiedRow::Line(Cell::plain(&h.lines[3])), 40);
        assert_eq!(with, without);
    }
}
