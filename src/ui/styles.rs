//! Styles derived from the active palette.
//!
//! Built once per theme change and owned by the line renderer, so rendering a
//! line never touches the theme registry.

use ratatui::style::{Modifier, Style};

use super::theme::Palette;

/// What a single cell of diff content represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Context,
    Addition,
    Deletion,
    /// The missing side of a side-by-side row.
    Empty,
}

/// Styles for one cell kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub gutter: Style,
    pub prefix: Style,
    pub text: Style,
    /// Changed words inside a modified line.
    pub emphasis: Style,
    /// Fill after the content, `None` to leave the row unpadded.
    pub fill: Option<Style>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTable {
    context: CellStyle,
    addition: CellStyle,
    deletion: CellStyle,
    empty: CellStyle,
    pub file_header: Style,
    pub file_path: Style,
    pub file_note: Style,
    pub stat_addition: Style,
    pub stat_deletion: Style,
    pub hunk_header: Style,
    pub divider: Style,
}

impl StyleTable {
    pub fn new(p: &Palette) -> Self {
        let context = CellStyle {
            gutter: Style::default().fg(p.fg_line_num),
            prefix: Style::default().fg(p.fg_muted),
            text: Style::default().fg(p.fg_default),
            emphasis: Style::default().fg(p.fg_default),
            fill: None,
        };

        let addition = CellStyle {
            gutter: Style::default().fg(p.fg_line_num).bg(p.bg_addition_margin),
            prefix: Style::default().fg(p.fg_addition).bg(p.bg_addition_line),
            text: Style::default().fg(p.fg_default).bg(p.bg_addition_line),
            emphasis: Style::default()
                .fg(p.fg_default)
                .bg(p.bg_addition_word)
                .add_modifier(Modifier::BOLD),
            fill: Some(Style::default().bg(p.bg_addition_line)),
        };

        let deletion = CellStyle {
            gutter: Style::default().fg(p.fg_line_num).bg(p.bg_deletion_margin),
            prefix: Style::default().fg(p.fg_deletion).bg(p.bg_deletion_line),
            text: Style::default().fg(p.fg_default).bg(p.bg_deletion_line),
            emphasis: Style::default()
                .fg(p.fg_default)
                .bg(p.bg_deletion_word)
                .add_modifier(Modifier::BOLD),
            fill: Some(Style::default().bg(p.bg_deletion_line)),
        };

        let empty_style = Style::default().bg(p.bg_empty);
        let empty = CellStyle {
            gutter: empty_style,
            prefix: empty_style,
            text: empty_style,
            emphasis: empty_style,
            fill: Some(empty_style),
        };

        Self {
            context,
            addition,
            deletion,
            empty,
            file_header: Style::default().bg(p.bg_file_header),
            file_path: Style::default()
                .fg(p.fg_path)
                .bg(p.bg_file_header)
                .add_modifier(Modifier::BOLD),
            file_note: Style::default().fg(p.fg_muted).bg(p.bg_file_header),
            stat_addition: Style::default().fg(p.fg_addition).bg(p.bg_file_header),
            stat_deletion: Style::default().fg(p.fg_deletion).bg(p.bg_file_header),
            hunk_header: Style::default().fg(p.fg_hunk).bg(p.bg_hunk_header),
            divider: Style::default().fg(p.fg_border),
        }
    }

    pub fn cell(&self, kind: CellKind) -> &CellStyle {
        match kind {
            CellKind::Context => &self.context,
            CellKind::Addition => &self.addition,
            CellKind::Deletion => &self.deletion,
            CellKind::Empty => &self.empty,
        }
    }
}
