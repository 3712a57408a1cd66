//! Frame layout: diff body, scrollbar column, status bar and help overlay.

use crate::keymap::Keymap;
use crate::scrollbar;
use crate::ui::theme::Palette;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
    Frame,
};

pub const SCROLLBAR_WIDTH: u16 = 1;
pub const STATUS_HEIGHT: u16 = 1;

/// Size left for diff rows in a terminal of `width` x `height`.
pub fn body_size(width: u16, height: u16) -> (u16, usize) {
    (
        width.saturating_sub(SCROLLBAR_WIDTH),
        usize::from(height.saturating_sub(STATUS_HEIGHT)),
    )
}

/// What the status bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub source: String,
    pub path: Option<String>,
    pub position: String,
    pub mode: &'static str,
    pub theme: String,
    pub hit_rate: f64,
    /// Transient message, shown instead of the path.
    pub message: Option<String>,
}

pub struct FrameView<'a> {
    pub body: Text<'a>,
    pub total: usize,
    pub offset: usize,
    pub status: &'a StatusInfo,
    pub palette: &'a Palette,
    pub help: Option<&'a Keymap>,
}

pub fn render(frame: &mut Frame, view: FrameView<'_>) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)])
        .split(area);
    let cols = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(SCROLLBAR_WIDTH)])
        .split(rows[0]);

    frame.render_widget(Paragraph::new(view.body), cols[0]);
    scrollbar::render(
        frame,
        cols[1],
        view.total,
        view.offset,
        Style::default().fg(view.palette.fg_muted),
        Style::default().fg(view.palette.fg_border),
    );
    render_status(frame, rows[1], view.status, view.palette);

    if let Some(keymap) = view.help {
        render_help(frame, area, keymap, view.palette);
    }
}

fn render_status(frame: &mut Frame, area: Rect, status: &StatusInfo, p: &Palette) {
    let base = Style::default().fg(p.fg_muted).bg(p.bg_file_header);

    let left = match (&status.message, &status.path) {
        (Some(msg), _) => Span::styled(format!(" {}", msg), base.fg(p.fg_deletion)),
        (None, Some(path)) => Span::styled(
            format!(" {}", path),
            base.fg(p.fg_path).add_modifier(Modifier::BOLD),
        ),
        (None, None) => Span::styled(format!(" {}", status.source), base),
    };
    let right = format!(
        "{}  {}  {}  cache {:.0}% ",
        status.position, status.mode, status.theme, status.hit_rate
    );

    let used = left.width() + right.chars().count();
    let gap = usize::from(area.width).saturating_sub(used).max(1);

    let line = Line::from(vec![
        left,
        Span::styled(" ".repeat(gap), base),
        Span::styled(right, base),
    ]);
    frame.render_widget(Paragraph::new(line).style(base), area);
}

/// Render help overlay using keymap data.
pub fn render_help(frame: &mut Frame, area: Rect, keymap: &Keymap, p: &Palette) {
    let popup_area = centered_rect(50, 70, area);

    frame.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Keyboard Shortcuts",
            Style::default().fg(p.fg_default).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (category, entries) in keymap.help_entries() {
        help_text.push(Line::from(Span::styled(
            format!("  {}", category.display_name()),
            Style::default().fg(p.fg_muted),
        )));
        for entry in entries {
            help_text.push(Line::from(vec![
                Span::styled(
                    format!("    {:<10}", entry.key_display),
                    Style::default().fg(p.fg_addition),
                ),
                Span::styled(entry.description, Style::default().fg(p.fg_default)),
            ]));
        }
        help_text.push(Line::from(""));
    }

    help_text.push(Line::from(Span::styled(
        "  Press ? or Esc to close",
        Style::default().fg(p.fg_muted),
    )));

    let help = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.fg_border))
            .padding(Padding::uniform(1))
            .style(Style::default().bg(p.bg_empty)),
    );

    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
