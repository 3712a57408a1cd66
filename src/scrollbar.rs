//! Vertical scrollbar geometry and drawing.

use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::Paragraph,
    Frame,
};

const THUMB: &str = "█";
const TRACK: &str = "│";

/// Thumb position within a track of `height` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbBounds {
    pub start: usize,
    pub len: usize,
}

/// `None` when everything fits and no scrollbar is needed.
///
/// The thumb is proportional to the visible share (at least one cell) and
/// touches the bottom of the track exactly when the view is scrolled to the
/// end.
pub fn thumb_bounds(total: usize, height: usize, offset: usize) -> Option<ThumbBounds> {
    if height == 0 || total <= height {
        return None;
    }
    let len = (height * height / total).clamp(1, height);
    let max_offset = total - height;
    let track = height - len;
    let start = offset.min(max_offset) * track / max_offset;
    Some(ThumbBounds { start, len })
}

/// Draw a one-column scrollbar into `area`.
pub fn render(frame: &mut Frame, area: Rect, total: usize, offset: usize, thumb: Style, track: Style) {
    let height = usize::from(area.height);
    let Some(bounds) = thumb_bounds(total, height, offset) else {
        return;
    };
    let lines: Vec<Line> = (0..height)
        .map(|row| {
            if (bounds.start..bounds.start + bounds.len).contains(&row) {
                Line::styled(THUMB, thumb)
            } else {
                Line::styled(TRACK, track)
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fits_without_scrollbar() {
        assert_eq!(thumb_bounds(10, 30, 0), None);
        assert_eq!(thumb_bounds(30, 30, 0), None);
        assert_eq!(thumb_bounds(100, 0, 0), None);
    }

    #[test]
    fn thumb_reaches_bottom_at_end() {
        assert_eq!(thumb_bounds(100, 30, 70), Some(ThumbBounds { start: 21, len: 9 }));
        assert_eq!(thumb_bounds(100, 30, 0), Some(ThumbBounds { start: 0, len: 9 }));
    }

    #[test]
    fn thumb_never_shrinks_below_one_cell() {
        let b = thumb_bounds(1_000_000, 20, 500_000).unwrap();
        assert_eq!(b.len, 1);
        assert!(b.start + b.len <= 20);
    }

    #[test]
    fn offset_past_end_is_clamped() {
        assert_eq!(thumb_bounds(100, 30, 500), thumb_bounds(100, 30, 70));
    }
}
