//! Viewport over virtual content.
//!
//! Owns the scroll offset and terminal size, keeps the offset inside
//! `[0, total - height]`, and renders only the rows on screen after warming
//! the cache for the rows just outside them.

use std::ops::Range;

use crate::content::{ViewMode, VirtualContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    NoContent,
    AtTop,
    Middle,
    AtBottom,
}

#[derive(Debug)]
pub struct DiffViewport {
    content: VirtualContent,
    y_offset: usize,
    width: u16,
    height: usize,
    buffer_lines: usize,
}

impl DiffViewport {
    pub fn new(content: VirtualContent) -> Self {
        let width = content.width();
        let buffer_lines = content.buffer_lines();
        Self {
            content,
            y_offset: 0,
            width,
            height: 0,
            buffer_lines,
        }
    }

    pub fn content(&self) -> &VirtualContent {
        &self.content
    }

    /// Swap in new content, keeping size, mode and theme. The offset is
    /// clamped to the new length.
    pub fn replace_content(&mut self, mut content: VirtualContent) {
        content.set_width(self.width);
        content.set_view_mode(self.content.view_mode());
        content.set_theme(self.content.theme());
        self.buffer_lines = content.buffer_lines();
        self.content = content;
        self.clamp();
    }

    pub fn set_word_diff(&mut self, word_diff: crate::worddiff::WordDiff) {
        self.content.set_word_diff(word_diff);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn total_lines(&self) -> usize {
        self.content.total_lines()
    }

    pub fn max_offset(&self) -> usize {
        self.total_lines().saturating_sub(self.height)
    }

    pub fn set_size(&mut self, width: u16, height: usize) {
        self.width = width;
        self.height = height;
        self.content.set_width(width);
        self.clamp();
    }

    pub fn set_y_offset(&mut self, offset: usize) {
        self.y_offset = offset.min(self.max_offset());
        self.sync_visible();
    }

    /// Relative move; negative results stop at the top.
    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta < 0 {
            self.y_offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.y_offset.saturating_add(delta.unsigned_abs())
        };
        self.set_y_offset(target);
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.set_y_offset(self.y_offset.saturating_sub(n));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.set_y_offset(self.y_offset.saturating_add(n));
    }

    pub fn goto_top(&mut self) {
        self.set_y_offset(0);
    }

    pub fn goto_bottom(&mut self) {
        self.set_y_offset(self.max_offset());
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up(self.height / 2);
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down(self.height / 2);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height);
    }

    /// Scroll the least amount that brings row `index` on screen. Returns
    /// `true` if the offset moved.
    pub fn ensure_visible(&mut self, index: usize) -> bool {
        let total = self.total_lines();
        if total == 0 || self.height == 0 {
            return false;
        }
        let index = index.min(total - 1);
        let before = self.y_offset;
        if index < self.y_offset {
            self.set_y_offset(index);
        } else if index >= self.y_offset + self.height {
            self.set_y_offset(index + 1 - self.height);
        }
        self.y_offset != before
    }

    /// Jump to a fraction of the scrollable range. Out-of-range and NaN
    /// inputs are clamped.
    pub fn scroll_to_percent(&mut self, percent: f64) {
        let p = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 1.0) };
        let target = (self.max_offset() as f64 * p).floor() as usize;
        self.set_y_offset(target);
    }

    /// Position within the scrollable range, `1.0` when everything fits.
    pub fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            1.0
        } else {
            self.y_offset as f64 / max as f64
        }
    }

    pub fn visible_range(&self) -> Range<usize> {
        let total = self.total_lines();
        let start = self.y_offset.min(total);
        let end = self.y_offset.saturating_add(self.height).min(total);
        start..end
    }

    pub fn state(&self) -> ScrollState {
        if self.total_lines() == 0 {
            ScrollState::NoContent
        } else if self.at_top() {
            ScrollState::AtTop
        } else if self.at_bottom() {
            ScrollState::AtBottom
        } else {
            ScrollState::Middle
        }
    }

    pub fn at_top(&self) -> bool {
        self.y_offset == 0
    }

    pub fn at_bottom(&self) -> bool {
        self.y_offset >= self.max_offset()
    }

    /// Switch view mode, keeping the file at the top of the screen in view.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        let file = self.content.file_at(self.y_offset);
        if !self.content.set_view_mode(mode) {
            return false;
        }
        let target = file.and_then(|f| self.content.file_start(f)).unwrap_or(0);
        self.set_y_offset(target);
        true
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        let mode = self.content.view_mode().toggle();
        self.set_view_mode(mode);
        mode
    }

    pub fn set_theme(&mut self, name: &str) -> bool {
        self.content.set_theme(name)
    }

    /// Index of the file under the top row.
    pub fn current_file(&self) -> Option<usize> {
        self.content.file_at(self.y_offset)
    }

    pub fn next_file(&mut self) -> bool {
        let target = self.content.next_file_start(self.y_offset);
        self.jump(target)
    }

    pub fn prev_file(&mut self) -> bool {
        let target = self.content.prev_file_start(self.y_offset);
        self.jump(target)
    }

    pub fn next_hunk(&mut self) -> bool {
        let target = self.content.next_hunk_start(self.y_offset);
        self.jump(target)
    }

    pub fn prev_hunk(&mut self) -> bool {
        let target = self.content.prev_hunk_start(self.y_offset);
        self.jump(target)
    }

    /// Visible rows joined by `\n`, after rendering the buffer zones.
    pub fn render(&mut self) -> String {
        let total = self.total_lines();
        if total == 0 || self.height == 0 || self.width == 0 {
            return String::new();
        }

        let visible = self.visible_range();
        self.content.set_visible_range(visible.clone());

        let above = visible.start.saturating_sub(self.buffer_lines)..visible.start;
        let below = visible.end..visible.end.saturating_add(self.buffer_lines).min(total);
        for index in above.chain(below) {
            self.content.render_line(index);
        }

        let mut out = String::with_capacity(visible.len() * (usize::from(self.width) + 32));
        for (n, index) in visible.enumerate() {
            if n > 0 {
                out.push('\n');
            }
            out.push_str(&self.content.render_line(index));
        }
        out
    }

    fn jump(&mut self, target: Option<usize>) -> bool {
        match target {
            Some(index) => {
                let before = self.y_offset;
                self.set_y_offset(index);
                self.y_offset != before
            }
            None => false,
        }
    }

    fn clamp(&mut self) {
        self.set_y_offset(self.y_offset);
    }

    fn sync_visible(&mut self) {
        let range = self.visible_range();
        self.content.set_visible_range(range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentConfig;
    use crate::domain::{DiffFile, DiffHunk, LineKind};
    use crate::ui::ansi::plain;
    use pretty_assertions::assert_eq;

    /// One file with a single hunk of `n` context lines (`n + 1` rows).
    fn content(n: usize) -> VirtualContent {
        let body: Vec<String> = (0..n).map(|i| format!("line {i}")).collect();
        let body: Vec<(LineKind, &str)> = body.iter().map(|s| (LineKind::Context, s.as_str())).collect();
        VirtualContent::new(vec![DiffFile::modified("big.rs", vec![DiffHunk::from_body(1, 1, &body)])])
    }

    fn viewport(rows: usize, height: usize) -> DiffViewport {
        let mut vp = DiffViewport::new(content(rows - 1));
        vp.set_size(80, height);
        vp
    }

    #[test]
    fn offsets_are_clamped() {
        let mut vp = viewport(100, 30);
        vp.set_y_offset(1000);
        assert_eq!(vp.y_offset(), 70);
        vp.scroll_by(-500);
        assert_eq!(vp.y_offset(), 0);
        vp.scroll_up(3);
        assert_eq!(vp.y_offset(), 0);
        vp.scroll_down(5);
        assert_eq!(vp.y_offset(), 5);
    }

    #[test]
    fn paging_moves_by_height() {
        let mut vp = viewport(100, 30);
        vp.page_down();
        assert_eq!(vp.y_offset(), 30);
        vp.half_page_down();
        assert_eq!(vp.y_offset(), 45);
        vp.half_page_up();
        vp.page_up();
        assert_eq!(vp.y_offset(), 0);
        vp.goto_bottom();
        assert_eq!(vp.y_offset(), 70);
        vp.goto_top();
        assert_eq!(vp.y_offset(), 0);
    }

    #[test]
    fn visible_range_matches_height_and_total() {
        let mut vp = viewport(100, 30);
        for offset in [0, 10, 70] {
            vp.set_y_offset(offset);
            let range = vp.visible_range();
            assert_eq!(range.start, offset);
            assert_eq!(range.len(), 30.min(100 - offset));
        }

        let mut short = viewport(10, 30);
        short.set_y_offset(5);
        assert_eq!(short.y_offset(), 0);
        assert_eq!(short.visible_range(), 0..10);
    }

    #[test]
    fn scroll_states() {
        let mut vp = viewport(100, 30);
        assert_eq!(vp.state(), ScrollState::AtTop);
        vp.scroll_down(1);
        assert_eq!(vp.state(), ScrollState::Middle);
        vp.goto_bottom();
        assert_eq!(vp.state(), ScrollState::AtBottom);

        let empty = DiffViewport::new(VirtualContent::new(Vec::new()));
        assert_eq!(empty.state(), ScrollState::NoContent);
    }

    #[test]
    fn ensure_visible_scrolls_minimally() {
        let mut vp = viewport(100, 30);
        assert!(!vp.ensure_visible(10));
        assert!(vp.ensure_visible(40));
        assert_eq!(vp.y_offset(), 11);
        assert!(vp.ensure_visible(5));
        assert_eq!(vp.y_offset(), 5);
        assert!(vp.ensure_visible(500));
        assert_eq!(vp.y_offset(), 70);
    }

    #[test]
    fn percent_round_trip() {
        let mut vp = viewport(100, 30);
        vp.scroll_to_percent(0.5);
        assert_eq!(vp.y_offset(), 35);
        assert!((vp.scroll_percent() - 0.5).abs() < f64::EPSILON);
        vp.scroll_to_percent(f64::NAN);
        assert_eq!(vp.y_offset(), 0);
        vp.scroll_to_percent(7.0);
        assert_eq!(vp.y_offset(), 70);
        assert_eq!(viewport(10, 30).scroll_percent(), 1.0);
    }

    #[test]
    fn percent_target_is_floored() {
        let mut vp = viewport(101, 30);
        assert_eq!(vp.max_offset(), 71);
        vp.scroll_to_percent(0.5);
        assert_eq!(vp.y_offset(), 35);
        vp.scroll_to_percent(0.999);
        assert_eq!(vp.y_offset(), 70);
        vp.scroll_to_percent(1.0);
        assert_eq!(vp.y_offset(), 71);
    }

    #[test]
    fn render_returns_visible_rows_only() {
        let mut vp = viewport(100, 30);
        vp.set_y_offset(10);
        let out = vp.render();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 30);
        assert_eq!(plain(lines[0]), "  10   10  line 9");
    }

    #[test]
    fn render_warms_buffer_zones() {
        let mut vp = DiffViewport::new(VirtualContent::build(
            vec![DiffFile::modified(
                "big.rs",
                vec![DiffHunk::from_body(
                    1,
                    1,
                    &(0..199).map(|_| (LineKind::Context, "x")).collect::<Vec<_>>(),
                )],
            )],
            ContentConfig {
                buffer_lines: 10,
                ..ContentConfig::default()
            },
        ));
        vp.set_size(80, 20);
        vp.set_y_offset(100);
        vp.render();
        // 10 above + 20 visible + 10 below
        assert_eq!(vp.content().cache().len(), 40);
    }

    #[test]
    fn second_render_is_all_hits() {
        let mut vp = viewport(100, 30);
        let first = vp.render();
        let misses = vp.content().cache_stats().misses;
        let second = vp.render();
        assert_eq!(first, second);
        assert_eq!(vp.content().cache_stats().misses, misses);
    }

    #[test]
    fn degenerate_sizes_render_nothing() {
        let mut vp = viewport(100, 0);
        assert_eq!(vp.render(), "");
        vp.set_size(0, 30);
        assert_eq!(vp.render(), "");
        let mut empty = DiffViewport::new(VirtualContent::new(Vec::new()));
        empty.set_size(80, 30);
        assert_eq!(empty.render(), "");
    }

    #[test]
    fn resize_round_trip_leaves_no_stale_lines() {
        let mut vp = viewport(100, 30);
        vp.render();
        vp.set_size(100, 30);
        assert_eq!(vp.content().cache().len(), 0);
        vp.set_size(80, 30);
        assert_eq!(vp.content().cache().len(), 0);
    }

    #[test]
    fn mode_switch_keeps_current_file_on_top() {
        let files = vec![
            DiffFile::modified(
                "a.rs",
                vec![DiffHunk::from_body(
                    1,
                    1,
                    &[(LineKind::Deletion, "1"), (LineKind::Addition, "2")],
                )],
            ),
            DiffFile::modified("b.rs", vec![DiffHunk::from_body(1, 1, &[(LineKind::Context, "x")])]),
        ];
        let mut vp = DiffViewport::new(VirtualContent::new(files));
        vp.set_size(80, 2);
        assert!(vp.next_file());
        assert_eq!(vp.current_file(), Some(1));

        assert_eq!(vp.toggle_view_mode(), ViewMode::SideBySide);
        assert_eq!(vp.current_file(), Some(1));
        assert_eq!(vp.y_offset(), vp.content().file_start(1).unwrap().min(vp.max_offset()));
    }

    #[test]
    fn replace_content_reclamps() {
        let mut vp = viewport(100, 30);
        vp.set_theme("github-light");
        vp.goto_bottom();
        vp.replace_content(content(39));
        assert_eq!(vp.y_offset(), 10);
        assert_eq!(vp.content().theme(), "github-light");
        assert_eq!(vp.content().width(), 80);
    }
}
