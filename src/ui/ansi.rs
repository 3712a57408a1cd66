//! Styled text to ANSI escape sequences.
//!
//! Rendered lines are cached as plain strings with embedded SGR sequences.
//! [`AnsiLine`] writes them through crossterm's [`Command::write_ansi`],
//! tracks how many terminal cells it has emitted, and only emits an escape
//! when the style actually changes.

use std::fmt;

use crossterm::style::{Attribute, Color as CColor, Colors, SetAttribute, SetColors};
use crossterm::Command;
use ansi_to_tui::IntoText;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use unicode_width::UnicodeWidthChar;

/// Cells a tab expands to.
pub const TAB_WIDTH: usize = 4;

pub const ELLIPSIS: &str = "…";

/// Display width of one character as the renderer emits it.
pub fn char_width(c: char) -> usize {
    match c {
        '\t' => TAB_WIDTH,
        c if c.is_control() => 0,
        c => c.width().unwrap_or(0),
    }
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Parse an ANSI string into ratatui text. Malformed input is shown raw.
pub fn to_text(ansi: &str) -> Text<'static> {
    match ansi.into_text() {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(%err, "failed to parse rendered ANSI");
            Text::raw(ansi.to_string())
        }
    }
}

/// Stack buffer for formatting counts without allocating.
#[derive(Debug, Default)]
pub struct DigitBuf([u8; 20]);

impl DigitBuf {
    /// Decimal digits of `n`.
    pub fn format(&mut self, n: u64) -> &str {
        let mut start = self.0.len();
        let mut rest = n;
        loop {
            start -= 1;
            self.0[start] = b'0' + (rest % 10) as u8;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        // ASCII digits only.
        std::str::from_utf8(&self.0[start..]).unwrap_or_default()
    }
}

/// One line being built.
#[derive(Debug, Default)]
pub struct AnsiLine {
    buf: String,
    width: usize,
    fg: Option<Color>,
    bg: Option<Color>,
    modifier: Modifier,
    styled: bool,
}

impl AnsiLine {
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: String::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Cells emitted so far.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Append as much of `text` as fits before cell `limit`. Tabs become
    /// spaces and control characters are dropped. Returns `false` if
    /// anything was cut.
    pub fn push_clipped(&mut self, text: &str, style: Style, limit: usize) -> bool {
        if text.is_empty() {
            return true;
        }
        self.set_style(style);
        for c in text.chars() {
            let w = char_width(c);
            if self.width + w > limit {
                return false;
            }
            match c {
                '\t' => self.buf.extend(std::iter::repeat(' ').take(TAB_WIDTH)),
                c if c.is_control() => {}
                c => self.buf.push(c),
            }
            self.width += w;
        }
        true
    }

    /// Like [`AnsiLine::push_clipped`] but marks a cut with an ellipsis.
    pub fn push_ellipsized(&mut self, text: &str, style: Style, limit: usize) -> bool {
        if self.width + display_width(text) <= limit {
            return self.push_clipped(text, style, limit);
        }
        if limit > self.width {
            self.push_clipped(text, style, limit - 1);
            self.push_clipped(ELLIPSIS, style, limit);
        }
        false
    }

    /// Right-align `n` in a field of `field` cells; zero renders as blanks.
    pub fn push_number(&mut self, n: u32, field: usize, style: Style, limit: usize) {
        let mut buf = DigitBuf::default();
        let text = if n == 0 { "" } else { buf.format(u64::from(n)) };

        let pad = field.saturating_sub(text.len());
        self.pad_to((self.width + pad).min(limit), style);
        self.push_clipped(text, style, limit);
    }

    /// Fill with spaces up to cell `column`.
    pub fn pad_to(&mut self, column: usize, style: Style) {
        if column <= self.width {
            return;
        }
        self.set_style(style);
        let n = column - self.width;
        self.buf.extend(std::iter::repeat(' ').take(n));
        self.width = column;
    }

    /// Close any open style and return the line.
    pub fn finish(mut self) -> String {
        if self.styled {
            self.emit(SetAttribute(Attribute::Reset));
        }
        self.buf
    }

    fn set_style(&mut self, style: Style) {
        let modifier = (Modifier::empty() | style.add_modifier) - style.sub_modifier;
        if modifier != self.modifier {
            // Resetting attributes also resets colors, so force them out again.
            self.emit(SetAttribute(Attribute::Reset));
            self.fg = None;
            self.bg = None;
            self.styled = false;
            for (flag, attr) in [
                (Modifier::BOLD, Attribute::Bold),
                (Modifier::DIM, Attribute::Dim),
                (Modifier::ITALIC, Attribute::Italic),
                (Modifier::UNDERLINED, Attribute::Underlined),
                (Modifier::REVERSED, Attribute::Reverse),
                (Modifier::CROSSED_OUT, Attribute::CrossedOut),
            ] {
                if modifier.contains(flag) {
                    self.emit(SetAttribute(attr));
                    self.styled = true;
                }
            }
            self.modifier = modifier;
        }

        if style.fg != self.fg || style.bg != self.bg {
            let colors = Colors {
                foreground: Some(style.fg.map_or(CColor::Reset, CColor::from)),
                background: Some(style.bg.map_or(CColor::Reset, CColor::from)),
            };
            self.emit(SetColors(colors));
            self.fg = style.fg;
            self.bg = style.bg;
            self.styled |= style.fg.is_some() || style.bg.is_some();
        }
    }

    fn emit(&mut self, command: impl Command) {
        // Writing into a String cannot fail.
        let _: fmt::Result = command.write_ansi(&mut self.buf);
    }
}

#[cfg(test)]
pub(crate) fn plain(ansi: &str) -> String {
    to_text(ansi)
        .lines
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unstyled_text_has_no_escapes() {
        let mut line = AnsiLine::default();
        line.push_clipped("hello", Style::default(), usize::MAX);
        assert_eq!(line.finish(), "hello");
    }

    #[test]
    fn styled_text_round_trips_through_ansi_to_tui() {
        let mut line = AnsiLine::default();
        line.push_clipped("+", Style::default().fg(Color::Rgb(0, 200, 0)), usize::MAX);
        let added = Style::default().fg(Color::Rgb(220, 220, 220)).bg(Color::Rgb(0, 40, 0));
        line.push_clipped("added", added, usize::MAX);
        let out = line.finish();

        assert!(out.contains('\u{1b}'));
        assert_eq!(plain(&out), "+added");
        let text = to_text(&out);
        let span = &text.lines[0].spans[0];
        assert_eq!(span.style.fg, Some(Color::Rgb(0, 200, 0)));
    }

    #[test]
    fn clipping_stops_before_wide_characters() {
        let mut line = AnsiLine::default();
        assert!(!line.push_clipped("ab漢字", Style::default(), 3));
        assert_eq!(line.width(), 2);
        line.pad_to(3, Style::default());
        assert_eq!(line.finish(), "ab ");
    }

    #[test]
    fn ellipsis_marks_cut_text() {
        let mut line = AnsiLine::default();
        assert!(!line.push_ellipsized("abcdef", Style::default(), 4));
        assert_eq!(line.width(), 4);
        assert_eq!(line.finish(), "abc…");
    }

    #[test]
    fn tabs_expand_and_controls_vanish() {
        let mut line = AnsiLine::default();
        line.push_clipped("a\tb\r", Style::default(), usize::MAX);
        assert_eq!(line.width(), 2 + TAB_WIDTH);
        assert_eq!(line.finish(), "a    b");
    }

    #[test]
    fn numbers_are_right_aligned_and_zero_is_blank() {
        let mut line = AnsiLine::default();
        line.push_number(42, 4, Style::default(), 100);
        line.push_number(0, 4, Style::default(), 100);
        line.push_number(12345, 4, Style::default(), 100);
        assert_eq!(line.finish(), "  42    12345");
    }

    #[test]
    fn digit_buf_formats_counts() {
        let mut buf = DigitBuf::default();
        assert_eq!(buf.format(0), "0");
        assert_eq!(buf.format(7), "7");
        assert_eq!(buf.format(1_234_567), "1234567");
        assert_eq!(buf.format(u64::MAX), "18446744073709551615");
    }
}
