//! Pager state machine.
//! Uses trait objects for the diff source, generics for terminal (due to dyn-compatibility).

use crate::config::{self, Config};
use crate::content::VirtualContent;
use crate::domain::DiffFile;
use crate::keymap::{build_default_keymap, Action, Context, Keymap};
use crate::ports::{DiffSource, KeyEvent, Terminal, TerminalEvent};
use crate::ui::ansi;
use crate::ui::layout::{self, FrameView, StatusInfo};
use crate::ui::theme;
use crate::viewport::{DiffViewport, ScrollState};
use crate::worddiff;
use anyhow::Result;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct App {
    pub viewport: DiffViewport,
    pub keymap: Keymap,
    pub config: Config,
    pub source_label: String,
    pub show_help: bool,
    pub should_quit: bool,
    /// Shown in the status bar until the next key.
    pub message: Option<String>,
    /// Write theme changes back to the config file.
    pub persist_theme: bool,
}

impl App {
    pub fn new(source: &dyn DiffSource, config: Config) -> Result<Self> {
        let files = source.load()?;
        tracing::info!(source = %source.describe(), files = files.len(), "diff loaded");

        let content = build_content(files, &config);
        Ok(Self {
            viewport: DiffViewport::new(content),
            keymap: build_default_keymap(),
            config,
            source_label: source.describe(),
            show_help: false,
            should_quit: false,
            message: None,
            persist_theme: false,
        })
    }

    pub fn run<T: Terminal>(&mut self, terminal: &mut T, source: &dyn DiffSource) -> Result<()> {
        let (width, height) = terminal.size()?;
        self.resize(width, height);

        while !self.should_quit {
            self.draw(terminal)?;

            if let Some(event) = terminal.poll_event(POLL_INTERVAL)? {
                self.handle_event(event, source);
            }
        }

        let stats = self.viewport.content().cache_stats();
        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            evictions = stats.evictions,
            "render cache at exit"
        );
        Ok(())
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        let (width, rows) = layout::body_size(width, height);
        self.viewport.set_size(width, rows);
    }

    fn draw<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        let body = ansi::to_text(&self.viewport.render());
        let status = self.status();
        let palette = theme::resolve(self.viewport.content().theme()).palette;
        let total = self.viewport.total_lines();
        let offset = self.viewport.y_offset();
        let help = self.show_help.then_some(&self.keymap);

        terminal.draw(|frame| {
            layout::render(
                frame,
                FrameView {
                    body,
                    total,
                    offset,
                    status: &status,
                    palette: &palette,
                    help,
                },
            )
        })
    }

    pub fn status(&self) -> StatusInfo {
        let content = self.viewport.content();
        let position = match self.viewport.state() {
            ScrollState::NoContent => "Empty".to_string(),
            _ if self.viewport.max_offset() == 0 => "All".to_string(),
            ScrollState::AtTop => "Top".to_string(),
            ScrollState::AtBottom => "Bot".to_string(),
            ScrollState::Middle => format!("{:.0}%", self.viewport.scroll_percent() * 100.0),
        };
        StatusInfo {
            source: self.source_label.clone(),
            path: self
                .viewport
                .current_file()
                .and_then(|i| content.files().get(i))
                .map(DiffFile::display_path),
            position,
            mode: content.view_mode().label(),
            theme: content.theme().to_string(),
            hit_rate: content.cache_stats().hit_rate(),
            message: self.message.clone(),
        }
    }

    pub fn handle_event(&mut self, event: TerminalEvent, source: &dyn DiffSource) {
        match event {
            TerminalEvent::Key(key) => self.handle_key(key, source),
            TerminalEvent::Resize(width, height) => self.resize(width, height),
            TerminalEvent::Scroll(lines) => self.viewport.scroll_by(isize::from(lines)),
        }
    }

    fn handle_key(&mut self, key: KeyEvent, source: &dyn DiffSource) {
        self.message = None;

        let contexts: &[Context] = if self.show_help {
            &[Context::Global, Context::Help]
        } else {
            &[Context::Global]
        };
        if let Some(action) = self.keymap.lookup(key.code, key.modifiers, contexts) {
            self.dispatch(action, source);
        }
    }

    pub fn dispatch(&mut self, action: Action, source: &dyn DiffSource) {
        let vp = &mut self.viewport;
        match action {
            Action::LineDown => vp.scroll_down(1),
            Action::LineUp => vp.scroll_up(1),
            Action::HalfPageDown => vp.half_page_down(),
            Action::HalfPageUp => vp.half_page_up(),
            Action::PageDown => vp.page_down(),
            Action::PageUp => vp.page_up(),
            Action::GotoTop => vp.goto_top(),
            Action::GotoBottom => vp.goto_bottom(),

            Action::NextFile => {
                if !vp.next_file() {
                    self.message = Some("Last file".to_string());
                }
            }
            Action::PrevFile => {
                if !vp.prev_file() {
                    self.message = Some("First file".to_string());
                }
            }
            Action::NextHunk => {
                if !vp.next_hunk() {
                    self.message = Some("No more hunks".to_string());
                }
            }
            Action::PrevHunk => {
                if !vp.prev_hunk() {
                    self.message = Some("No earlier hunks".to_string());
                }
            }

            Action::ToggleSideBySide => {
                let mode = vp.toggle_view_mode();
                self.config.view_mode = mode;
                tracing::debug!(mode = mode.label(), "view mode changed");
            }
            Action::CycleTheme => self.cycle_theme(),
            Action::Reload => self.reload(source),

            Action::ShowHelp => self.show_help = true,
            Action::DismissHelp => self.show_help = false,
            Action::Quit => self.should_quit = true,
        }
    }

    fn cycle_theme(&mut self) {
        let next = theme::next_theme(self.viewport.content().theme());
        self.viewport.set_theme(next);
        self.config.theme = next.to_string();
        tracing::debug!(theme = next, "theme changed");

        if self.persist_theme {
            if let Err(err) = config::save_theme(next) {
                tracing::warn!("failed to save theme: {:#}", err);
            }
        }
    }

    fn reload(&mut self, source: &dyn DiffSource) {
        match source.load() {
            Ok(files) => {
                tracing::info!(files = files.len(), "diff reloaded");
                self.viewport
                    .replace_content(build_content(files, &self.config));
                self.message = Some("Reloaded".to_string());
            }
            Err(err) => {
                tracing::warn!("reload failed: {:#}", err);
                self.message = Some(format!("Reload failed: {}", err));
            }
        }
    }
}

/// Content for `files` with the configured mode, theme and word diff.
pub fn build_content(files: Vec<DiffFile>, config: &Config) -> VirtualContent {
    let word_diff = config.word_diff_budget().map(|budget| {
        let started = Instant::now();
        let words = worddiff::enrich(&files, started + budget);
        if !words.is_complete() {
            tracing::warn!(
                budget_ms = budget.as_millis() as u64,
                lines = words.len(),
                "word diff stopped at its time budget"
            );
        }
        tracing::debug!(elapsed = ?started.elapsed(), lines = words.len(), "word diff computed");
        words
    });

    let mut content = VirtualContent::build(files, config.content_config());
    content.set_theme(&config.theme);
    content.set_view_mode(config.view_mode);
    if let Some(words) = word_diff {
        content.set_word_diff(words);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ViewMode;
    use crate::domain::{DiffHunk, LineKind};
    use crate::ports::KeyCode;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::Frame;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    struct FakeSource {
        files: RefCell<Vec<DiffFile>>,
        fail: Cell<bool>,
    }

    impl FakeSource {
        fn new(files: Vec<DiffFile>) -> Self {
            Self {
                files: RefCell::new(files),
                fail: Cell::new(false),
            }
        }
    }

    impl DiffSource for FakeSource {
        fn load(&self) -> Result<Vec<DiffFile>> {
            if self.fail.get() {
                return Err(anyhow!("repository vanished"));
            }
            Ok(self.files.borrow().clone())
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    struct FakeTerminal {
        inner: ratatui::Terminal<TestBackend>,
        events: VecDeque<TerminalEvent>,
        draws: usize,
    }

    impl FakeTerminal {
        fn new(width: u16, height: u16, events: Vec<TerminalEvent>) -> Self {
            Self {
                inner: ratatui::Terminal::new(TestBackend::new(width, height)).unwrap(),
                events: events.into(),
                draws: 0,
            }
        }

        fn screen(&self) -> Vec<String> {
            let buf = self.inner.backend().buffer();
            (0..buf.area.height)
                .map(|y| (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect())
                .collect()
        }
    }

    impl Terminal for FakeTerminal {
        fn draw<F>(&mut self, f: F) -> Result<()>
        where
            F: FnOnce(&mut Frame),
        {
            self.draws += 1;
            self.inner.draw(f)?;
            Ok(())
        }

        fn poll_event(&mut self, _timeout: Duration) -> Result<Option<TerminalEvent>> {
            Ok(Some(
                self.events
                    .pop_front()
                    .unwrap_or(TerminalEvent::Key(KeyEvent::plain(KeyCode::Char('q')))),
            ))
        }

        fn size(&self) -> Result<(u16, u16)> {
            let area = self.inner.backend().buffer().area;
            Ok((area.width, area.height))
        }
    }

    fn file(path: &str, lines: usize) -> DiffFile {
        let body: Vec<(LineKind, String)> = (0..lines)
            .map(|i| (LineKind::Context, format!("{} line {}", path, i)))
            .collect();
        let body: Vec<(LineKind, &str)> = body.iter().map(|(k, s)| (*k, s.as_str())).collect();
        DiffFile::modified(path, vec![DiffHunk::from_body(1, 1, &body)])
    }

    fn quiet_config() -> Config {
        Config {
            word_diff_budget_ms: 0,
            ..Config::default()
        }
    }

    fn app(source: &FakeSource) -> App {
        let mut app = App::new(source, quiet_config()).unwrap();
        app.resize(81, 11);
        app
    }

    fn key(c: char) -> TerminalEvent {
        TerminalEvent::Key(KeyEvent::plain(KeyCode::Char(c)))
    }

    #[test]
    fn starts_at_top_with_status() {
        let source = FakeSource::new(vec![file("a.rs", 30), file("b.rs", 30)]);
        let app = app(&source);

        assert_eq!(app.viewport.y_offset(), 0);
        assert_eq!((app.viewport.width(), app.viewport.height()), (80, 10));
        let status = app.status();
        assert_eq!(status.path.as_deref(), Some("a.rs"));
        assert_eq!(status.position, "Top");
        assert_eq!(status.source, "fake");
    }

    #[test]
    fn keys_scroll_and_jump() {
        let source = FakeSource::new(vec![file("a.rs", 30), file("b.rs", 30)]);
        let mut app = app(&source);

        app.handle_event(key('j'), &source);
        assert_eq!(app.viewport.y_offset(), 1);
        app.handle_event(TerminalEvent::Key(KeyEvent::ctrl('d')), &source);
        assert_eq!(app.viewport.y_offset(), 6);
        app.handle_event(key('g'), &source);
        assert_eq!(app.viewport.y_offset(), 0);

        // a.rs: header, hunk header, 30 lines, separator
        app.handle_event(key('n'), &source);
        assert_eq!(app.viewport.y_offset(), 33);
        assert_eq!(app.status().path.as_deref(), Some("b.rs"));

        app.handle_event(key('n'), &source);
        assert_eq!(app.message.as_deref(), Some("Last file"));

        app.handle_event(key('G'), &source);
        assert_eq!(app.viewport.y_offset(), app.viewport.max_offset());
        assert_eq!(app.status().position, "Bot");
    }

    #[test]
    fn mouse_wheel_scrolls() {
        let source = FakeSource::new(vec![file("a.rs", 30)]);
        let mut app = app(&source);

        app.handle_event(TerminalEvent::Scroll(3), &source);
        assert_eq!(app.viewport.y_offset(), 3);
        app.handle_event(TerminalEvent::Scroll(-10), &source);
        assert_eq!(app.viewport.y_offset(), 0);
    }

    #[test]
    fn toggle_and_theme_update_config() {
        let source = FakeSource::new(vec![file("a.rs", 5)]);
        let mut app = app(&source);

        app.handle_event(key('s'), &source);
        assert_eq!(app.viewport.content().view_mode(), ViewMode::SideBySide);
        assert_eq!(app.config.view_mode, ViewMode::SideBySide);

        let before = app.viewport.content().theme().to_string();
        app.handle_event(key('t'), &source);
        let after = app.viewport.content().theme().to_string();
        assert_ne!(before, after);
        assert_eq!(app.config.theme, after);
    }

    #[test]
    fn help_overlay_captures_quit() {
        let source = FakeSource::new(vec![file("a.rs", 5)]);
        let mut app = app(&source);

        app.handle_event(key('?'), &source);
        assert!(app.show_help);
        app.handle_event(key('q'), &source);
        assert!(!app.show_help);
        assert!(!app.should_quit);
        app.handle_event(key('q'), &source);
        assert!(app.should_quit);
    }

    #[test]
    fn reload_keeps_mode_and_clamps_offset() {
        let source = FakeSource::new(vec![file("a.rs", 40)]);
        let mut app = app(&source);
        app.handle_event(key('s'), &source);
        app.handle_event(key('G'), &source);

        *source.files.borrow_mut() = vec![file("a.rs", 12)];
        app.handle_event(key('r'), &source);

        assert_eq!(app.message.as_deref(), Some("Reloaded"));
        assert_eq!(app.viewport.content().view_mode(), ViewMode::SideBySide);
        assert_eq!(app.viewport.total_lines(), 13);
        assert_eq!(app.viewport.y_offset(), 3);
    }

    #[test]
    fn failed_reload_keeps_content() {
        let source = FakeSource::new(vec![file("a.rs", 40)]);
        let mut app = app(&source);
        source.fail.set(true);

        app.handle_event(key('r'), &source);
        assert_eq!(app.viewport.total_lines(), 41);
        assert!(app
            .message
            .as_deref()
            .is_some_and(|m| m.starts_with("Reload failed")));
    }

    #[test]
    fn empty_diff_reports_empty() {
        let source = FakeSource::new(Vec::new());
        let app = app(&source);
        assert_eq!(app.status().position, "Empty");
        assert_eq!(app.status().path, None);
    }

    #[test]
    fn run_draws_until_quit() {
        let source = FakeSource::new(vec![file("a.rs", 30)]);
        let mut app = App::new(&source, quiet_config()).unwrap();
        let mut terminal = FakeTerminal::new(41, 6, vec![key('j'), TerminalEvent::Resize(41, 8)]);

        app.run(&mut terminal, &source).unwrap();

        assert!(app.should_quit);
        assert_eq!(terminal.draws, 3);
        assert_eq!(app.viewport.y_offset(), 1);
        assert_eq!(app.viewport.height(), 7);
        let screen = terminal.screen();
        assert!(screen[0].starts_with("   1    1  a.rs line 0"));
        assert!(screen[5].starts_with(" a.rs"));
    }

    #[test]
    fn word_diff_is_attached_when_enabled() {
        let changed = DiffFile::modified(
            "w.rs",
            vec![DiffHunk::from_body(
                1,
                1,
                &[(LineKind::Deletion, "let a = 1;"), (LineKind::Addition, "let a = 2;")],
            )],
        );
        let content = build_content(vec![changed], &Config::default());
        assert!(!content.word_diff().is_empty());

        let content = build_content(vec![file("a.rs", 2)], &quiet_config());
        assert!(content.word_diff().is_empty());
    }
}
