//! Virtual content: every diff line as an addressable row.
//!
//! Files are flattened into two row arrays, one per view mode, built once up
//! front. Rows carry indices into the files, never rendered text; rendering
//! happens on demand through the [`RenderCache`].

use std::ops::Range;
use std::sync::Arc;

use crate::cache::{CacheStats, RenderCache, RenderCacheKey, DEFAULT_CAPACITY, DEFAULT_MAX_BYTES};
use crate::domain::{align, AlignedPair, DiffFile};
use crate::ui::render::{Cell, LineRenderer, SplitRow, UnifiedRow};
use crate::ui::theme::{self, DEFAULT_THEME};
use crate::worddiff::WordDiff;

pub const DEFAULT_BUFFER_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Unified,
    SideBySide,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Unified => ViewMode::SideBySide,
            ViewMode::SideBySide => ViewMode::Unified,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Unified => "unified",
            ViewMode::SideBySide => "side-by-side",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentConfig {
    pub cache_capacity: usize,
    pub cache_max_bytes: usize,
    /// Rows rendered ahead of time on each side of the visible range.
    pub buffer_lines: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            cache_max_bytes: DEFAULT_MAX_BYTES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

impl ContentConfig {
    /// Replace zero values with the defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: if self.cache_capacity == 0 {
                defaults.cache_capacity
            } else {
                self.cache_capacity
            },
            cache_max_bytes: if self.cache_max_bytes == 0 {
                defaults.cache_max_bytes
            } else {
                self.cache_max_bytes
            },
            buffer_lines: if self.buffer_lines == 0 {
                defaults.buffer_lines
            } else {
                self.buffer_lines
            },
        }
    }
}

/// Where a row sits inside its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HunkSlot {
    FileHeader,
    /// Blank row between two files.
    Separator,
    Hunk(usize),
}

impl HunkSlot {
    /// Hunk index as stored in cache keys.
    pub fn index(self) -> i64 {
        match self {
            HunkSlot::FileHeader => -1,
            HunkSlot::Separator => -2,
            HunkSlot::Hunk(i) => i as i64,
        }
    }
}

/// A unified-mode row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualLine {
    pub file_index: usize,
    pub file_hash: Arc<str>,
    pub slot: HunkSlot,
    /// Index into the hunk's lines; 0 for headers and separators.
    pub line_index: usize,
}

/// A side-by-side row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideBySideLine {
    pub file_index: usize,
    pub file_hash: Arc<str>,
    pub slot: HunkSlot,
    /// Index into the hunk's aligned pairs; 0 for headers and separators.
    pub pair_index: usize,
    pub pair: Option<AlignedPair>,
}

trait Row {
    fn file_index(&self) -> usize;
    fn slot(&self) -> HunkSlot;
    fn ordinal(&self) -> usize;

    fn starts_hunk(&self) -> bool {
        matches!(self.slot(), HunkSlot::Hunk(_)) && self.ordinal() == 0
    }
}

impl Row for VirtualLine {
    fn file_index(&self) -> usize {
        self.file_index
    }
    fn slot(&self) -> HunkSlot {
        self.slot
    }
    fn ordinal(&self) -> usize {
        self.line_index
    }
}

impl Row for SideBySideLine {
    fn file_index(&self) -> usize {
        self.file_index
    }
    fn slot(&self) -> HunkSlot {
        self.slot
    }
    fn ordinal(&self) -> usize {
        self.pair_index
    }
}

#[derive(Debug)]
pub struct VirtualContent {
    files: Vec<DiffFile>,
    unified: Vec<VirtualLine>,
    side_by_side: Vec<SideBySideLine>,
    word_diff: WordDiff,
    cache: RenderCache,
    renderer: LineRenderer,
    theme: Arc<str>,
    width: u16,
    view_mode: ViewMode,
    visible: Range<usize>,
    buffer_lines: usize,
}

impl VirtualContent {
    pub fn new(files: Vec<DiffFile>) -> Self {
        Self::build(files, ContentConfig::default())
    }

    pub fn build(files: Vec<DiffFile>, config: ContentConfig) -> Self {
        let config = config.normalized();
        let (unified, side_by_side) = flatten(&files);
        tracing::debug!(
            files = files.len(),
            unified = unified.len(),
            side_by_side = side_by_side.len(),
            "built virtual content"
        );

        let theme = theme::resolve(DEFAULT_THEME);
        let cache = RenderCache::new(config.cache_capacity, config.cache_max_bytes);
        cache.set_theme(theme.name);
        tracing::debug!(
            capacity = cache.capacity(),
            max_bytes = cache.max_bytes(),
            "render cache ready"
        );

        Self {
            files,
            unified,
            side_by_side,
            word_diff: WordDiff::default(),
            cache,
            renderer: LineRenderer::new(&theme.palette),
            theme: Arc::from(theme.name),
            width: 80,
            view_mode: ViewMode::Unified,
            visible: 0..0,
            buffer_lines: config.buffer_lines,
        }
    }

    pub fn files(&self) -> &[DiffFile] {
        &self.files
    }

    /// Row count in the current view mode.
    pub fn total_lines(&self) -> usize {
        match self.view_mode {
            ViewMode::Unified => self.unified.len(),
            ViewMode::SideBySide => self.side_by_side.len(),
        }
    }

    pub fn unified_len(&self) -> usize {
        self.unified.len()
    }

    pub fn side_by_side_len(&self) -> usize {
        self.side_by_side.len()
    }

    pub fn unified_rows(&self) -> &[VirtualLine] {
        &self.unified
    }

    pub fn side_by_side_rows(&self) -> &[SideBySideLine] {
        &self.side_by_side
    }

    pub fn buffer_lines(&self) -> usize {
        self.buffer_lines
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Returns `true` if the mode changed (and the cache was cleared).
    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        if self.view_mode == mode {
            return false;
        }
        self.view_mode = mode;
        self.cache.set_view_mode(mode);
        self.visible = 0..0;
        true
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Switch palettes. Unknown names fall back to the default theme.
    /// Returns `true` if the effective theme changed.
    pub fn set_theme(&mut self, name: &str) -> bool {
        let spec = theme::resolve(name);
        if *self.theme == *spec.name {
            return false;
        }
        self.theme = Arc::from(spec.name);
        self.renderer.set_palette(&spec.palette);
        self.cache.set_theme(spec.name);
        true
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns `true` if the width changed. Every cached line was rendered
    /// for the old width, so the cache is emptied.
    pub fn set_width(&mut self, width: u16) -> bool {
        if self.width == width {
            return false;
        }
        self.width = width;
        self.cache.clear();
        true
    }

    /// Attach word-level segments. Lines rendered earlier lack emphasis, so
    /// the cache is emptied.
    pub fn set_word_diff(&mut self, word_diff: WordDiff) {
        self.word_diff = word_diff;
        self.cache.clear();
    }

    pub fn word_diff(&self) -> &WordDiff {
        &self.word_diff
    }

    pub fn set_visible_range(&mut self, range: Range<usize>) {
        let total = self.total_lines();
        let end = range.end.min(total);
        self.visible = range.start.min(end)..end;
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.visible.clone()
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Rendered row `index` in the current mode, from cache when possible.
    /// Out of range yields an empty line.
    pub fn render_line(&self, index: usize) -> Arc<str> {
        let Some(key) = self.cache_key(index) else {
            return Arc::from("");
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let rendered: Arc<str> = Arc::from(self.render_uncached(index));
        self.cache.put(key, Arc::clone(&rendered));
        rendered
    }

    /// Every row, with only the visible range rendered and blank lines
    /// elsewhere, so absolute positions survive.
    pub fn render_padded(&self) -> String {
        let total = self.total_lines();
        let mut out = String::new();
        for i in 0..total {
            if i > 0 {
                out.push('\n');
            }
            if self.visible.contains(&i) {
                out.push_str(&self.render_line(i));
            }
        }
        out
    }

    /// File index of row `index` in the current mode.
    pub fn file_at(&self, index: usize) -> Option<usize> {
        match self.view_mode {
            ViewMode::Unified => self.unified.get(index).map(Row::file_index),
            ViewMode::SideBySide => self.side_by_side.get(index).map(Row::file_index),
        }
    }

    /// First row of file `file_index` in the current mode.
    pub fn file_start(&self, file_index: usize) -> Option<usize> {
        match self.view_mode {
            ViewMode::Unified => file_start(&self.unified, file_index),
            ViewMode::SideBySide => file_start(&self.side_by_side, file_index),
        }
    }

    /// First row of every file that has rows.
    pub fn file_starts(&self) -> Vec<usize> {
        (0..self.files.len()).filter_map(|f| self.file_start(f)).collect()
    }

    pub fn next_file_start(&self, from: usize) -> Option<usize> {
        let file = self.file_at(from)?;
        ((file + 1)..self.files.len()).find_map(|f| self.file_start(f))
    }

    /// Start of the current file, or of the previous one when already there.
    pub fn prev_file_start(&self, from: usize) -> Option<usize> {
        let file = self.file_at(from)?;
        let start = self.file_start(file)?;
        if from > start {
            return Some(start);
        }
        (0..file).rev().find_map(|f| self.file_start(f))
    }

    pub fn next_hunk_start(&self, from: usize) -> Option<usize> {
        match self.view_mode {
            ViewMode::Unified => next_hunk_start(&self.unified, from),
            ViewMode::SideBySide => next_hunk_start(&self.side_by_side, from),
        }
    }

    pub fn prev_hunk_start(&self, from: usize) -> Option<usize> {
        match self.view_mode {
            ViewMode::Unified => prev_hunk_start(&self.unified, from),
            ViewMode::SideBySide => prev_hunk_start(&self.side_by_side, from),
        }
    }

    fn cache_key(&self, index: usize) -> Option<RenderCacheKey> {
        let (file_hash, slot, ordinal) = match self.view_mode {
            ViewMode::Unified => {
                let row = self.unified.get(index)?;
                (&row.file_hash, row.slot, row.line_index)
            }
            ViewMode::SideBySide => {
                let row = self.side_by_side.get(index)?;
                (&row.file_hash, row.slot, row.pair_index)
            }
        };
        Some(RenderCacheKey {
            file_hash: Arc::clone(file_hash),
            hunk_index: slot.index(),
            line_index: ordinal,
            width: self.width,
            view_mode: self.view_mode,
            theme: Arc::clone(&self.theme),
        })
    }

    fn render_uncached(&self, index: usize) -> String {
        match self.view_mode {
            ViewMode::Unified => {
                let Some(row) = self.unified.get(index) else {
                    return String::new();
                };
                let Some(file) = self.files.get(row.file_index) else {
                    return String::new();
                };
                let unified = match row.slot {
                    HunkSlot::FileHeader => UnifiedRow::FileHeader(file),
                    HunkSlot::Separator => UnifiedRow::Separator,
                    HunkSlot::Hunk(h) => {
                        let Some(line) = file.hunks.get(h).and_then(|hunk| hunk.lines.get(row.line_index)) else {
                            return String::new();
                        };
                        UnifiedRow::Line(Cell {
                            line,
                            segments: self.word_diff.segments(row.file_index, h, row.line_index),
                        })
                    }
                };
                self.renderer.render_unified(unified, self.width)
            }
            ViewMode::SideBySide => {
                let Some(row) = self.side_by_side.get(index) else {
                    return String::new();
                };
                let Some(file) = self.files.get(row.file_index) else {
                    return String::new();
                };
                let split = match (row.slot, row.pair) {
                    (HunkSlot::FileHeader, _) => SplitRow::FileHeader(file),
                    (HunkSlot::Separator, _) => SplitRow::Separator,
                    (HunkSlot::Hunk(h), Some(pair)) => {
                        let Some(hunk) = file.hunks.get(h) else {
                            return String::new();
                        };
                        let Some(kind) = pair.kind(hunk) else {
                            return String::new();
                        };
                        let cell = |i: Option<usize>| {
                            let i = i?;
                            Some(Cell {
                                line: hunk.lines.get(i)?,
                                segments: self.word_diff.segments(row.file_index, h, i),
                            })
                        };
                        SplitRow::Pair {
                            kind,
                            left: cell(pair.left),
                            right: cell(pair.right),
                        }
                    }
                    (HunkSlot::Hunk(_), None) => return String::new(),
                };
                self.renderer.render_side_by_side(split, self.width)
            }
        }
    }
}

/// Build both row arrays. Headers and separators only appear when there is
/// more than one file; separators go between files, never after the last.
fn flatten(files: &[DiffFile]) -> (Vec<VirtualLine>, Vec<SideBySideLine>) {
    let capacity: usize = files.iter().map(|f| f.line_count() + 2).sum();
    let mut unified = Vec::with_capacity(capacity);
    let mut side_by_side = Vec::with_capacity(capacity);
    let multi = files.len() > 1;

    for (file_index, file) in files.iter().enumerate() {
        let file_hash: Arc<str> = Arc::from(file.file_hash());
        let marker = |slot| {
            (
                VirtualLine {
                    file_index,
                    file_hash: Arc::clone(&file_hash),
                    slot,
                    line_index: 0,
                },
                SideBySideLine {
                    file_index,
                    file_hash: Arc::clone(&file_hash),
                    slot,
                    pair_index: 0,
                    pair: None,
                },
            )
        };

        if multi {
            let (u, s) = marker(HunkSlot::FileHeader);
            unified.push(u);
            side_by_side.push(s);
        }

        for (hunk_index, hunk) in file.hunks.iter().enumerate() {
            let slot = HunkSlot::Hunk(hunk_index);
            unified.extend((0..hunk.lines.len()).map(|line_index| VirtualLine {
                file_index,
                file_hash: Arc::clone(&file_hash),
                slot,
                line_index,
            }));
            side_by_side.extend(align(hunk).into_iter().enumerate().map(|(pair_index, pair)| {
                SideBySideLine {
                    file_index,
                    file_hash: Arc::clone(&file_hash),
                    slot,
                    pair_index,
                    pair: Some(pair),
                }
            }));
        }

        if multi && file_index + 1 < files.len() {
            let (u, s) = marker(HunkSlot::Separator);
            unified.push(u);
            side_by_side.push(s);
        }
    }

    (unified, side_by_side)
}

fn file_start<R: Row>(rows: &[R], file_index: usize) -> Option<usize> {
    let pos = rows.partition_point(|r| r.file_index() < file_index);
    rows.get(pos)
        .filter(|r| r.file_index() == file_index)
        .map(|_| pos)
}

fn next_hunk_start<R: Row>(rows: &[R], from: usize) -> Option<usize> {
    rows.iter()
        .enumerate()
        .skip(from.saturating_add(1))
        .find(|(_, r)| r.starts_hunk())
        .map(|(i, _)| i)
}

fn prev_hunk_start<R: Row>(rows: &[R], from: usize) -> Option<usize> {
    rows[..from.min(rows.len())]
        .iter()
        .rposition(Row::starts_hunk)
}
