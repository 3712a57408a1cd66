//! Pure data types for the diff domain.
//! No I/O, no dependencies on external crates beyond std.

use std::fmt;

/// Marker git uses for the missing side of an added or deleted file.
pub const NULL_PATH: &str = "/dev/null";

/// Identity used for files that carry no usable path.
pub const UNKNOWN_FILE: &str = "unknown";

/// Kind of a single line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Context,
    Addition,
    Deletion,
    HunkHeader,
}

/// A single line in a diff hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Zero for additions and hunk headers.
    pub old_line_num: u32,
    /// Zero for deletions and hunk headers.
    pub new_line_num: u32,
    pub content: String,
}

impl DiffLine {
    pub fn context(old_line_num: u32, new_line_num: u32, content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Context,
            old_line_num,
            new_line_num,
            content: content.into(),
        }
    }

    pub fn addition(new_line_num: u32, content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Addition,
            old_line_num: 0,
            new_line_num,
            content: content.into(),
        }
    }

    pub fn deletion(old_line_num: u32, content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Deletion,
            old_line_num,
            new_line_num: 0,
            content: content.into(),
        }
    }

    pub fn hunk_header(content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::HunkHeader,
            old_line_num: 0,
            new_line_num: 0,
            content: content.into(),
        }
    }

    pub fn prefix(&self) -> char {
        match self.kind {
            LineKind::Context | LineKind::HunkHeader => ' ',
            LineKind::Addition => '+',
            LineKind::Deletion => '-',
        }
    }
}

/// A hunk in a diff file. The header is stored as the first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub header: String,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Build a hunk, deriving the old/new counts from `lines`.
    pub fn new(old_start: u32, new_start: u32, header: impl Into<String>, lines: Vec<DiffLine>) -> Self {
        let mut old_count = 0;
        let mut new_count = 0;
        for line in &lines {
            match line.kind {
                LineKind::Context => {
                    old_count += 1;
                    new_count += 1;
                }
                LineKind::Deletion => old_count += 1,
                LineKind::Addition => new_count += 1,
                LineKind::HunkHeader => {}
            }
        }

        Self {
            old_start,
            old_count,
            new_start,
            new_count,
            header: header.into(),
            lines,
        }
    }

    /// Build a hunk from bare line bodies, numbering lines from the starts and
    /// prepending a synthesized `@@` header line.
    pub fn from_body(old_start: u32, new_start: u32, body: &[(LineKind, &str)]) -> Self {
        let mut old_num = old_start;
        let mut new_num = new_start;
        let mut lines = Vec::with_capacity(body.len() + 1);

        for (kind, text) in body {
            match kind {
                LineKind::Context => {
                    lines.push(DiffLine::context(old_num, new_num, *text));
                    old_num += 1;
                    new_num += 1;
                }
                LineKind::Deletion => {
                    lines.push(DiffLine::deletion(old_num, *text));
                    old_num += 1;
                }
                LineKind::Addition => {
                    lines.push(DiffLine::addition(new_num, *text));
                    new_num += 1;
                }
                LineKind::HunkHeader => lines.push(DiffLine::hunk_header(*text)),
            }
        }

        let mut hunk = Self::new(old_start, new_start, String::new(), lines);
        hunk.header = format!(
            "@@ -{},{} +{},{} @@",
            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
        );
        hunk.lines.insert(0, DiffLine::hunk_header(hunk.header.clone()));
        hunk
    }

    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Addition).count()
    }

    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Deletion).count()
    }
}

/// Stats for a file diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

impl DiffStats {
    pub fn new(additions: usize, deletions: usize) -> Self {
        Self {
            additions,
            deletions,
        }
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{}", self.additions, self.deletions)
    }
}

/// Diff for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffFile {
    pub old_path: String,
    pub new_path: String,
    pub additions: usize,
    pub deletions: usize,
    pub is_binary: bool,
    pub is_renamed: bool,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_untracked: bool,
    /// Rename/copy similarity, 0-100.
    pub similarity: u8,
    pub hunks: Vec<DiffHunk>,
}

impl DiffFile {
    /// A modified text file whose stats are derived from `hunks`.
    pub fn modified(path: impl Into<String>, hunks: Vec<DiffHunk>) -> Self {
        let path = path.into();
        let mut file = Self {
            old_path: path.clone(),
            new_path: path,
            hunks,
            ..Self::default()
        };
        file.recount();
        file
    }

    pub fn binary(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            old_path: path.clone(),
            new_path: path,
            is_binary: true,
            ..Self::default()
        }
    }

    /// Recompute `additions`/`deletions` from the hunks.
    pub fn recount(&mut self) {
        self.additions = self.hunks.iter().map(DiffHunk::additions).sum();
        self.deletions = self.hunks.iter().map(DiffHunk::deletions).sum();
    }

    pub fn stats(&self) -> DiffStats {
        DiffStats::new(self.additions, self.deletions)
    }

    /// Stable identity for cache keys: new path, then old path, then
    /// [`UNKNOWN_FILE`]. Not a content hash.
    pub fn file_hash(&self) -> &str {
        [self.new_path.as_str(), self.old_path.as_str()]
            .into_iter()
            .find(|p| is_real_path(p))
            .unwrap_or(UNKNOWN_FILE)
    }

    /// Path shown to the user, `old -> new` for renames.
    pub fn display_path(&self) -> String {
        match self.renamed_from() {
            Some(old) => format!("{} → {}", old, self.new_path),
            None => self.file_hash().to_string(),
        }
    }

    /// Old path of a rename that changed the path.
    pub fn renamed_from(&self) -> Option<&str> {
        (self.is_renamed && is_real_path(&self.old_path) && self.old_path != self.new_path)
            .then_some(self.old_path.as_str())
    }

    pub fn line_count(&self) -> usize {
        self.hunks.iter().map(|h| h.lines.len()).sum()
    }
}

fn is_real_path(path: &str) -> bool {
    !path.is_empty() && path != NULL_PATH
}
