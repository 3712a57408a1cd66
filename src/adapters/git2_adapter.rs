//! Git2 implementations of the DiffSource port.

use crate::domain::{DiffFile, DiffHunk, DiffLine, NULL_PATH};
use crate::ports::DiffSource;
use anyhow::{Context, Result};
use git2::{Delta, DiffFindOptions, DiffOptions, Repository};
use std::path::Path;

const CONTEXT_LINES: u32 = 3;

/// What a repository diff compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// HEAD against the working tree, untracked files included.
    WorkingTree,
    /// `from` against `to`, or against the working tree when `to` is `None`.
    Range { from: String, to: Option<String> },
}

pub struct Git2Repo {
    repo: Repository,
    target: DiffTarget,
}

impl Git2Repo {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).context("Failed to open git repository")?;
        Ok(Self {
            repo,
            target: DiffTarget::WorkingTree,
        })
    }

    pub fn open_current_dir() -> Result<Self> {
        Self::open(Path::new("."))
    }

    pub fn with_target(mut self, target: DiffTarget) -> Self {
        self.target = target;
        self
    }

    pub fn working_tree_diff(&self) -> Result<Vec<DiffFile>> {
        // An unborn HEAD diffs against the empty tree.
        let head_tree = self.repo.head().ok().and_then(|h| h.peel_to_tree().ok());

        let mut opts = diff_options();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let mut diff = self
            .repo
            .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))
            .context("Failed to diff working tree")?;
        detect_renames(&mut diff)?;

        parse_git2_diff(&diff)
    }

    pub fn range_diff(&self, from: &str, to: Option<&str>) -> Result<Vec<DiffFile>> {
        let from_tree = self.resolve_tree(from)?;
        let mut opts = diff_options();

        let mut diff = match to {
            Some(to) => {
                let to_tree = self.resolve_tree(to)?;
                self.repo
                    .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut opts))
                    .with_context(|| format!("Failed to diff {}..{}", from, to))?
            }
            None => self
                .repo
                .diff_tree_to_workdir_with_index(Some(&from_tree), Some(&mut opts))
                .with_context(|| format!("Failed to diff {} against working tree", from))?,
        };
        detect_renames(&mut diff)?;

        parse_git2_diff(&diff)
    }

    fn resolve_tree(&self, spec: &str) -> Result<git2::Tree<'_>> {
        self.repo
            .revparse_single(spec)
            .and_then(|obj| obj.peel_to_tree())
            .with_context(|| format!("Failed to resolve '{}'", spec))
    }
}

impl DiffSource for Git2Repo {
    fn load(&self) -> Result<Vec<DiffFile>> {
        match &self.target {
            DiffTarget::WorkingTree => self.working_tree_diff(),
            DiffTarget::Range { from, to } => self.range_diff(from, to.as_deref()),
        }
    }

    fn describe(&self) -> String {
        match &self.target {
            DiffTarget::WorkingTree => "working tree".to_string(),
            DiffTarget::Range { from, to: Some(to) } => format!("{}..{}", from, to),
            DiffTarget::Range { from, to: None } => format!("{}..working tree", from),
        }
    }
}

/// A unified diff read from a file (or stdin), parsed by libgit2.
pub struct Git2Patch {
    label: String,
    bytes: Vec<u8>,
}

impl Git2Patch {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read patch {}", path.display()))?;
        Ok(Self::from_bytes(path.display().to_string(), bytes))
    }

    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes,
        }
    }
}

impl DiffSource for Git2Patch {
    fn load(&self) -> Result<Vec<DiffFile>> {
        if self.bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let diff = git2::Diff::from_buffer(&self.bytes)
            .with_context(|| format!("Failed to parse patch {}", self.label))?;
        parse_git2_diff(&diff)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

fn diff_options() -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.context_lines(CONTEXT_LINES);
    opts
}

fn detect_renames(diff: &mut git2::Diff<'_>) -> Result<()> {
    let mut find = DiffFindOptions::new();
    find.renames(true).copies(false);
    diff.find_similar(Some(&mut find))
        .context("Failed to detect renames")?;
    Ok(())
}

fn parse_git2_diff(diff: &git2::Diff<'_>) -> Result<Vec<DiffFile>> {
    let mut files = Vec::with_capacity(diff.deltas().len());

    for delta_idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(delta_idx) else {
            continue;
        };

        let path_of = |file: git2::DiffFile<'_>| {
            file.path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let mut file = DiffFile {
            old_path: path_of(delta.old_file()),
            new_path: path_of(delta.new_file()),
            is_binary: delta.flags().is_binary(),
            ..DiffFile::default()
        };

        match delta.status() {
            Delta::Added => {
                file.is_new = true;
                file.old_path = NULL_PATH.to_string();
            }
            Delta::Untracked => {
                file.is_new = true;
                file.is_untracked = true;
                file.old_path = NULL_PATH.to_string();
            }
            Delta::Deleted => {
                file.is_deleted = true;
                file.new_path = NULL_PATH.to_string();
            }
            Delta::Renamed => file.is_renamed = true,
            _ => {}
        }

        if !file.is_binary {
            if let Some(patch) = git2::Patch::from_diff(diff, delta_idx)? {
                file.is_binary = patch.delta().flags().is_binary();
                for hunk_idx in 0..patch.num_hunks() {
                    let (hunk, _) = patch.hunk(hunk_idx)?;
                    let header = String::from_utf8_lossy(hunk.header())
                        .trim_end()
                        .to_string();

                    let mut lines = vec![DiffLine::hunk_header(header.clone())];
                    for line_idx in 0..patch.num_lines_in_hunk(hunk_idx)? {
                        let line = patch.line_in_hunk(hunk_idx, line_idx)?;
                        let content = String::from_utf8_lossy(line.content());
                        let content = content.trim_end_matches('\n');

                        match line.origin() {
                            '+' => lines.push(DiffLine::addition(
                                line.new_lineno().unwrap_or(0),
                                content,
                            )),
                            '-' => lines.push(DiffLine::deletion(
                                line.old_lineno().unwrap_or(0),
                                content,
                            )),
                            ' ' => lines.push(DiffLine::context(
                                line.old_lineno().unwrap_or(0),
                                line.new_lineno().unwrap_or(0),
                                content,
                            )),
                            // "\ No newline at end of file" markers
                            _ => {}
                        }
                    }

                    file.hunks.push(DiffHunk::new(hunk.old_start(), hunk.new_start(), header, lines));
                }
            }
        }

        file.recount();
        if file.is_renamed && file.hunks.is_empty() {
            file.similarity = 100;
        }
        files.push(file);
    }

    tracing::debug!(files = files.len(), "parsed git diff");
    Ok(files)
}
