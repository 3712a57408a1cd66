//! Diff source port (trait).
//! Anything that can produce a list of file diffs: a repository, a patch
//! file, or a test fake.

use crate::domain::DiffFile;
use anyhow::Result;

pub trait DiffSource {
    /// Load the full diff. Called once at startup and again on reload.
    fn load(&self) -> Result<Vec<DiffFile>>;

    /// Short human-readable description for the status bar.
    fn describe(&self) -> String;
}
