pub mod align;
pub mod types;

pub use align::{align, AlignedPair, PairKind};
pub use types::{DiffFile, DiffHunk, DiffLine, DiffStats, LineKind, NULL_PATH, UNKNOWN_FILE};
