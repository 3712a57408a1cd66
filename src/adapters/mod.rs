pub mod crossterm_adapter;
pub mod git2_adapter;

pub use crossterm_adapter::CrosstermTerminal;
pub use git2_adapter::{DiffTarget, Git2Patch, Git2Repo};
