pub mod git;
pub mod terminal;

pub use git::DiffSource;
pub use terminal::{KeyCode, KeyEvent, KeyModifiers, Terminal, TerminalEvent};
