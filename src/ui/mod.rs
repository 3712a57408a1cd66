pub mod ansi;
pub mod layout;
pub mod render;
pub mod styles;
pub mod theme;
