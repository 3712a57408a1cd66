//! Virtual scrolling and render caching for terminal diffs.
//!
//! A diff is flattened into rows ([`content::VirtualContent`]), rows are
//! rendered on demand into ANSI strings ([`ui::render::LineRenderer`]) and
//! memoized in a dual-bounded LRU ([`cache::RenderCache`]), and a
//! [`viewport::DiffViewport`] decides which rows are on screen.

pub mod adapters;
pub mod app;
pub mod cache;
pub mod config;
pub mod content;
pub mod domain;
pub mod keymap;
pub mod logging;
pub mod ports;
pub mod scrollbar;
pub mod ui;
pub mod viewport;
pub mod worddiff;
