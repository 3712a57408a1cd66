//! User configuration.
//!
//! Read from `$CONFIG_DIR/diffscroll/config.toml`, then overridden by the
//! `DIFFSCROLL_THEME` environment variable, then by command-line flags (in
//! `main`). Missing or invalid values keep their defaults.
//!
//! ```toml
//! theme = "catppuccin-mocha"
//! view_mode = "side-by-side"
//! cache_capacity = 2000
//! cache_max_bytes = 20971520
//! buffer_lines = 80
//! word_diff_budget_ms = 200
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use toml::{Table, Value};

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_MAX_BYTES};
use crate::content::{ContentConfig, ViewMode, DEFAULT_BUFFER_LINES};
use crate::ui::theme::{self, DEFAULT_THEME};

pub const ENV_THEME: &str = "DIFFSCROLL_THEME";
pub const DEFAULT_WORD_DIFF_BUDGET_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cache_capacity: usize,
    pub cache_max_bytes: usize,
    pub buffer_lines: usize,
    pub theme: String,
    pub view_mode: ViewMode,
    /// Zero disables word-level highlighting.
    pub word_diff_budget_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            cache_max_bytes: DEFAULT_MAX_BYTES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            theme: DEFAULT_THEME.to_string(),
            view_mode: ViewMode::Unified,
            word_diff_budget_ms: DEFAULT_WORD_DIFF_BUDGET_MS,
        }
    }
}

impl Config {
    /// Load the config file if there is one. Problems are logged, never fatal.
    pub fn load() -> Self {
        let path = match config_path() {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(%err, "no config directory");
                return Self::default();
            }
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring config: {:#}", err);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let table: Table = text.parse().context("Invalid TOML")?;
        let mut config = Self::default();

        if let Some(n) = positive(&table, "cache_capacity") {
            config.cache_capacity = n;
        }
        if let Some(n) = positive(&table, "cache_max_bytes") {
            config.cache_max_bytes = n;
        }
        if let Some(n) = positive(&table, "buffer_lines") {
            config.buffer_lines = n;
        }
        if let Some(value) = table.get("word_diff_budget_ms") {
            match value.as_integer() {
                Some(ms) if ms >= 0 => config.word_diff_budget_ms = ms as u64,
                _ => tracing::warn!(?value, "invalid word_diff_budget_ms"),
            }
        }
        if let Some(name) = table.get("theme").and_then(Value::as_str) {
            config.set_theme(name);
        }
        if let Some(mode) = table.get("view_mode").and_then(Value::as_str) {
            match parse_view_mode(mode) {
                Some(mode) => config.view_mode = mode,
                None => tracing::warn!(mode, "unknown view_mode"),
            }
        }

        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_THEME) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.set_theme(trimmed);
            }
        }
    }

    /// Store the canonical theme name; unknown names are ignored.
    pub fn set_theme(&mut self, name: &str) {
        match theme::find_theme(name) {
            Some(spec) => self.theme = spec.name.to_string(),
            None => tracing::warn!(
                theme = name,
                "unknown theme, available: {}",
                theme::available_themes().join(", ")
            ),
        }
    }

    pub fn content_config(&self) -> ContentConfig {
        ContentConfig {
            cache_capacity: self.cache_capacity,
            cache_max_bytes: self.cache_max_bytes,
            buffer_lines: self.buffer_lines,
        }
        .normalized()
    }

    pub fn word_diff_budget(&self) -> Option<Duration> {
        (self.word_diff_budget_ms > 0).then(|| Duration::from_millis(self.word_diff_budget_ms))
    }
}

pub fn parse_view_mode(value: &str) -> Option<ViewMode> {
    match value.trim().to_lowercase().replace('_', "-").as_str() {
        "unified" => Some(ViewMode::Unified),
        "side-by-side" | "split" | "sbs" => Some(ViewMode::SideBySide),
        _ => None,
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow!("config dir not found"))?;
    Ok(dir.join("diffscroll").join("config.toml"))
}

/// Remember `theme` in the config file, keeping every other setting.
pub fn save_theme(theme: &str) -> Result<()> {
    save_theme_to(&config_path()?, theme)
}

pub fn save_theme_to(path: &Path, theme: &str) -> Result<()> {
    let mut table = if path.exists() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .parse::<Table>()
            .unwrap_or_default()
    } else {
        Table::new()
    };
    table.insert("theme".to_string(), Value::String(theme.to_string()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = toml::to_string(&table).context("Failed to serialize config")?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn positive(table: &Table, key: &str) -> Option<usize> {
    let value = table.get(key)?;
    match value.as_integer() {
        Some(n) if n > 0 => usize::try_from(n).ok(),
        _ => {
            tracing::warn!(key, ?value, "expected a positive integer");
            None
        }
    }
}
