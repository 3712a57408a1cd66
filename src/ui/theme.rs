//! Theme registry.
//!
//! A theme name resolves to a [`Palette`]. Nothing here is global: the active
//! palette is turned into a [`StyleTable`](super::styles::StyleTable) owned by
//! the content store and rebuilt only when the theme changes.

use ratatui::style::Color;

pub const DEFAULT_THEME: &str = "github-dark";

/// Colors used by the line renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg_file_header: Color,
    pub bg_addition_margin: Color,
    pub bg_deletion_margin: Color,
    pub bg_addition_line: Color,
    pub bg_deletion_line: Color,
    pub bg_addition_word: Color,
    pub bg_deletion_word: Color,
    pub bg_hunk_header: Color,
    pub bg_empty: Color,
    pub fg_default: Color,
    pub fg_muted: Color,
    pub fg_addition: Color,
    pub fg_deletion: Color,
    pub fg_line_num: Color,
    pub fg_hunk: Color,
    pub fg_path: Color,
    pub fg_border: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeSpec {
    pub name: &'static str,
    pub palette: Palette,
}

const THEME_ORDER: &[&str] = &[
    "github-dark",
    "github-light",
    "catppuccin-mocha",
    "catppuccin-latte",
];

pub fn available_themes() -> Vec<String> {
    THEME_ORDER.iter().map(|name| (*name).to_string()).collect()
}

/// Resolve a theme name or alias. Unknown names yield `None`.
pub fn find_theme(name: &str) -> Option<ThemeSpec> {
    match normalize(name).as_str() {
        "github-dark" | "dark" | "gh-dark" => Some(github_dark()),
        "github-light" | "light" | "gh-light" => Some(github_light()),
        "catppuccin" | "catppuccin-dark" | "catppuccin-mocha" => Some(catppuccin_mocha()),
        "catppuccin-light" | "catppuccin-latte" => Some(catppuccin_latte()),
        _ => None,
    }
}

/// Resolve a theme, falling back to [`DEFAULT_THEME`].
pub fn resolve(name: &str) -> ThemeSpec {
    find_theme(name).unwrap_or_else(|| {
        tracing::warn!(theme = name, "unknown theme, using {}", DEFAULT_THEME);
        github_dark()
    })
}

/// Canonical name of the theme after `current` in the cycle order.
pub fn next_theme(current: &str) -> &'static str {
    let current = find_theme(current).map(|t| t.name).unwrap_or(DEFAULT_THEME);
    let pos = THEME_ORDER.iter().position(|n| *n == current).unwrap_or(0);
    THEME_ORDER[(pos + 1) % THEME_ORDER.len()]
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(r, g, b)
}

fn as_rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (0, 0, 0),
    }
}

fn blend(a: Color, b: Color, t: f32) -> Color {
    let (ar, ag, ab) = as_rgb(a);
    let (br, bg, bb) = as_rgb(b);
    let mix = |a: u8, b: u8| ((a as f32) * (1.0 - t) + (b as f32) * t).round() as u8;
    rgb(mix(ar, br), mix(ag, bg), mix(ab, bb))
}

// ─── GitHub ──────────────────────────────────────────────────────────────────

fn github_dark() -> ThemeSpec {
    ThemeSpec {
        name: "github-dark",
        palette: Palette {
            bg_file_header: rgb(36, 41, 46),
            bg_addition_margin: rgb(40, 67, 45),
            bg_deletion_margin: rgb(79, 41, 40),
            bg_addition_line: rgb(24, 39, 33),
            bg_deletion_line: rgb(36, 24, 29),
            bg_addition_word: rgb(50, 82, 56),
            bg_deletion_word: rgb(99, 51, 50),
            bg_hunk_header: rgb(36, 41, 56),
            bg_empty: rgb(31, 36, 40),
            fg_default: rgb(225, 228, 232),
            fg_muted: rgb(149, 157, 165),
            fg_addition: rgb(52, 208, 88),
            fg_deletion: rgb(234, 74, 90),
            fg_line_num: rgb(106, 115, 125),
            fg_hunk: rgb(121, 184, 255),
            fg_path: rgb(121, 184, 255),
            fg_border: rgb(68, 77, 86),
        },
    }
}

fn github_light() -> ThemeSpec {
    ThemeSpec {
        name: "github-light",
        palette: Palette {
            bg_file_header: rgb(246, 248, 250),
            bg_addition_margin: rgb(216, 248, 225),
            bg_deletion_margin: rgb(255, 235, 233),
            bg_addition_line: rgb(230, 255, 237),
            bg_deletion_line: rgb(255, 238, 240),
            bg_addition_word: rgb(172, 242, 189),
            bg_deletion_word: rgb(253, 184, 192),
            bg_hunk_header: rgb(221, 244, 255),
            bg_empty: rgb(246, 248, 250),
            fg_default: rgb(36, 41, 47),
            fg_muted: rgb(87, 96, 106),
            fg_addition: rgb(26, 127, 55),
            fg_deletion: rgb(207, 34, 46),
            fg_line_num: rgb(110, 119, 129),
            fg_hunk: rgb(9, 105, 218),
            fg_path: rgb(9, 105, 218),
            fg_border: rgb(208, 215, 222),
        },
    }
}

// ─── Catppuccin ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct CatppuccinPalette {
    base: (u8, u8, u8),
    mantle: (u8, u8, u8),
    surface2: (u8, u8, u8),
    text: (u8, u8, u8),
    subtext0: (u8, u8, u8),
    overlay0: (u8, u8, u8),
    blue: (u8, u8, u8),
    green: (u8, u8, u8),
    red: (u8, u8, u8),
}

fn catppuccin_theme(name: &'static str, p: CatppuccinPalette, is_light: bool) -> ThemeSpec {
    let base = rgb(p.base.0, p.base.1, p.base.2);
    let mantle = rgb(p.mantle.0, p.mantle.1, p.mantle.2);
    let surface2 = rgb(p.surface2.0, p.surface2.1, p.surface2.2);
    let text = rgb(p.text.0, p.text.1, p.text.2);
    let subtext0 = rgb(p.subtext0.0, p.subtext0.1, p.subtext0.2);
    let overlay0 = rgb(p.overlay0.0, p.overlay0.1, p.overlay0.2);
    let blue = rgb(p.blue.0, p.blue.1, p.blue.2);
    let green = rgb(p.green.0, p.green.1, p.green.2);
    let red = rgb(p.red.0, p.red.1, p.red.2);

    let line_t = if is_light { 0.18 } else { 0.20 };
    let word_t = if is_light { 0.30 } else { 0.28 };
    let hunk_t = if is_light { 0.16 } else { 0.22 };

    ThemeSpec {
        name,
        palette: Palette {
            bg_file_header: mantle,
            bg_addition_margin: blend(base, green, line_t),
            bg_deletion_margin: blend(base, red, line_t),
            bg_addition_line: blend(base, green, line_t * 0.75),
            bg_deletion_line: blend(base, red, line_t * 0.75),
            bg_addition_word: blend(base, green, word_t),
            bg_deletion_word: blend(base, red, word_t),
            bg_hunk_header: blend(base, blue, hunk_t),
            bg_empty: mantle,
            fg_default: text,
            fg_muted: subtext0,
            fg_addition: green,
            fg_deletion: red,
            fg_line_num: overlay0,
            fg_hunk: blue,
            fg_path: blue,
            fg_border: if is_light { surface2 } else { overlay0 },
        },
    }
}

fn catppuccin_mocha() -> ThemeSpec {
    catppuccin_theme(
        "catppuccin-mocha",
        CatppuccinPalette {
            base: (30, 30, 46),
            mantle: (24, 24, 37),
            surface2: (88, 91, 112),
            text: (205, 214, 244),
            subtext0: (166, 173, 200),
            overlay0: (108, 112, 134),
            blue: (137, 180, 250),
            green: (166, 227, 161),
            red: (243, 139, 168),
        },
        false,
    )
}

fn catppuccin_latte() -> ThemeSpec {
    catppuccin_theme(
        "catppuccin-latte",
        CatppuccinPalette {
            base: (239, 241, 245),
            mantle: (230, 233, 239),
            surface2: (172, 176, 190),
            text: (76, 79, 105),
            subtext0: (108, 111, 133),
            overlay0: (156, 160, 176),
            blue: (30, 102, 245),
            green: (64, 160, 43),
            red: (210, 15, 57),
        },
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_themes() {
        let names = available_themes();
        assert!(names.contains(&"github-dark".to_string()));
        assert!(names.contains(&"catppuccin-mocha".to_string()));
    }

    #[test]
    fn aliases_resolve_to_canonical_names() {
        assert_eq!(find_theme("Dark").map(|t| t.name), Some("github-dark"));
        assert_eq!(find_theme("catppuccin_latte").map(|t| t.name), Some("catppuccin-latte"));
        assert!(find_theme("solarized").is_none());
        assert_eq!(resolve("solarized").name, DEFAULT_THEME);
    }

    #[test]
    fn next_theme_cycles_through_all() {
        let mut name = DEFAULT_THEME;
        let mut seen = Vec::new();
        for _ in 0..THEME_ORDER.len() {
            name = next_theme(name);
            seen.push(name);
        }
        assert_eq!(seen.last(), Some(&DEFAULT_THEME));
        assert_eq!(seen.len(), THEME_ORDER.len());
    }
}
