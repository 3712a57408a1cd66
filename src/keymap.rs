//! Context-based keymap.
//!
//! Bindings are matched against the active contexts, with more specific
//! contexts winning. The help overlay is the only context above Global.

use crate::ports::{KeyCode, KeyModifiers};

/// Contexts that can be active. Higher discriminant = more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global = 0,
    /// Help overlay is shown
    Help = 1,
}

impl Context {
    pub fn specificity(self) -> u8 {
        self as u8
    }
}

/// Categories for grouping keybindings in help display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HelpCategory {
    Scrolling = 0,
    Jumping = 1,
    View = 2,
    General = 3,
}

impl HelpCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            HelpCategory::Scrolling => "Scrolling",
            HelpCategory::Jumping => "Jumping",
            HelpCategory::View => "View",
            HelpCategory::General => "General",
        }
    }
}

/// Actions that can be triggered by key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Scrolling
    LineDown,
    LineUp,
    HalfPageDown,
    HalfPageUp,
    PageDown,
    PageUp,
    GotoTop,
    GotoBottom,

    // Jumping
    NextFile,
    PrevFile,
    NextHunk,
    PrevHunk,

    // View
    ToggleSideBySide,
    CycleTheme,
    Reload,

    // General
    ShowHelp,
    DismissHelp,
    Quit,
}

/// A single key binding with optional context requirement.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    /// If Some, binding only active in this context. None = Global.
    pub context: Option<Context>,
    pub action: Action,
    /// Description for help display. If None, binding is hidden from help.
    pub help_text: Option<&'static str>,
    pub category: Option<HelpCategory>,
}

impl KeyBinding {
    pub fn new(key: KeyCode, action: Action) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
            context: None,
            action,
            help_text: None,
            category: None,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn in_context(mut self, ctx: Context) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn help(mut self, category: HelpCategory, text: &'static str) -> Self {
        self.category = Some(category);
        self.help_text = Some(text);
        self
    }
}

/// Entry for help display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub key_display: String,
    pub description: &'static str,
}

#[derive(Debug, Default)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later bindings take precedence at the same specificity.
    pub fn bind(&mut self, binding: KeyBinding) {
        self.bindings.push(binding);
    }

    /// Action for a key in the most specific active context.
    pub fn lookup(&self, key: KeyCode, modifiers: KeyModifiers, active: &[Context]) -> Option<Action> {
        let mut best: Option<(u8, Action)> = None;

        for binding in self.bindings.iter().rev() {
            if binding.key != key || binding.modifiers.ctrl != modifiers.ctrl {
                continue;
            }
            let specificity = match binding.context {
                None => 0,
                Some(ctx) if active.contains(&ctx) => ctx.specificity(),
                Some(_) => continue,
            };
            match best {
                Some((best_spec, _)) if specificity <= best_spec => {}
                _ => best = Some((specificity, binding.action)),
            }
        }

        best.map(|(_, action)| action)
    }

    /// Help entries grouped by category, first binding per key wins.
    pub fn help_entries(&self) -> Vec<(HelpCategory, Vec<HelpEntry>)> {
        use std::collections::{BTreeMap, HashSet};

        let mut by_category: BTreeMap<HelpCategory, Vec<HelpEntry>> = BTreeMap::new();
        let mut seen: HashSet<String> = HashSet::new();

        for binding in &self.bindings {
            let (Some(category), Some(text)) = (binding.category, binding.help_text) else {
                continue;
            };
            let key_display = format_key_display(binding.key, binding.modifiers);
            if !seen.insert(key_display.clone()) {
                continue;
            }
            by_category.entry(category).or_default().push(HelpEntry {
                key_display,
                description: text,
            });
        }

        by_category.into_iter().collect()
    }
}

fn format_key_display(key: KeyCode, modifiers: KeyModifiers) -> String {
    let key_str = match key {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
    };
    if modifiers.ctrl {
        format!("Ctrl+{}", key_str)
    } else {
        key_str
    }
}

/// Build the default keymap with all bindings.
pub fn build_default_keymap() -> Keymap {
    use HelpCategory::*;

    let mut km = Keymap::new();
    let key = |k: KeyCode, a: Action| KeyBinding::new(k, a);
    let ch = |c: char, a: Action| KeyBinding::new(KeyCode::Char(c), a);

    // === Scrolling ===
    km.bind(ch('j', Action::LineDown).help(Scrolling, "Line down"));
    km.bind(ch('k', Action::LineUp).help(Scrolling, "Line up"));
    km.bind(ch('d', Action::HalfPageDown).with_ctrl().help(Scrolling, "Half page down"));
    km.bind(ch('u', Action::HalfPageUp).with_ctrl().help(Scrolling, "Half page up"));
    km.bind(ch(' ', Action::PageDown).help(Scrolling, "Page down"));
    km.bind(ch('b', Action::PageUp).help(Scrolling, "Page up"));
    km.bind(ch('g', Action::GotoTop).help(Scrolling, "Top"));
    km.bind(ch('G', Action::GotoBottom).help(Scrolling, "Bottom"));

    // === Jumping ===
    km.bind(ch('n', Action::NextFile).help(Jumping, "Next file"));
    km.bind(ch('p', Action::PrevFile).help(Jumping, "Previous file"));
    km.bind(ch(']', Action::NextHunk).help(Jumping, "Next hunk"));
    km.bind(ch('[', Action::PrevHunk).help(Jumping, "Previous hunk"));

    // === View ===
    km.bind(ch('s', Action::ToggleSideBySide).help(View, "Toggle side-by-side"));
    km.bind(ch('t', Action::CycleTheme).help(View, "Next theme"));
    km.bind(ch('r', Action::Reload).help(View, "Reload diff"));

    // === General ===
    km.bind(ch('?', Action::ShowHelp).help(General, "Toggle help"));
    km.bind(ch('q', Action::Quit).help(General, "Quit"));

    // Alternatives, hidden from help
    km.bind(key(KeyCode::Down, Action::LineDown));
    km.bind(key(KeyCode::Up, Action::LineUp));
    km.bind(key(KeyCode::Enter, Action::LineDown));
    km.bind(key(KeyCode::PageDown, Action::PageDown));
    km.bind(key(KeyCode::PageUp, Action::PageUp));
    km.bind(key(KeyCode::Home, Action::GotoTop));
    km.bind(key(KeyCode::End, Action::GotoBottom));
    km.bind(ch('c', Action::Quit).with_ctrl());

    // === Help overlay ===
    km.bind(key(KeyCode::Esc, Action::DismissHelp).in_context(Context::Help));
    km.bind(ch('?', Action::DismissHelp).in_context(Context::Help));
    km.bind(ch('q', Action::DismissHelp).in_context(Context::Help));

    km
}
