//! diffscroll - scroll through large diffs in the terminal.
//!
//! Only the rows on screen are rendered, and rendered rows are kept in a
//! bounded cache, so diffs with hundreds of thousands of lines stay smooth.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::DisableMouseCapture,
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};
use diffscroll::adapters::{CrosstermTerminal, DiffTarget, Git2Patch, Git2Repo};
use diffscroll::app::App;
use diffscroll::config::Config;
use diffscroll::logging;
use diffscroll::ports::DiffSource;
use std::io::{self, Read};
use std::panic;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "diffscroll")]
#[command(about = "Scroll through git diffs without rendering all of them")]
#[command(version)]
struct Args {
    /// Path to git repository (default: current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Read a unified diff from a file instead of a repository ("-" for stdin)
    #[arg(long, conflicts_with_all = ["path", "from", "to"])]
    patch: Option<PathBuf>,

    /// Revision to diff from (default: HEAD against the working tree)
    #[arg(long)]
    from: Option<String>,

    /// Revision to diff to (default: the working tree)
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Color theme
    #[arg(short, long)]
    theme: Option<String>,

    /// Start in side-by-side mode
    #[arg(short, long)]
    side_by_side: bool,

    /// Maximum number of cached rows
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Maximum bytes of cached rows
    #[arg(long)]
    cache_max_bytes: Option<usize>,

    /// Rows rendered ahead above and below the screen
    #[arg(long)]
    buffer_lines: Option<usize>,

    /// Skip word-level highlighting
    #[arg(long)]
    no_word_diff: bool,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(theme) = &self.theme {
            config.set_theme(theme);
        }
        if self.side_by_side {
            config.view_mode = diffscroll::content::ViewMode::SideBySide;
        }
        if let Some(n) = self.cache_capacity {
            config.cache_capacity = n;
        }
        if let Some(n) = self.cache_max_bytes {
            config.cache_max_bytes = n;
        }
        if let Some(n) = self.buffer_lines {
            config.buffer_lines = n;
        }
        if self.no_word_diff {
            config.word_diff_budget_ms = 0;
        }
    }

    fn source(&self) -> Result<Box<dyn DiffSource>> {
        if let Some(patch) = &self.patch {
            if patch.as_os_str() == "-" {
                let mut bytes = Vec::new();
                io::stdin()
                    .read_to_end(&mut bytes)
                    .context("Failed to read patch from stdin")?;
                return Ok(Box::new(Git2Patch::from_bytes("stdin", bytes)));
            }
            return Ok(Box::new(Git2Patch::from_path(patch)?));
        }

        let repo = match &self.path {
            Some(path) => Git2Repo::open(path),
            None => Git2Repo::open_current_dir(),
        }
        .context("Failed to open git repository. Are you in a git directory?")?;

        let target = match &self.from {
            Some(from) => DiffTarget::Range {
                from: from.clone(),
                to: self.to.clone(),
            },
            None => DiffTarget::WorkingTree,
        };
        Ok(Box::new(repo.with_target(target)))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_themes {
        for name in diffscroll::ui::theme::available_themes() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Logging goes to a file; the terminal belongs to the UI.
    let _log_guard = match logging::log_dir().and_then(|dir| logging::init(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Could not initialize logging: {:#}", e);
            None
        }
    };

    let mut config = Config::load();
    config.apply_env(|key| std::env::var(key).ok());
    args.apply(&mut config);
    tracing::debug!(?config, "effective config");

    let source = args.source()?;

    // Set up panic hook to restore terminal on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut app = App::new(source.as_ref(), config).context("Failed to load diff")?;
    // A theme forced on the command line is not remembered.
    app.persist_theme = args.theme.is_none();

    let mut terminal = CrosstermTerminal::new().context("Failed to initialize terminal")?;
    let result = app.run(&mut terminal, source.as_ref());

    // Terminal cleanup happens in Drop

    result
}
