//! Termscope Entry Point
//!
//! Launches the terminal UI for watching a remote virtual machine's
//! text console.
//!
//! Configuration priority: CLI flags > environment > config file >
//! built-in defaults.

use std::io;
use std::panic;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use termscope_core::{load_config, WatchConfig};
use termscope_tui::App;

/// Watch a remote VM text console and highlight what changed.
#[derive(Parser, Debug)]
#[command(name = "termscope", version, about)]
struct Cli {
    /// Path to the config file (default: XDG config dir)
    #[arg(short, long, env = "TERMSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between automatic samples
    #[arg(long)]
    interval: Option<f64>,

    /// Recognizer command to invoke for each capture
    #[arg(long)]
    recognizer_cmd: Option<String>,

    /// Enable per-cell color sampling
    #[arg(long)]
    color: bool,

    /// Show a line number gutter
    #[arg(long)]
    line_numbers: bool,

    /// Hide blank console rows
    #[arg(long)]
    filter_blank: bool,
}

impl Cli {
    /// Layer CLI flags over the loaded configuration.
    fn apply(&self, config: &mut WatchConfig) {
        if let Some(interval) = self.interval {
            config.refresh_interval_secs = interval;
        }
        if let Some(command) = &self.recognizer_cmd {
            config.recognizer.command.clone_from(command);
        }
        if self.color {
            config.color_mode = true;
        }
        if self.line_numbers {
            config.show_line_numbers = true;
        }
        if self.filter_blank {
            config.filter_blank_lines = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: termscope requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = App::new(config).run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}
