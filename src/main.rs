//! flixtui - terminal client for a Netflix-style streaming catalogue
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! flixtui
//!
//! # CLI mode (for automation)
//! flixtui login -e neo@matrix.io -p hunter22
//! flixtui list my-list --json
//! ```

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use flixtui::app::{App, Services};
use flixtui::cli::{Cli, ExitCode, Output};
use flixtui::commands;
use flixtui::config::Config;
use flixtui::telemetry::{self, LogTarget};
use flixtui::ui;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.is_cli_mode() {
        // CLI mode: execute command and exit
        telemetry::init(config.log_level(), &LogTarget::Stderr)?;
        let exit_code = run_cli(cli, config).await;
        std::process::exit(exit_code.into());
    } else {
        // TUI mode: logs go to a file so they don't tear the screen
        telemetry::init(config.log_level(), &LogTarget::file_in(&config.data_dir()))?;
        run_tui(config, cli.offline).await
    }
}

/// Config from `--config`, or the default location; env overrides either way
fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(|name| std::env::var(name).ok());
            Ok(config)
        }
        None => Ok(Config::load()),
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: Config) -> ExitCode {
    let output = Output::new(&cli);
    let Some(command) = cli.command else {
        return ExitCode::Success;
    };

    let (mut services, mut store) = Services::connect(&config, cli.offline);
    store.rehydrate();
    commands::dispatch(command, &mut services, &mut store, &output).await
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI
async fn run_tui(config: Config, offline: bool) -> Result<()> {
    let (mut services, store) = Services::connect(&config, offline);
    let mut app = App::new(store);

    let mut terminal = init_terminal()?;

    let result = run_event_loop(&mut terminal, &mut app, &mut services).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    if let Err(ref e) = result {
        error!(error = %e, "tui exited with error");
    }
    result
}

/// Main event loop - handles input, runs effects, renders UI
async fn run_event_loop(terminal: &mut Tui, app: &mut App, services: &mut Services) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    // First frame shows the loading screen while the snapshot is read
    terminal.draw(|frame| ui::render(frame, app))?;
    app.store.rehydrate();
    app.restore_editors();
    services.attach(app).await;
    info!(signed_in = app.user.is_some(), "tui started");

    while app.running {
        services.keep_alive(app).await;
        app.sync_lists();
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    if let Some(effect) = app.handle_key(key) {
                        // Show the busy marker before awaiting the backend
                        app.busy = true;
                        terminal.draw(|frame| ui::render(frame, app))?;
                        services.execute(app, effect).await;
                    }
                }
            }
        }
    }

    Ok(())
}
