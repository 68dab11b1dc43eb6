//! Main entry point for the TUI dashboard.
//!
//! This module ties together the TUI components:
//!
//! - Terminal setup and restoration
//! - Channel creation for worker communication
//! - The main event loop with input handling and rendering
//! - Graceful shutdown coordination

pub mod app;
pub mod input;
pub mod messages;
pub mod ui;
pub mod worker;

pub use app::App;
pub use messages::{Command, UiEvent};
pub use worker::PrinterWorker;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bambu_core::PrinterManager;

use crate::config::Config;

/// Set up the terminal for TUI rendering.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Send tracing output to a file, since the terminal belongs to the UI.
///
/// Honors `RUST_LOG` and defaults to `info`. If the file cannot be created
/// logging stays disabled.
pub fn init_file_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = File::create(path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

/// Run the TUI application.
///
/// Spawns the background worker for the configured printers, connects them
/// all and runs the event loop until the user quits.
pub async fn run(config: Config) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(32);
    let (event_tx, event_rx) = mpsc::channel::<UiEvent>(64);

    let manager = Arc::new(PrinterManager::new());
    let worker = PrinterWorker::new(cmd_rx, event_tx, manager);
    worker.register(&config).await;
    info!(printers = config.printers.len(), "Starting dashboard");
    let worker_handle = tokio::spawn(worker.run());

    let mut app = App::new(&config, event_rx);
    let mut terminal = setup_terminal()?;

    if !config.printers.is_empty() {
        let _ = cmd_tx.try_send(Command::ConnectAll);
    }

    let result = run_event_loop(&mut terminal, &mut app, &cmd_tx).await;

    let _ = cmd_tx.send(Command::Shutdown).await;
    restore_terminal()?;

    if let Err(e) = worker_handle.await {
        warn!(error = %e, "Worker task failed");
    }
    result
}

/// Main event loop for the TUI.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    command_tx: &mpsc::Sender<Command>,
) -> Result<()> {
    while !app.should_quit() {
        app.tick_spinner();
        app.clean_expired_messages();

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key(key.code, app.show_help);
            if let Some(cmd) = input::apply_action(app, action) {
                let _ = command_tx.try_send(cmd);
            }
        }

        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_ui_event(event);
        }
    }

    Ok(())
}
