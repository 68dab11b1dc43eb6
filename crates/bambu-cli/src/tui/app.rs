//! Application state for the TUI.
//!
//! Tracks one [`PrinterView`] per configured printer, the selection, status
//! messages and overlay visibility. All updates arrive as [`UiEvent`]s from
//! the worker.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use bambu_core::{ConnectionState, PrintFile, PrinterSnapshot};

use super::messages::UiEvent;
use crate::config::Config;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// State for a single printer.
#[derive(Debug, Clone)]
pub struct PrinterView {
    pub name: String,
    pub ip: String,
    pub connection: ConnectionState,
    /// Latest field values; `None` until the first report.
    pub snapshot: Option<PrinterSnapshot>,
    /// Last connect or listing error.
    pub error: Option<String>,
    /// Result of the last file listing.
    pub files: Option<Vec<PrintFile>>,
    /// When the session last became connected.
    pub connected_at: Option<Instant>,
}

impl PrinterView {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            connection: ConnectionState::Disconnected,
            snapshot: None,
            error: None,
            files: None,
            connected_at: None,
        }
    }

    /// Uptime of the current session as `1h 02m` or `3m 05s`.
    pub fn uptime(&self) -> Option<String> {
        let elapsed = self.connected_at?.elapsed().as_secs();
        let (hours, mins, secs) = (elapsed / 3600, (elapsed % 3600) / 60, elapsed % 60);
        Some(if hours > 0 {
            format!("{hours}h {mins:02}m")
        } else {
            format!("{mins}m {secs:02}s")
        })
    }
}

pub struct App {
    pub printers: Vec<PrinterView>,
    pub selected: usize,
    pub should_quit: bool,
    pub show_help: bool,
    /// Show the file list of the selected printer instead of its status.
    pub show_files: bool,
    pub status_messages: Vec<(String, Instant)>,
    pub spinner_frame: usize,
    pub event_rx: mpsc::Receiver<UiEvent>,
}

impl App {
    pub fn new(config: &Config, event_rx: mpsc::Receiver<UiEvent>) -> Self {
        Self {
            printers: config
                .printers
                .iter()
                .map(|p| PrinterView::new(p.display_name(), p.ip_address.clone()))
                .collect(),
            selected: 0,
            should_quit: false,
            show_help: false,
            show_files: false,
            status_messages: Vec::new(),
            spinner_frame: 0,
            event_rx,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Push a status message, keeping at most five.
    pub fn push_status_message(&mut self, message: String) {
        self.status_messages.push((message, Instant::now()));
        while self.status_messages.len() > 5 {
            self.status_messages.remove(0);
        }
    }

    /// Remove expired status messages.
    pub fn clean_expired_messages(&mut self) {
        self.status_messages
            .retain(|(_, created)| created.elapsed() < STATUS_MESSAGE_TIMEOUT);
    }

    pub fn current_status_message(&self) -> Option<&str> {
        self.status_messages.last().map(|(msg, _)| msg.as_str())
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 10;
    }

    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.spinner_frame]
    }

    pub fn selected_printer(&self) -> Option<&PrinterView> {
        self.printers.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.printers.is_empty() {
            self.selected = (self.selected + 1) % self.printers.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.printers.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.printers.len() - 1);
        }
    }

    pub fn connected_count(&self) -> usize {
        self.printers
            .iter()
            .filter(|p| p.connection == ConnectionState::Connected)
            .count()
    }

    pub fn is_any_connecting(&self) -> bool {
        self.printers.iter().any(|p| {
            matches!(
                p.connection,
                ConnectionState::Connecting | ConnectionState::AwaitingFirstReport
            )
        })
    }

    fn printer_mut(&mut self, ip: &str) -> Option<&mut PrinterView> {
        self.printers.iter_mut().find(|p| p.ip == ip)
    }

    /// Apply an update from the worker.
    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::ConnectionChanged { ip, state } => {
                let Some(printer) = self.printer_mut(&ip) else {
                    return;
                };
                printer.connection = state;
                let message = match state {
                    ConnectionState::Connected => {
                        printer.connected_at = Some(Instant::now());
                        printer.error = None;
                        Some(format!("{} connected", printer.name))
                    }
                    ConnectionState::Disconnected => {
                        printer.connected_at = None;
                        Some(format!("{} disconnected", printer.name))
                    }
                    _ => None,
                };
                if let Some(message) = message {
                    self.push_status_message(message);
                }
            }
            UiEvent::SnapshotUpdated { ip, snapshot } => {
                if let Some(printer) = self.printer_mut(&ip) {
                    printer.snapshot = Some(snapshot);
                }
            }
            UiEvent::ConnectFailed { ip, error } => {
                let Some(printer) = self.printer_mut(&ip) else {
                    return;
                };
                let message = format!("{}: {error}", printer.name);
                printer.error = Some(error);
                self.push_status_message(message);
            }
            UiEvent::FilesListed { ip, files } => {
                let Some(printer) = self.printer_mut(&ip) else {
                    return;
                };
                let message = format!("{}: {} print file(s)", printer.name, files.len());
                printer.files = Some(files);
                self.push_status_message(message);
            }
            UiEvent::FilesFailed { ip, error } => {
                let Some(printer) = self.printer_mut(&ip) else {
                    return;
                };
                let message = format!("{}: listing failed: {error}", printer.name);
                printer.error = Some(error);
                self.push_status_message(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrinterConfig;

    fn app() -> App {
        let (_tx, rx) = mpsc::channel(1);
        let config = Config {
            printers: vec![
                PrinterConfig::new("Workshop", "192.0.2.1", "x"),
                PrinterConfig::new("", "192.0.2.2", "y"),
            ],
        };
        App::new(&config, rx)
    }

    #[test]
    fn test_new_uses_display_names() {
        let app = app();
        assert_eq!(app.printers[0].name, "Workshop");
        assert_eq!(app.printers[1].name, "192.0.2.2");
        assert_eq!(app.connected_count(), 0);
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = app();
        app.select_previous();
        assert_eq!(app.selected, 1);
        app.select_next();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_connection_events() {
        let mut app = app();
        app.handle_ui_event(UiEvent::ConnectionChanged {
            ip: "192.0.2.1".to_string(),
            state: ConnectionState::AwaitingFirstReport,
        });
        assert!(app.is_any_connecting());

        app.handle_ui_event(UiEvent::ConnectionChanged {
            ip: "192.0.2.1".to_string(),
            state: ConnectionState::Connected,
        });
        assert_eq!(app.connected_count(), 1);
        assert!(app.printers[0].uptime().is_some());
        assert_eq!(app.current_status_message(), Some("Workshop connected"));
    }

    #[test]
    fn test_snapshot_and_failures() {
        let mut app = app();
        app.handle_ui_event(UiEvent::SnapshotUpdated {
            ip: "192.0.2.2".to_string(),
            snapshot: PrinterSnapshot {
                progress: 42,
                ..PrinterSnapshot::default()
            },
        });
        assert_eq!(app.printers[1].snapshot.as_ref().map(|s| s.progress), Some(42));

        app.handle_ui_event(UiEvent::ConnectFailed {
            ip: "192.0.2.1".to_string(),
            error: "timed out".to_string(),
        });
        assert_eq!(app.printers[0].error.as_deref(), Some("timed out"));

        // Unknown printers are ignored.
        app.handle_ui_event(UiEvent::FilesListed {
            ip: "203.0.113.7".to_string(),
            files: Vec::new(),
        });
    }

    #[test]
    fn test_status_messages_are_capped() {
        let mut app = app();
        for i in 0..8 {
            app.push_status_message(format!("m{i}"));
        }
        assert_eq!(app.status_messages.len(), 5);
        assert_eq!(app.current_status_message(), Some("m7"));
    }
}
