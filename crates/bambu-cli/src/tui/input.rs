//! Keyboard input handling for the TUI.
//!
//! # Key Bindings
//!
//! | Key       | Action                     |
//! |-----------|----------------------------|
//! | `q`       | Quit                       |
//! | `c`       | Connect selected printer   |
//! | `C`       | Connect all printers       |
//! | `d`       | Disconnect selected        |
//! | `f`       | List files / back          |
//! | `↓` / `j` | Select next                |
//! | `↑` / `k` | Select previous            |
//! | `?`       | Toggle help                |
//! | `Esc`     | Close overlay              |

use crossterm::event::KeyCode;

use bambu_core::ConnectionState;

use super::app::App;
use super::messages::Command;

/// User actions triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Connect,
    ConnectAll,
    Disconnect,
    /// Toggle the file list, fetching it when opening.
    ToggleFiles,
    SelectNext,
    SelectPrevious,
    ToggleHelp,
    /// Close the help overlay or file list.
    Close,
    None,
}

/// Map a key to an action. While the help overlay is open any key closes it.
pub fn handle_key(key: KeyCode, help_open: bool) -> Action {
    if help_open {
        return match key {
            KeyCode::Char('q') => Action::Quit,
            _ => Action::Close,
        };
    }

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('c') | KeyCode::Enter => Action::Connect,
        KeyCode::Char('C') => Action::ConnectAll,
        KeyCode::Char('d') => Action::Disconnect,
        KeyCode::Char('f') => Action::ToggleFiles,
        KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
        KeyCode::Up | KeyCode::Char('k') => Action::SelectPrevious,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Esc => Action::Close,
        _ => Action::None,
    }
}

/// Apply an action to the app, returning a command for the worker if needed.
pub fn apply_action(app: &mut App, action: Action) -> Option<Command> {
    match action {
        Action::Quit => {
            app.should_quit = true;
            None
        }
        Action::Connect => {
            let printer = app.selected_printer()?;
            if printer.connection != ConnectionState::Disconnected {
                return None;
            }
            let ip = printer.ip.clone();
            app.push_status_message(format!("Connecting to {ip}..."));
            Some(Command::Connect { ip })
        }
        Action::ConnectAll => {
            let count = app
                .printers
                .iter()
                .filter(|p| p.connection == ConnectionState::Disconnected)
                .count();
            app.push_status_message(format!("Connecting {count} printer(s)..."));
            Some(Command::ConnectAll)
        }
        Action::Disconnect => app
            .selected_printer()
            .filter(|p| p.connection != ConnectionState::Disconnected)
            .map(|p| Command::Disconnect { ip: p.ip.clone() }),
        Action::ToggleFiles => {
            app.show_files = !app.show_files;
            if !app.show_files {
                return None;
            }
            let ip = app.selected_printer()?.ip.clone();
            app.push_status_message(format!("Listing files on {ip}..."));
            Some(Command::ListFiles { ip })
        }
        Action::SelectNext => {
            app.select_next();
            None
        }
        Action::SelectPrevious => {
            app.select_previous();
            None
        }
        Action::ToggleHelp => {
            app.show_help = !app.show_help;
            None
        }
        Action::Close => {
            if app.show_help {
                app.show_help = false;
            } else {
                app.show_files = false;
            }
            None
        }
        Action::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PrinterConfig};
    use tokio::sync::mpsc;

    fn app() -> App {
        let (_tx, rx) = mpsc::channel(1);
        let config = Config {
            printers: vec![PrinterConfig::new("X1C", "192.0.2.1", "x")],
        };
        App::new(&config, rx)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(handle_key(KeyCode::Char('q'), false), Action::Quit);
        assert_eq!(handle_key(KeyCode::Char('c'), false), Action::Connect);
        assert_eq!(handle_key(KeyCode::Char('C'), false), Action::ConnectAll);
        assert_eq!(handle_key(KeyCode::Char('j'), false), Action::SelectNext);
        assert_eq!(handle_key(KeyCode::Char('z'), false), Action::None);
    }

    #[test]
    fn test_help_open_closes_on_any_key() {
        assert_eq!(handle_key(KeyCode::Char('c'), true), Action::Close);
        assert_eq!(handle_key(KeyCode::Char('q'), true), Action::Quit);
    }

    #[test]
    fn test_connect_only_when_disconnected() {
        let mut app = app();
        assert_eq!(
            apply_action(&mut app, Action::Connect),
            Some(Command::Connect {
                ip: "192.0.2.1".to_string()
            })
        );
        app.printers[0].connection = ConnectionState::Connected;
        assert_eq!(apply_action(&mut app, Action::Connect), None);
        assert_eq!(
            apply_action(&mut app, Action::Disconnect),
            Some(Command::Disconnect {
                ip: "192.0.2.1".to_string()
            })
        );
    }

    #[test]
    fn test_toggle_files() {
        let mut app = app();
        assert!(matches!(
            apply_action(&mut app, Action::ToggleFiles),
            Some(Command::ListFiles { .. })
        ));
        assert!(app.show_files);
        assert_eq!(apply_action(&mut app, Action::Close), None);
        assert!(!app.show_files);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        apply_action(&mut app, Action::Quit);
        assert!(app.should_quit());
    }
}
