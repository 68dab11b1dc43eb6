//! Main UI layout and rendering for the TUI dashboard.
//!
//! The layout consists of:
//!
//! - **Header**: Title, connected count and current time
//! - **Main content**: Printer list (left) and status or file panel (right)
//! - **Status bar**: Key hints or the latest status message

pub mod colors;

mod dashboard;

use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::app::App;

/// Draw the complete TUI interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, main_layout[0], app);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(1)])
        .split(main_layout[1]);

    dashboard::draw_printer_list(frame, content_layout[0], app);
    if app.show_files {
        dashboard::draw_files_panel(frame, content_layout[1], app);
    } else {
        dashboard::draw_status_panel(frame, content_layout[1], app);
    }

    draw_status_bar(frame, main_layout[2], app);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the header bar with app title and quick stats.
fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let time_str = Local::now().format("%H:%M:%S").to_string();
    let stats = format!(
        "{}/{} connected",
        app.connected_count(),
        app.printers.len()
    );

    let left = Line::from(vec![
        Span::styled(
            " Bambu Printers ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(stats, Style::default().fg(Color::Gray)),
    ]);
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(area);
    frame.render_widget(Paragraph::new(left), layout[0]);
    frame.render_widget(
        Paragraph::new(format!("{time_str} "))
            .alignment(Alignment::Right)
            .style(Style::default().fg(Color::DarkGray)),
        layout[1],
    );
}

/// Key hints shown when there is no status message.
const HINTS: [(&str, &str); 6] = [
    ("c", "connect"),
    ("C", "all"),
    ("d", "disconnect"),
    ("f", "files"),
    ("?", "help"),
    ("q", "quit"),
];

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let spans = if app.is_any_connecting() {
        vec![
            Span::styled(
                format!(" {} ", app.spinner_char()),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                app.current_status_message().unwrap_or("Connecting..."),
                Style::default().fg(Color::Gray),
            ),
        ]
    } else if let Some(msg) = app.current_status_message() {
        vec![Span::styled(
            format!(" {msg}"),
            Style::default().fg(Color::Gray),
        )]
    } else {
        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in HINTS.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(
                *key,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::Gray),
            ));
        }
        spans
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn shortcut_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{key:>8}  "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(desc),
    ])
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();
    let width = 44u16.min(area.width.saturating_sub(2));
    let height = 14u16.min(area.height.saturating_sub(2));
    let help_area = Rect::new(
        area.width.saturating_sub(width) / 2,
        area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, help_area);

    let lines = vec![
        Line::from(""),
        shortcut_line("j / ↓", "Next printer"),
        shortcut_line("k / ↑", "Previous printer"),
        shortcut_line("c/Enter", "Connect selected"),
        shortcut_line("C", "Connect all"),
        shortcut_line("d", "Disconnect selected"),
        shortcut_line("f", "Print files / status"),
        shortcut_line("Esc", "Close"),
        shortcut_line("?", "Toggle help"),
        shortcut_line("q", "Quit"),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help "),
        ),
        help_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PrinterConfig};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        let (_tx, rx) = mpsc::channel(1);
        let config = Config {
            printers: vec![PrinterConfig::new("Workshop", "192.0.2.1", "x")],
        };
        App::new(&config, rx)
    }

    #[test]
    fn test_draw_dashboard() {
        let screen = render(&app());
        assert!(screen.contains("Bambu Printers"));
        assert!(screen.contains("0/1 connected"));
        assert!(screen.contains("Workshop"));
        assert!(screen.contains("Not connected"));
    }

    #[test]
    fn test_draw_help_overlay() {
        let mut app = app();
        app.show_help = true;
        assert!(render(&app).contains("Connect all"));
    }
}
