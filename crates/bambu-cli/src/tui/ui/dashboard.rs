//! Dashboard panels: printer list, status panel and file list.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};

use bambu_core::{ConnectionState, PrinterSnapshot};

use super::colors::{color_name, connection_color, contrasting_background, hex_to_color, state_color};
use crate::format::{format_layers, format_remaining, format_size, format_timestamp};
use crate::tui::app::{App, PrinterView};

fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(format!("{text:<12}"), Style::default().fg(Color::Gray))
}

/// Draw the printer list panel.
pub(super) fn draw_printer_list(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .printers
        .iter()
        .enumerate()
        .map(|(i, printer)| {
            let icon = match printer.connection {
                ConnectionState::Connected => "*",
                ConnectionState::Connecting | ConnectionState::AwaitingFirstReport => {
                    app.spinner_char()
                }
                _ if printer.error.is_some() => "x",
                _ => "o",
            };
            let icon_color = if printer.error.is_some()
                && printer.connection == ConnectionState::Disconnected
            {
                Color::Red
            } else {
                connection_color(printer.connection)
            };

            let is_selected = i == app.selected;
            let name_style = if is_selected {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };

            let mut lines = vec![Line::from(vec![
                Span::styled(
                    if is_selected { "> " } else { "  " },
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(icon, Style::default().fg(icon_color)),
                Span::raw(" "),
                Span::styled(printer.name.chars().take(22).collect::<String>(), name_style),
            ])];
            let mut detail = format!("    {}", printer.ip);
            if let Some(uptime) = printer.uptime() {
                detail.push_str(&format!(" ({uptime})"));
            }
            lines.push(Line::styled(detail, Style::default().fg(Color::DarkGray)));
            ListItem::new(lines)
        })
        .collect();

    let title = format!(" Printers ({}) ", app.printers.len());
    if items.is_empty() {
        let hint = Paragraph::new("No printers configured.\nAdd one with `bambu add`.")
            .style(Style::default().fg(Color::DarkGray))
            .block(panel(title));
        frame.render_widget(hint, area);
        return;
    }
    frame.render_widget(List::new(items).block(panel(title)), area);
}

/// Draw the status of the selected printer.
pub(super) fn draw_status_panel(frame: &mut Frame, area: Rect, app: &App) {
    let Some(printer) = app.selected_printer() else {
        frame.render_widget(panel(" Status ".to_string()), area);
        return;
    };
    let block = panel(format!(" {} ", printer.name));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(snapshot) = &printer.snapshot else {
        let text = match (&printer.error, printer.connection) {
            (Some(error), ConnectionState::Disconnected) => Line::styled(
                format!("Connection failed: {error}"),
                Style::default().fg(Color::Red),
            ),
            (_, ConnectionState::Disconnected) => {
                Line::raw("Not connected. Press c to connect.")
            }
            _ => Line::raw("Waiting for data..."),
        };
        frame.render_widget(Paragraph::new(text), inner);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Connection and state
            Constraint::Length(1), // Progress gauge
            Constraint::Min(1),    // Details
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(state_line(printer, snapshot)), layout[0]);

    let progress = snapshot.progress.clamp(0, 100);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(state_color(snapshot.state)))
        .percent(u16::try_from(progress).unwrap_or(0))
        .label(format!("{progress}%"));
    frame.render_widget(gauge, layout[1]);

    frame.render_widget(Paragraph::new(detail_lines(snapshot)), layout[2]);
}

fn state_line(printer: &PrinterView, snapshot: &PrinterSnapshot) -> Line<'static> {
    Line::from(vec![
        label("State:"),
        Span::styled(
            snapshot.state.to_string(),
            Style::default()
                .fg(state_color(snapshot.state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            printer.connection.to_string(),
            Style::default().fg(connection_color(printer.connection)),
        ),
    ])
}

fn detail_lines(snapshot: &PrinterSnapshot) -> Vec<Line<'static>> {
    let file = if snapshot.current_file.is_empty() {
        "None".to_string()
    } else {
        snapshot.current_file.clone()
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![label("File:"), Span::raw(file)]),
        Line::from(vec![
            label("Bed Temp:"),
            Span::raw(format!("{:.1}°C", snapshot.bed_temperature)),
        ]),
        Line::from(vec![
            label("Nozzle Temp:"),
            Span::raw(format!("{:.1}°C", snapshot.nozzle_temperature)),
        ]),
        Line::from(vec![
            label("Layer:"),
            Span::raw(format_layers(snapshot.current_layer, snapshot.total_layers)),
        ]),
        Line::from(vec![
            label("Remaining:"),
            Span::raw(format_remaining(snapshot.remaining_minutes)),
        ]),
        Line::from(""),
    ];

    match &snapshot.extruder {
        Some(extruder) => {
            lines.push(Line::styled(
                format!("Extruder {}", extruder.id),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(format!(
                "  Current: {}°C  Target: {}°C  Filament: {}°C  Status: {}",
                extruder.current_temperature,
                extruder.target_temperature,
                extruder.filament_temperature,
                extruder.status
            )));
        }
        None => lines.push(Line::from(vec![
            label("Extruder:"),
            Span::styled("Not detected", Style::default().fg(Color::DarkGray)),
        ])),
    }

    if !snapshot.ams_units.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            "AMS Units",
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    for unit in &snapshot.ams_units {
        lines.push(Line::raw(format!(
            "  Unit {}  {:.1}°C  humidity {}",
            unit.id, unit.temperature, unit.humidity
        )));
        for tray in &unit.trays {
            let mut spans = vec![Span::raw(format!("    Tray {}: ", tray.id))];
            if tray.color.is_empty() {
                spans.push(Span::styled("Empty", Style::default().fg(Color::DarkGray)));
            } else {
                let color = hex_to_color(&tray.color);
                spans.push(Span::styled(
                    "█",
                    Style::default()
                        .fg(color)
                        .bg(contrasting_background(&tray.color)),
                ));
                spans.push(Span::raw(format!(
                    " [{}] {} {}  Nozzle {:.0}-{:.0}°C",
                    color_name(color),
                    tray.filament_type,
                    tray.brand,
                    tray.nozzle_temp_min,
                    tray.nozzle_temp_max
                )));
            }
            lines.push(Line::from(spans));
        }
    }
    lines
}

/// Draw the print files of the selected printer.
pub(super) fn draw_files_panel(frame: &mut Frame, area: Rect, app: &App) {
    let Some(printer) = app.selected_printer() else {
        frame.render_widget(panel(" Files ".to_string()), area);
        return;
    };
    let block = panel(format!(" {} - Files ", printer.name));

    let Some(files) = &printer.files else {
        frame.render_widget(
            Paragraph::new(format!("{} Listing files...", app.spinner_char())).block(block),
            area,
        );
        return;
    };
    if files.is_empty() {
        frame.render_widget(Paragraph::new("No print files found.").block(block), area);
        return;
    }

    let items: Vec<ListItem> = files
        .iter()
        .map(|file| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<16}  ", format_timestamp(file.timestamp)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:>10}  ", format_size(file.size)),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(file.path.clone()),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bambu_types::{AmsUnit, Tray};

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_detail_lines_defaults() {
        let lines = text(&detail_lines(&PrinterSnapshot::default()));
        assert!(lines.iter().any(|l| l.ends_with("None")));
        assert!(lines.iter().any(|l| l.starts_with("Layer:") && l.ends_with("N/A")));
        assert!(lines.iter().any(|l| l.ends_with("Not detected")));
        assert!(!lines.iter().any(|l| l == "AMS Units"));
    }

    #[test]
    fn test_detail_lines_ams_trays() {
        let snapshot = PrinterSnapshot {
            ams_units: vec![AmsUnit {
                id: "0".to_string(),
                trays: vec![
                    Tray {
                        id: "0".to_string(),
                        color: "F4EE2AFF".to_string(),
                        filament_type: "PLA".to_string(),
                        brand: "Bambu PLA Basic".to_string(),
                        nozzle_temp_min: 190.0,
                        nozzle_temp_max: 230.0,
                        ..Tray::default()
                    },
                    Tray {
                        id: "1".to_string(),
                        ..Tray::default()
                    },
                ],
                ..AmsUnit::default()
            }],
            ..PrinterSnapshot::default()
        };
        let lines = text(&detail_lines(&snapshot));
        assert!(lines.iter().any(|l| l == "AMS Units"));
        assert!(
            lines
                .iter()
                .any(|l| l.contains("Tray 0: █ [Yellow] PLA Bambu PLA Basic  Nozzle 190-230°C"))
        );
        assert!(lines.iter().any(|l| l.contains("Tray 1: Empty")));
    }
}
