//! Output formatting for CLI commands.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use serde::Serialize;

use bambu_core::{ConnectionState, FieldChange, PrintFile, PrinterSnapshot};
use bambu_types::{PrinterState, Report};

use crate::config::PrinterConfig;

/// Format remaining minutes as `1h 05m`, or `N/A` when unknown.
pub fn format_remaining(minutes: i32) -> String {
    if minutes <= 0 {
        return "N/A".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins:02}m")
    } else {
        format!("{mins}m")
    }
}

/// Format a layer counter, or `N/A` when the job has no layer count.
pub fn format_layers(current: i32, total: i32) -> String {
    if total > 0 {
        format!("{current}/{total}")
    } else {
        "N/A".to_string()
    }
}

/// Format a byte count with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Format a Unix timestamp in local time.
pub fn format_timestamp(timestamp: i64) -> String {
    if timestamp <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

/// Format the operating state, colored by severity.
pub fn format_state(state: PrinterState, no_color: bool) -> String {
    let label = state.to_string();
    if no_color {
        return label;
    }
    match state {
        PrinterState::Running | PrinterState::Prepare => format!("{}", label.cyan()),
        PrinterState::Finished | PrinterState::Finishing => format!("{}", label.green()),
        PrinterState::Paused => format!("{}", label.yellow()),
        PrinterState::Failed => format!("{}", label.red()),
        _ => label,
    }
}

fn format_connection(state: ConnectionState, no_color: bool) -> String {
    let label = state.to_string();
    if no_color {
        return label;
    }
    match state {
        ConnectionState::Connected => format!("{}", label.green()),
        ConnectionState::Disconnected => format!("{}", label.dimmed()),
        _ => format!("{}", label.yellow()),
    }
}

fn heading(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.bold())
    }
}

/// Multi-line status block for one printer.
pub fn format_status_text(
    name: &str,
    snapshot: &PrinterSnapshot,
    report: Option<&Report>,
    no_color: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(name, no_color));
    let _ = writeln!(
        out,
        "  State:      {}",
        format_state(snapshot.state, no_color)
    );
    if let Some(report) = report {
        let _ = writeln!(out, "  Job:        {}", report.gcode_state());
    }
    let _ = writeln!(out, "  Progress:   {}%", snapshot.progress);
    let file = if snapshot.current_file.is_empty() {
        "None"
    } else {
        snapshot.current_file.as_str()
    };
    let _ = writeln!(out, "  File:       {file}");
    let _ = writeln!(out, "  Bed:        {:.1}°C", snapshot.bed_temperature);
    let _ = writeln!(out, "  Nozzle:     {:.1}°C", snapshot.nozzle_temperature);
    let _ = writeln!(
        out,
        "  Layer:      {}",
        format_layers(snapshot.current_layer, snapshot.total_layers)
    );
    let _ = writeln!(
        out,
        "  Remaining:  {}",
        format_remaining(snapshot.remaining_minutes)
    );

    match &snapshot.extruder {
        Some(extruder) => {
            let _ = writeln!(
                out,
                "  Extruder {}: {}°C / {}°C (filament {}°C)",
                extruder.id,
                extruder.current_temperature,
                extruder.target_temperature,
                extruder.filament_temperature
            );
        }
        None => {
            let _ = writeln!(out, "  Extruder:   Not detected");
        }
    }

    for unit in &snapshot.ams_units {
        let _ = writeln!(
            out,
            "  AMS {}:      {:.1}°C, humidity {}",
            unit.id, unit.temperature, unit.humidity
        );
        for tray in &unit.trays {
            let material = if tray.filament_type.is_empty() {
                "Empty"
            } else {
                tray.filament_type.as_str()
            };
            let _ = writeln!(
                out,
                "    Tray {}: {} {} ({}°C-{}°C)",
                tray.id, material, tray.brand, tray.nozzle_temp_min, tray.nozzle_temp_max
            );
        }
    }

    if let Some(report) = report {
        for hms in &report.hms {
            let severity = hms
                .severity()
                .map_or_else(|| "Unknown".to_string(), |s| s.to_string());
            let _ = writeln!(out, "  HMS:        {hms} ({severity})");
        }
    }
    out
}

#[derive(Serialize)]
struct StatusJson<'a> {
    name: &'a str,
    ip_address: &'a str,
    connection: ConnectionState,
    #[serde(flatten)]
    snapshot: &'a PrinterSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a Report>,
}

/// Status as pretty-printed JSON.
pub fn format_status_json(
    printer: &PrinterConfig,
    connection: ConnectionState,
    snapshot: &PrinterSnapshot,
    report: Option<&Report>,
) -> Result<String> {
    let json = StatusJson {
        name: printer.display_name(),
        ip_address: &printer.ip_address,
        connection,
        snapshot,
        report,
    };
    Ok(serde_json::to_string_pretty(&json)? + "\n")
}

/// One line describing a field change.
pub fn format_change(change: &FieldChange, no_color: bool) -> String {
    let (label, value) = match change {
        FieldChange::BedTemperature { value } => ("bed", format!("{value:.1}°C")),
        FieldChange::NozzleTemperature { value } => ("nozzle", format!("{value:.1}°C")),
        FieldChange::Progress { value } => ("progress", format!("{value}%")),
        FieldChange::CurrentFile { value } => ("file", value.clone()),
        FieldChange::State { value } => ("state", format_state(*value, no_color)),
        FieldChange::CurrentLayer { value } => ("layer", value.to_string()),
        FieldChange::TotalLayers { value } => ("total layers", value.to_string()),
        FieldChange::RemainingMinutes { value } => ("remaining", format_remaining(*value)),
        FieldChange::AmsUnits { value } => ("ams", format!("{} unit(s)", value.len())),
        FieldChange::Extruder { value } => (
            "extruder",
            value
                .map(|e| format!("{}°C / {}°C", e.current_temperature, e.target_temperature))
                .unwrap_or_else(|| "none".to_string()),
        ),
        _ => ("field", format!("{change:?}")),
    };
    let time = Local::now().format("%H:%M:%S");
    if no_color {
        format!("[{time}] {label}: {value}")
    } else {
        format!("[{}] {}: {value}", time.dimmed(), label.cyan())
    }
}

/// One line describing a connection state change.
pub fn format_connection_change(state: ConnectionState, no_color: bool) -> String {
    let time = Local::now().format("%H:%M:%S");
    format!("[{time}] connection: {}", format_connection(state, no_color))
}

/// Table of configured printers.
pub fn format_printer_list(printers: &[PrinterConfig], no_color: bool) -> String {
    if printers.is_empty() {
        return "No printers configured. Add one with `bambu add`.\n".to_string();
    }
    let width = printers
        .iter()
        .map(|p| p.display_name().len())
        .max()
        .unwrap_or(4)
        .max(4);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(&format!("{:<width$}  {:<15}  SERIAL", "NAME", "IP"), no_color)
    );
    for printer in printers {
        let _ = writeln!(
            out,
            "{:<width$}  {:<15}  {}",
            printer.display_name(),
            printer.ip_address,
            printer.serial.as_deref().unwrap_or("-")
        );
    }
    out
}

/// Table of print files.
pub fn format_file_list(files: &[PrintFile], no_color: bool) -> String {
    if files.is_empty() {
        return "No print files found.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(&format!("{:<16}  {:>10}  PATH", "MODIFIED", "SIZE"), no_color)
    );
    for file in files {
        let _ = writeln!(
            out,
            "{:<16}  {:>10}  {}",
            format_timestamp(file.timestamp),
            format_size(file.size),
            file.path
        );
    }
    out
}
