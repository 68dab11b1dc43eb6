//! Color helpers for the TUI.
//!
//! Filament colors arrive as hex strings (`RRGGBB` or `RRGGBBAA`, with or
//! without `#`) and are snapped to the nearest of the 16 basic terminal
//! colors so they render on any terminal.

use ratatui::style::Color;

use bambu_core::ConnectionState;
use bambu_types::PrinterState;

/// The 16 basic terminal colors and their approximate RGB values.
const PALETTE: [(Color, i32, i32, i32); 16] = [
    (Color::Black, 0, 0, 0),
    (Color::Blue, 0, 0, 128),
    (Color::Green, 0, 128, 0),
    (Color::Cyan, 0, 128, 128),
    (Color::Red, 128, 0, 0),
    (Color::Magenta, 128, 0, 128),
    (Color::Yellow, 128, 128, 0),
    (Color::Gray, 192, 192, 192),
    (Color::DarkGray, 128, 128, 128),
    (Color::LightBlue, 0, 0, 255),
    (Color::LightGreen, 0, 255, 0),
    (Color::LightCyan, 0, 255, 255),
    (Color::LightRed, 255, 0, 0),
    (Color::LightMagenta, 255, 0, 255),
    (Color::LightYellow, 255, 255, 0),
    (Color::White, 255, 255, 255),
];

/// Parse the leading `RRGGBB` of a hex color.
fn parse_rgb(hex: &str) -> Option<(i32, i32, i32)> {
    let hex = hex.trim().trim_start_matches('#');
    let component = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(i32::from)
    };
    Some((component(0..2)?, component(2..4)?, component(4..6)?))
}

/// Nearest basic terminal color by Euclidean distance.
fn nearest(r: i32, g: i32, b: i32) -> Color {
    let mut closest = Color::White;
    let mut best = i32::MAX;
    for (color, cr, cg, cb) in PALETTE {
        let distance = (r - cr).pow(2) + (g - cg).pow(2) + (b - cb).pow(2);
        if distance < best {
            best = distance;
            closest = color;
        }
    }
    closest
}

/// Convert a hex color to the nearest basic terminal color.
///
/// Empty, short or malformed input yields [`Color::White`].
#[must_use]
pub fn hex_to_color(hex: &str) -> Color {
    parse_rgb(hex).map_or(Color::White, |(r, g, b)| nearest(r, g, b))
}

/// Black or white, whichever contrasts better with the given color.
///
/// Uses perceived brightness `0.299 R + 0.587 G + 0.114 B`; anything
/// brighter than 128 gets a black background. Unparseable input yields
/// black.
#[must_use]
pub fn contrasting_background(hex: &str) -> Color {
    match parse_rgb(hex) {
        Some((r, g, b)) => {
            let brightness = f64::from(r) * 0.299 + f64::from(g) * 0.587 + f64::from(b) * 0.114;
            if brightness > 128.0 {
                Color::Black
            } else {
                Color::White
            }
        }
        None => Color::Black,
    }
}

/// Short display name for a basic terminal color.
#[must_use]
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::Black => "Black",
        Color::Red => "Red",
        Color::Green => "Green",
        Color::Yellow => "Brown",
        Color::Blue => "Blue",
        Color::Magenta => "Magenta",
        Color::Cyan => "Cyan",
        Color::Gray => "Gray",
        Color::DarkGray => "DkGray",
        Color::LightRed => "BrightRed",
        Color::LightGreen => "BrightGreen",
        Color::LightYellow => "Yellow",
        Color::LightBlue => "BrightBlue",
        Color::LightMagenta => "BrightMagenta",
        Color::LightCyan => "BrightCyan",
        Color::White => "White",
        _ => "Unknown",
    }
}

/// Color for a printer operating state.
#[must_use]
pub fn state_color(state: PrinterState) -> Color {
    match state {
        PrinterState::Running | PrinterState::Prepare => Color::Cyan,
        PrinterState::Finished | PrinterState::Finishing => Color::Green,
        PrinterState::Paused => Color::Yellow,
        PrinterState::Failed => Color::Red,
        _ => Color::Gray,
    }
}

/// Color for a connection state.
#[must_use]
pub fn connection_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Connecting | ConnectionState::AwaitingFirstReport => Color::Yellow,
        _ => Color::DarkGray,
    }
}
