//! Command-line interface for Bambu Lab printers on the local network.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add` | Add a printer to the configuration |
//! | `remove` | Remove a printer by IP address |
//! | `list` | List configured printers |
//! | `status` | One-shot status snapshot |
//! | `watch` | Stream field changes until Ctrl-C |
//! | `files` | List print files over FTPS |
//! | `tui` | Interactive terminal dashboard |
//!
//! # Configuration
//!
//! Printers are stored in `~/.config/bambu/printers.toml` (or platform
//! equivalent):
//!
//! ```toml
//! [[printers]]
//! name = "X1C"
//! ip_address = "192.168.1.50"
//! access_code = "12345678"
//! ```
//!
//! # Environment Variables
//!
//! - `BAMBU_CONFIG`: Config file path
//! - `BAMBU_PRINTER`: Default printer (name or IP)
//! - `BAMBU_ACCESS_CODE`: Access code for printers not in the config
//! - `NO_COLOR`: Disable colored output when set
//!
//! # Examples
//!
//! ```bash
//! bambu add --name X1C --ip 192.168.1.50 --access-code 12345678
//! bambu status --printer X1C --format json
//! bambu watch
//! ```

pub mod config;
pub mod format;

// Re-export core dependencies for convenience
pub use bambu_core;
pub use bambu_types;

// TUI module - publicly exposed for bambu-tui crate to use
#[cfg(feature = "tui")]
pub mod tui;
