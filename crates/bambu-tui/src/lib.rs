//! TUI for Bambu Lab printers.
//!
//! This crate provides a standalone binary wrapper around bambu-cli's TUI functionality.
//! The actual TUI implementation lives in `bambu-cli` with the `tui` feature enabled.
//!
//! For the TUI implementation, see [`bambu_cli::tui`].

pub use bambu_cli::tui;
