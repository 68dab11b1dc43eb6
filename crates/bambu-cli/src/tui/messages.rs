//! Message types for communication between the UI loop and the worker.
//!
//! - [`Command`]: sent from the UI to the background worker
//! - [`UiEvent`]: sent from the worker back to the UI

use bambu_core::{ConnectionState, PrintFile, PrinterSnapshot};

/// Requests from the UI to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect one printer by IP address.
    Connect { ip: String },
    /// Disconnect one printer by IP address.
    Disconnect { ip: String },
    /// Connect every registered printer.
    ConnectAll,
    /// List print files on one printer.
    ListFiles { ip: String },
    /// Stop the worker.
    Shutdown,
}

/// Updates from the worker to the UI.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The session of a printer changed state.
    ConnectionChanged { ip: String, state: ConnectionState },
    /// A report was applied; carries the new field values.
    SnapshotUpdated {
        ip: String,
        snapshot: PrinterSnapshot,
    },
    /// A connect attempt failed.
    ConnectFailed { ip: String, error: String },
    /// A file listing finished.
    FilesListed { ip: String, files: Vec<PrintFile> },
    /// A file listing failed.
    FilesFailed { ip: String, error: String },
}
