//! Core LAN library for Bambu-style 3D printers.
//!
//! This crate talks to a printer on the local network. It keeps an MQTT
//! session open over TLS, decodes each status report with
//! [`bambu_types`], and republishes the printer's state as observable
//! fields.
//!
//! # Features
//!
//! - **MQTT session**: port 8883, user `bblp`, access code as password
//! - **Observable fields**: one event per field whose value changed
//! - **File listing**: print files over implicit FTPS, independent of MQTT
//! - **Multi-printer support**: manage several printers keyed by IP
//! - **Testing**: [`MockPrinter`] behind the [`PrinterDevice`] trait
//!
//! # Certificates
//!
//! Printers use self-signed certificates, so neither the MQTT nor the FTPS
//! connection validates the server certificate. Only use this on networks
//! you trust.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use bambu_core::{FieldChange, Printer, PrinterEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let printer = Printer::new("192.168.1.50", "12345678");
//!     let mut events = printer.subscribe();
//!     printer.connect(Duration::from_secs(10)).await?;
//!
//!     println!("State: {}", printer.state());
//!     while let Ok(event) = events.recv().await {
//!         if let PrinterEvent::FieldChanged { change: FieldChange::Progress { value }, .. } = event {
//!             println!("Progress: {value}%");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod events;
pub mod ftp;
pub mod manager;
pub mod mock;
pub mod printer;
mod tls;
pub mod traits;

// Core exports
pub use connection::{
    ConnectionConfig, ConnectionManager, ConnectionState, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_FTPS_PORT, DEFAULT_MQTT_PORT, PRINTER_USERNAME, SessionListener,
};
pub use error::{Error, Result};
pub use events::{
    EventDispatcher, EventReceiver, EventSender, FieldChange, PrinterEvent, PrinterField,
};
pub use ftp::{PrintFile, is_print_file, list_print_files};
pub use manager::{ManagedPrinter, ManagerConfig, PrinterManager};
pub use mock::{MockPrinter, MockPrinterBuilder};
pub use printer::{DEFAULT_LIST_TIMEOUT, Printer, PrinterSnapshot};
pub use traits::PrinterDevice;

/// Type alias for a shared printer reference.
pub type SharedPrinter = std::sync::Arc<Printer>;

// Re-export from bambu-types
pub use bambu_types;
pub use bambu_types::{AmsUnit, Extruder, GCodeState, PrinterState, Report, Tray};
