//! Trait abstractions for printer operations.
//!
//! [`PrinterDevice`] abstracts over real network printers and
//! [`MockPrinter`](crate::MockPrinter) so front ends can be tested without
//! hardware.

use std::sync::Arc;

use async_trait::async_trait;

use bambu_types::Report;

use crate::connection::ConnectionState;
use crate::error::Result;
use crate::events::EventReceiver;
use crate::ftp::PrintFile;
use crate::printer::PrinterSnapshot;

/// Trait abstracting printer operations.
///
/// # Example
///
/// ```ignore
/// use bambu_core::{PrinterDevice, Result};
///
/// async fn print_progress<D: PrinterDevice>(printer: &D) -> Result<()> {
///     printer.connect().await?;
///     println!("Progress: {}%", printer.snapshot().progress);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait PrinterDevice: Send + Sync {
    // --- Identity ---

    /// Host name or IP address of the printer.
    fn host(&self) -> &str;

    // --- Connection Management ---

    fn connection_state(&self) -> ConnectionState;

    /// Check if a session is established and has delivered a report.
    fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Connect and wait for the first report, using the configured timeout.
    ///
    /// Connecting an already connected printer is a no-op.
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    // --- Observed State ---

    /// Current value of every observable field.
    fn snapshot(&self) -> PrinterSnapshot;

    fn latest_report(&self) -> Option<Arc<Report>>;

    /// Subscribe to field and connection events.
    fn subscribe(&self) -> EventReceiver;

    // --- Files ---

    /// List print files on the printer's storage.
    async fn list_files(&self) -> Result<Vec<PrintFile>>;

    /// Release the printer. The default implementation disconnects.
    async fn dispose(&self) -> Result<()> {
        self.disconnect().await
    }
}
