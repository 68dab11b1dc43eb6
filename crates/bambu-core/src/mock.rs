//! Mock printer implementation for testing.
//!
//! [`MockPrinter`] implements [`PrinterDevice`] without a network. Reports
//! fed into it go through the same diff-then-notify path as a real
//! [`Printer`](crate::Printer), so field events and snapshots behave the same.
//!
//! # Features
//!
//! - **Report injection**: feed decoded reports or raw JSON payloads
//! - **Failure injection**: make connect and file listing fail
//! - **Latency simulation**: delay connects to exercise timeouts

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use bambu_types::Report;

use crate::connection::{ConnectionState, SessionListener};
use crate::error::{Error, Result};
use crate::events::EventReceiver;
use crate::ftp::PrintFile;
use crate::printer::{Observed, PrinterSnapshot};
use crate::traits::PrinterDevice;

/// A mock printer for testing.
///
/// # Example
///
/// ```
/// use bambu_core::{MockPrinter, PrinterDevice};
///
/// #[tokio::main]
/// async fn main() {
///     let printer = MockPrinter::new("192.168.1.50");
///     printer.connect().await.unwrap();
///     printer.feed_json(br#"{"print": {"mc_percent": 42}}"#).unwrap();
///     assert_eq!(printer.snapshot().progress, 42);
/// }
/// ```
pub struct MockPrinter {
    host: String,
    observed: Arc<Observed>,
    connected: AtomicBool,
    files: RwLock<Vec<PrintFile>>,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    /// Simulated connect latency in milliseconds (0 = no delay).
    connect_latency_ms: AtomicU64,
    disposed: AtomicBool,
}

impl std::fmt::Debug for MockPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPrinter")
            .field("host", &self.host)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MockPrinter {
    /// Create a disconnected mock printer with no files.
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            observed: Arc::new(Observed::new(host.to_string())),
            connected: AtomicBool::new(false),
            files: RwLock::new(Vec::new()),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            connect_latency_ms: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    fn set_connected(&self, connected: bool) {
        let was = self.connected.swap(connected, Ordering::SeqCst);
        if was != connected {
            self.observed.on_state_changed(if connected {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            });
        }
    }

    async fn check_fail(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::Disposed);
        }
        if self.should_fail.load(Ordering::Relaxed) {
            let message = self.fail_message.read().await.clone();
            return Err(Error::connection_failed(&self.host, message));
        }
        Ok(())
    }

    /// Connect the mock printer. Connecting while connected is a no-op.
    pub async fn connect(&self) -> Result<()> {
        self.check_fail().await?;
        if self.is_connected_sync() {
            return Ok(());
        }
        let latency = self.connect_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            self.observed.on_state_changed(ConnectionState::Connecting);
            let guard = ConnectingGuard {
                observed: &self.observed,
                armed: true,
            };
            tokio::time::sleep(Duration::from_millis(latency)).await;
            guard.disarm();
        }
        self.set_connected(true);
        Ok(())
    }

    /// Disconnect the mock printer.
    pub async fn disconnect(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::Disposed);
        }
        self.set_connected(false);
        Ok(())
    }

    pub fn is_connected_sync(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Apply a report as if it arrived from the broker.
    ///
    /// Returns the number of fields that changed.
    pub fn feed(&self, report: Report) -> usize {
        self.observed.apply(report)
    }

    /// Decode and apply a raw report payload.
    pub fn feed_json(&self, payload: &[u8]) -> Result<usize> {
        let report = Report::from_slice(payload)?;
        Ok(self.feed(report))
    }

    /// Replace the files returned by `list_files`.
    pub async fn set_files(&self, files: Vec<PrintFile>) {
        *self.files.write().await = files;
    }

    /// Make subsequent connects and listings fail.
    pub fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message
            && let Ok(mut guard) = self.fail_message.try_write()
        {
            *guard = msg.to_string();
        }
    }

    /// Set simulated connect latency.
    pub fn set_connect_latency(&self, latency: Duration) {
        self.connect_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Reports `Disconnected` if a delayed connect is dropped before it finishes.
struct ConnectingGuard<'a> {
    observed: &'a Observed,
    armed: bool,
}

impl ConnectingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.observed
                .on_state_changed(ConnectionState::Disconnected);
        }
    }
}

#[async_trait]
impl PrinterDevice for MockPrinter {
    fn host(&self) -> &str {
        &self.host
    }

    fn connection_state(&self) -> ConnectionState {
        if self.is_connected_sync() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    async fn connect(&self) -> Result<()> {
        MockPrinter::connect(self).await
    }

    async fn disconnect(&self) -> Result<()> {
        MockPrinter::disconnect(self).await
    }

    fn snapshot(&self) -> PrinterSnapshot {
        self.observed.snapshot()
    }

    fn latest_report(&self) -> Option<Arc<Report>> {
        self.observed.latest_report()
    }

    fn subscribe(&self) -> EventReceiver {
        self.observed.subscribe()
    }

    async fn list_files(&self) -> Result<Vec<PrintFile>> {
        self.check_fail().await?;
        Ok(self.files.read().await.clone())
    }

    async fn dispose(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.set_connected(false);
        Ok(())
    }
}

/// Builder for creating mock printers with custom settings.
#[derive(Debug)]
pub struct MockPrinterBuilder {
    host: String,
    files: Vec<PrintFile>,
    reports: Vec<Report>,
    auto_connect: bool,
}

impl Default for MockPrinterBuilder {
    fn default() -> Self {
        Self {
            host: "192.168.1.50".to_string(),
            files: Vec::new(),
            reports: Vec::new(),
            auto_connect: true,
        }
    }
}

impl MockPrinterBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Add a file to the printer's storage.
    #[must_use]
    pub fn file(mut self, file: PrintFile) -> Self {
        self.files.push(file);
        self
    }

    /// Queue a report to apply when the printer is built.
    #[must_use]
    pub fn report(mut self, report: Report) -> Self {
        self.reports.push(report);
        self
    }

    /// Set whether the printer starts connected.
    #[must_use]
    pub fn auto_connect(mut self, auto: bool) -> Self {
        self.auto_connect = auto;
        self
    }

    /// Build the mock printer.
    #[must_use]
    pub fn build(self) -> MockPrinter {
        let mut printer = MockPrinter::new(&self.host);
        printer.connected.store(self.auto_connect, Ordering::Relaxed);
        printer.files = RwLock::new(self.files);
        for report in self.reports {
            printer.feed(report);
        }
        printer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FieldChange, PrinterEvent};

    fn file(name: &str) -> PrintFile {
        PrintFile {
            name: name.to_string(),
            path: format!("/{name}"),
            size: 1024,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_mock_printer_connect() {
        let printer = MockPrinter::new("10.0.0.2");
        assert!(!printer.is_connected_sync());

        let mut rx = printer.subscribe();
        printer.connect().await.unwrap();
        assert!(printer.is_connected());
        assert!(matches!(
            rx.try_recv().unwrap(),
            PrinterEvent::ConnectionStateChanged {
                state: ConnectionState::Connected,
                ..
            }
        ));

        printer.disconnect().await.unwrap();
        assert_eq!(printer.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_mock_printer_feed_json() {
        let printer = MockPrinter::new("10.0.0.2");
        let mut rx = printer.subscribe();

        let changed = printer
            .feed_json(br#"{"print": {"nozzle_temper": 215.5}}"#)
            .unwrap();
        assert_eq!(changed, 1);
        match rx.try_recv().unwrap() {
            PrinterEvent::FieldChanged { change, .. } => {
                assert_eq!(change, FieldChange::NozzleTemperature { value: 215.5 });
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(printer.latest_report().is_some());
    }

    #[test]
    fn test_mock_printer_feed_invalid_json() {
        let printer = MockPrinter::new("10.0.0.2");
        assert!(matches!(
            printer.feed_json(b"{\"info\": {}}"),
            Err(Error::Decode(_))
        ));
        assert!(printer.latest_report().is_none());
    }

    #[tokio::test]
    async fn test_mock_printer_fail() {
        let printer = MockPrinter::new("10.0.0.2");
        printer.set_should_fail(true, Some("Test error"));

        let err = printer.connect().await.unwrap_err();
        assert!(err.to_string().contains("Test error"));
        assert!(printer.list_files().await.is_err());

        printer.set_should_fail(false, None);
        printer.connect().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_printer_latency_hits_timeout() {
        let printer = MockPrinter::new("10.0.0.2");
        printer.set_connect_latency(Duration::from_secs(5));

        let mut rx = printer.subscribe();

        let result = tokio::time::timeout(Duration::from_secs(1), printer.connect()).await;
        assert!(result.is_err());
        assert!(!printer.is_connected_sync());

        let states: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|event| match event {
                PrinterEvent::ConnectionStateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![ConnectionState::Connecting, ConnectionState::Disconnected]
        );
    }

    #[tokio::test]
    async fn test_mock_printer_connect_twice_is_noop() {
        let printer = MockPrinter::new("10.0.0.2");
        printer.connect().await.unwrap();
        let mut rx = printer.subscribe();

        printer.connect().await.unwrap();
        assert!(printer.is_connected_sync());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mock_printer_dispose() {
        let printer = MockPrinterBuilder::new().build();
        assert!(printer.is_connected_sync());

        PrinterDevice::dispose(&printer).await.unwrap();
        PrinterDevice::dispose(&printer).await.unwrap();
        assert!(printer.is_disposed());
        assert!(matches!(printer.connect().await, Err(Error::Disposed)));
        assert!(matches!(printer.list_files().await, Err(Error::Disposed)));
    }

    #[tokio::test]
    async fn test_builder() {
        let report = Report::from_json_str(r#"{"print": {"gcode_file": "cube.gcode"}}"#).unwrap();
        let printer = MockPrinterBuilder::new()
            .host("10.0.0.9")
            .file(file("cube.3mf"))
            .report(report)
            .auto_connect(false)
            .build();

        assert_eq!(printer.host(), "10.0.0.9");
        assert!(!printer.is_connected_sync());
        assert_eq!(printer.snapshot().current_file, "cube.gcode");
        let files = printer.list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "cube.3mf");
    }

    #[tokio::test]
    async fn test_trait_object() {
        let printer: Arc<dyn PrinterDevice> = Arc::new(MockPrinter::new("10.0.0.2"));
        printer.connect().await.unwrap();
        assert!(printer.is_connected());
        assert_eq!(printer.snapshot().state, bambu_types::PrinterState::Idle);
    }
}
