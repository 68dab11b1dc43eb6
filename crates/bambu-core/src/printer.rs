//! The printer facade: observable fields backed by an MQTT session.
//!
//! [`Printer`] keeps the latest value of each observable field and emits a
//! [`PrinterEvent::FieldChanged`] only when a report actually changes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use bambu_types::{AmsUnit, Extruder, PrinterState, Report};

use crate::connection::{ConnectionConfig, ConnectionManager, ConnectionState, SessionListener};
use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, FieldChange, PrinterEvent};
use crate::ftp::{self, PrintFile};
use crate::traits::PrinterDevice;

/// Default timeout for FTPS file listing.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Current values of every observable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterSnapshot {
    /// Bed temperature in °C.
    pub bed_temperature: f64,
    /// Nozzle temperature in °C.
    pub nozzle_temperature: f64,
    /// Job progress in percent.
    pub progress: i32,
    pub current_file: String,
    pub state: PrinterState,
    pub current_layer: i32,
    pub total_layers: i32,
    pub remaining_minutes: i32,
    pub ams_units: Vec<AmsUnit>,
    /// Primary (first) extruder.
    pub extruder: Option<Extruder>,
}

impl Default for PrinterSnapshot {
    fn default() -> Self {
        Self {
            bed_temperature: 0.0,
            nozzle_temperature: 0.0,
            progress: 0,
            current_file: String::new(),
            state: PrinterState::Idle,
            current_layer: 0,
            total_layers: 0,
            remaining_minutes: 0,
            ams_units: Vec::new(),
            extruder: None,
        }
    }
}

#[derive(Default)]
struct ObservedFields {
    snapshot: PrinterSnapshot,
    last_report: Option<Arc<Report>>,
}

/// Field store shared between a facade and its session listener.
///
/// Reports are applied under one lock: cache the report, diff each field,
/// then emit the change events in field order.
pub(crate) struct Observed {
    host: String,
    fields: Mutex<ObservedFields>,
    events: EventDispatcher,
}

impl Observed {
    pub(crate) fn new(host: String) -> Self {
        Self {
            host,
            fields: Mutex::new(ObservedFields::default()),
            events: EventDispatcher::default(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ObservedFields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> PrinterSnapshot {
        self.lock().snapshot.clone()
    }

    pub(crate) fn latest_report(&self) -> Option<Arc<Report>> {
        self.lock().last_report.clone()
    }

    pub(crate) fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Apply a report and return how many fields changed.
    pub(crate) fn apply(&self, report: Report) -> usize {
        let report = Arc::new(report);
        let mut guard = self.lock();
        guard.last_report = Some(Arc::clone(&report));

        let fields = &mut guard.snapshot;
        let mut changes = Vec::new();

        update(
            &mut fields.bed_temperature,
            report.bed_temperature,
            |value| FieldChange::BedTemperature { value },
            &mut changes,
        );
        update(
            &mut fields.nozzle_temperature,
            report.nozzle_temperature,
            |value| FieldChange::NozzleTemperature { value },
            &mut changes,
        );
        update(
            &mut fields.progress,
            report.progress,
            |value| FieldChange::Progress { value },
            &mut changes,
        );
        update(
            &mut fields.current_file,
            report.gcode_file.clone(),
            |value| FieldChange::CurrentFile { value },
            &mut changes,
        );
        if let Some(state) = report.printer_state() {
            update(
                &mut fields.state,
                state,
                |value| FieldChange::State { value },
                &mut changes,
            );
        }
        update(
            &mut fields.current_layer,
            report.layer_num,
            |value| FieldChange::CurrentLayer { value },
            &mut changes,
        );
        update(
            &mut fields.total_layers,
            report.total_layer_num,
            |value| FieldChange::TotalLayers { value },
            &mut changes,
        );
        update(
            &mut fields.remaining_minutes,
            report.remaining_minutes,
            |value| FieldChange::RemainingMinutes { value },
            &mut changes,
        );
        update(
            &mut fields.ams_units,
            report.ams_units().to_vec(),
            |value| FieldChange::AmsUnits { value },
            &mut changes,
        );
        update(
            &mut fields.extruder,
            report.primary_extruder().copied(),
            |value| FieldChange::Extruder { value },
            &mut changes,
        );

        let changed = changes.len();
        for change in changes {
            self.events.send(PrinterEvent::FieldChanged {
                host: self.host.clone(),
                change,
            });
        }
        self.events.send(PrinterEvent::ReportApplied {
            host: self.host.clone(),
            sequence_id: report.sequence_id.clone(),
            changed,
        });
        drop(guard);

        debug!(host = %self.host, changed, "Report applied");
        changed
    }
}

fn update<T: PartialEq + Clone>(
    slot: &mut T,
    value: T,
    change: impl FnOnce(T) -> FieldChange,
    changes: &mut Vec<FieldChange>,
) {
    if *slot != value {
        *slot = value.clone();
        changes.push(change(value));
    }
}

impl SessionListener for Observed {
    fn on_report(&self, report: Report) {
        self.apply(report);
    }

    fn on_state_changed(&self, state: ConnectionState) {
        self.events.send(PrinterEvent::ConnectionStateChanged {
            host: self.host.clone(),
            state,
        });
    }
}

/// A printer on the local network.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use bambu_core::Printer;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let printer = Printer::new("192.168.1.50", "12345678");
///     let mut events = printer.subscribe();
///
///     printer.connect(Duration::from_secs(10)).await?;
///     println!("Bed: {:.1}°C", printer.bed_temperature());
///
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
///     Ok(())
/// }
/// ```
pub struct Printer {
    host: String,
    access_code: String,
    config: ConnectionConfig,
    observed: Arc<Observed>,
    connection: ConnectionManager,
    disposed: AtomicBool,
}

impl std::fmt::Debug for Printer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer")
            .field("host", &self.host)
            .field("state", &self.connection.state())
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Printer {
    /// Create a printer with the default connection settings.
    pub fn new(host: impl Into<String>, access_code: impl Into<String>) -> Self {
        Self::with_config(host, access_code, ConnectionConfig::default())
    }

    /// Create a printer with custom connection settings.
    pub fn with_config(
        host: impl Into<String>,
        access_code: impl Into<String>,
        config: ConnectionConfig,
    ) -> Self {
        let host = host.into();
        let access_code = access_code.into();
        let observed = Arc::new(Observed::new(host.clone()));
        let listener: Arc<dyn SessionListener> = observed.clone();
        let connection =
            ConnectionManager::new(host.clone(), access_code.clone(), config.clone(), listener);
        Self {
            host,
            access_code,
            config,
            observed,
            connection,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    /// Connect and wait for the first report.
    pub async fn connect(&self, timeout: Duration) -> Result<()> {
        self.connect_with_cancel(timeout, CancellationToken::new())
            .await
    }

    /// Connect, failing with [`Error::Cancelled`] if `cancel` fires first.
    pub async fn connect_with_cancel(
        &self,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.ensure_live()?;
        self.connection.connect(timeout, cancel).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.ensure_live()?;
        self.connection.disconnect().await
    }

    /// List print files over FTPS. Does not need an MQTT session.
    #[tracing::instrument(level = "info", skip_all, fields(host = %self.host, timeout_secs = timeout.as_secs()))]
    pub async fn list_files(&self, timeout: Duration) -> Result<Vec<PrintFile>> {
        self.ensure_live()?;
        tokio::time::timeout(
            timeout,
            ftp::list_print_files(&self.host, self.config.ftps_port, &self.access_code),
        )
        .await
        .map_err(|_| Error::timeout("list_files", timeout))?
    }

    /// Tear down the connection. Later calls are no-ops.
    pub async fn dispose(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(host = %self.host, "Disposing printer");
        self.connection.disconnect().await
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn watch_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch_state()
    }

    /// Subscribe to field and connection events. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> EventReceiver {
        self.observed.subscribe()
    }

    /// The most recent report, if any has arrived.
    pub fn latest_report(&self) -> Option<Arc<Report>> {
        self.observed.latest_report()
    }

    pub fn snapshot(&self) -> PrinterSnapshot {
        self.observed.snapshot()
    }

    pub fn bed_temperature(&self) -> f64 {
        self.observed.lock().snapshot.bed_temperature
    }

    pub fn nozzle_temperature(&self) -> f64 {
        self.observed.lock().snapshot.nozzle_temperature
    }

    pub fn progress(&self) -> i32 {
        self.observed.lock().snapshot.progress
    }

    pub fn current_file(&self) -> String {
        self.observed.lock().snapshot.current_file.clone()
    }

    pub fn state(&self) -> PrinterState {
        self.observed.lock().snapshot.state
    }

    pub fn current_layer(&self) -> i32 {
        self.observed.lock().snapshot.current_layer
    }

    pub fn total_layers(&self) -> i32 {
        self.observed.lock().snapshot.total_layers
    }

    pub fn remaining_minutes(&self) -> i32 {
        self.observed.lock().snapshot.remaining_minutes
    }

    pub fn ams_units(&self) -> Vec<AmsUnit> {
        self.observed.lock().snapshot.ams_units.clone()
    }

    pub fn extruder(&self) -> Option<Extruder> {
        self.observed.lock().snapshot.extruder
    }
}

#[async_trait]
impl PrinterDevice for Printer {
    fn host(&self) -> &str {
        &self.host
    }

    fn connection_state(&self) -> ConnectionState {
        Printer::connection_state(self)
    }

    async fn connect(&self) -> Result<()> {
        Printer::connect(self, self.config.connect_timeout).await
    }

    async fn disconnect(&self) -> Result<()> {
        Printer::disconnect(self).await
    }

    fn snapshot(&self) -> PrinterSnapshot {
        Printer::snapshot(self)
    }

    fn latest_report(&self) -> Option<Arc<Report>> {
        Printer::latest_report(self)
    }

    fn subscribe(&self) -> EventReceiver {
        Printer::subscribe(self)
    }

    async fn list_files(&self) -> Result<Vec<PrintFile>> {
        Printer::list_files(self, DEFAULT_LIST_TIMEOUT).await
    }

    async fn dispose(&self) -> Result<()> {
        Printer::dispose(self).await
    }
}
