//! MQTT session management for a single printer.
//!
//! A [`ConnectionManager`] owns at most one MQTT-over-TLS session with a
//! printer. The rumqttc event loop runs on a spawned task; every inbound
//! publish is decoded there and handed to a [`SessionListener`].
//!
//! # State machine
//!
//! ```text
//! Disconnected --connect()--> Connecting --CONNACK--> AwaitingFirstReport
//!                                                         |
//!                                    first decoded report v
//!                                                     Connected
//! ```
//!
//! Any failure, timeout, cancellation or [`ConnectionManager::disconnect`]
//! returns to `Disconnected`.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, TlsConfiguration, Transport,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bambu_types::Report;

use crate::error::{Error, Result};
use crate::tls;

/// MQTT-over-TLS port on the printer.
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// Implicit FTPS port on the printer.
pub const DEFAULT_FTPS_PORT: u16 = 990;

/// Username for both MQTT and FTPS; the password is the access code.
pub const PRINTER_USERNAME: &str = "bblp";

/// Default time allowed for CONNACK plus the first report.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for a graceful DISCONNECT before the I/O task is cancelled.
pub const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default MQTT keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Full status reports are far larger than rumqttc's 10 KiB default.
const MAX_PACKET_SIZE: usize = 1024 * 1024;

const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Connection state of an MQTT session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// CONNACK received and topics subscribed; no report decoded yet.
    AwaitingFirstReport,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::AwaitingFirstReport => write!(f, "Waiting for first report"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Receives decoded reports and state transitions from a session.
///
/// Both methods are called from the event-loop task and must not block.
pub trait SessionListener: Send + Sync {
    /// A report was decoded from an inbound message.
    fn on_report(&self, report: Report);

    /// The session moved to a new state.
    fn on_state_changed(&self, _state: ConnectionState) {}
}

/// Configuration for a printer connection.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use bambu_core::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .connect_timeout(Duration::from_secs(20))
///     .serial("01P00A123456789");
/// assert_eq!(config.topics(), vec![
///     "device/01P00A123456789/report".to_string(),
///     "bblp/printer/report".to_string(),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// MQTT broker port.
    pub port: u16,
    /// Time allowed for CONNACK plus the first report.
    pub connect_timeout: Duration,
    /// Wait for a graceful DISCONNECT before cancelling the I/O task.
    pub disconnect_timeout: Duration,
    pub keep_alive: Duration,
    /// Printer serial number, narrowing the report subscription.
    pub serial: Option<String>,
    /// Subscribe to `#` instead of the report topics.
    pub subscribe_all: bool,
    /// Implicit FTPS port for file listing.
    pub ftps_port: u16,
    /// Prefix of the random MQTT client id.
    pub client_id_prefix: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_MQTT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            disconnect_timeout: DEFAULT_DISCONNECT_TIMEOUT,
            keep_alive: DEFAULT_KEEP_ALIVE,
            serial: None,
            subscribe_all: false,
            ftps_port: DEFAULT_FTPS_PORT,
            client_id_prefix: "bambu".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MQTT port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the disconnect timeout.
    #[must_use]
    pub fn disconnect_timeout(mut self, timeout: Duration) -> Self {
        self.disconnect_timeout = timeout;
        self
    }

    /// Set the MQTT keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Set the printer serial number.
    #[must_use]
    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Subscribe to every topic. Useful for diagnostics only.
    #[must_use]
    pub fn subscribe_all(mut self, enabled: bool) -> Self {
        self.subscribe_all = enabled;
        self
    }

    /// Set the FTPS port.
    #[must_use]
    pub fn ftps_port(mut self, port: u16) -> Self {
        self.ftps_port = port;
        self
    }

    /// Set the client id prefix.
    #[must_use]
    pub fn client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_id_prefix = prefix.into();
        self
    }

    /// Topics subscribed after CONNACK.
    pub fn topics(&self) -> Vec<String> {
        if self.subscribe_all {
            return vec!["#".to_string()];
        }
        let device = match &self.serial {
            Some(serial) => format!("device/{serial}/report"),
            None => "device/+/report".to_string(),
        };
        vec![device, "bblp/printer/report".to_string()]
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::invalid_config("MQTT port must not be 0"));
        }
        if !self.keep_alive.is_zero() && self.keep_alive < Duration::from_secs(1) {
            return Err(Error::invalid_config(
                "keep-alive must be zero or at least one second",
            ));
        }
        Ok(())
    }
}

struct Shared {
    host: String,
    state: watch::Sender<ConnectionState>,
    listener: Arc<dyn SessionListener>,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            debug!(host = %self.host, %state, "Connection state changed");
            self.listener.on_state_changed(state);
        }
    }
}

struct Session {
    client: AsyncClient,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Manages the MQTT session with one printer.
///
/// # Cleanup
///
/// Call [`ConnectionManager::disconnect`] before dropping. A manager dropped
/// with a live session spawns a bounded best-effort disconnect on the current
/// runtime and logs a warning.
pub struct ConnectionManager {
    host: String,
    access_code: String,
    config: ConnectionConfig,
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.host)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager. No I/O happens until [`ConnectionManager::connect`].
    pub fn new(
        host: impl Into<String>,
        access_code: impl Into<String>,
        config: ConnectionConfig,
        listener: Arc<dyn SessionListener>,
    ) -> Self {
        let host = host.into();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                host: host.clone(),
                state,
                listener,
            }),
            host,
            access_code: access_code.into(),
            config,
            session: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Watch state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Open the session and wait for the first report.
    ///
    /// Resolves once a report has been decoded. Calling this while already
    /// connected is a no-op. On timeout the call fails with
    /// [`Error::Timeout`]; if the broker had already accepted the session it
    /// keeps running so a late report is still delivered to the listener,
    /// and the next `connect`, `disconnect` or drop tears it down.
    #[tracing::instrument(level = "info", skip_all, fields(host = %self.host, timeout_secs = timeout.as_secs()))]
    pub async fn connect(&self, timeout: Duration, cancel: CancellationToken) -> Result<()> {
        let mut slot = self.session.lock().await;

        if slot.is_some() && self.state() == ConnectionState::Connected {
            debug!("Already connected");
            return Ok(());
        }
        if let Some(stale) = slot.take() {
            debug!("Tearing down previous session");
            shutdown_session(stale, self.config.disconnect_timeout, &self.host).await;
        }

        if self.host.trim().is_empty() {
            return Err(Error::invalid_config("printer host must not be empty"));
        }
        self.config.validate()?;
        let options = self.mqtt_options()?;

        self.shared.set_state(ConnectionState::Connecting);
        info!("Connecting to printer");

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let (connack_tx, connack_rx) = oneshot::channel();
        let (report_tx, report_rx) = oneshot::channel();
        let task_cancel = CancellationToken::new();
        let task = tokio::spawn(run_event_loop(
            eventloop,
            Arc::clone(&self.shared),
            task_cancel.clone(),
            connack_tx,
            report_tx,
        ));
        let session = Session {
            client,
            task,
            cancel: task_cancel,
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, self.handshake(&session.client, connack_rx, report_rx)) => {
                result.unwrap_or_else(|_| Err(Error::timeout("connect", timeout)))
            }
        };

        match outcome {
            Ok(()) => {
                self.shared.set_state(ConnectionState::Connected);
                info!("Connected");
                *slot = Some(session);
                Ok(())
            }
            Err(e)
                if e.is_timeout() && self.state() == ConnectionState::AwaitingFirstReport =>
            {
                warn!("No report before timeout; session left open for late reports");
                self.shared.set_state(ConnectionState::Disconnected);
                *slot = Some(session);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Connect failed");
                session.cancel.cancel();
                session.task.abort();
                self.shared.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn handshake(
        &self,
        client: &AsyncClient,
        connack: oneshot::Receiver<Result<()>>,
        first_report: oneshot::Receiver<()>,
    ) -> Result<()> {
        match connack.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(Error::connection_failed(
                    &self.host,
                    "session closed before CONNACK",
                ));
            }
        }

        self.shared.set_state(ConnectionState::AwaitingFirstReport);
        for topic in self.config.topics() {
            debug!(%topic, "Subscribing");
            client.subscribe(topic, QoS::AtMostOnce).await?;
        }

        first_report.await.map_err(|_| {
            Error::connection_failed(&self.host, "session closed before the first report")
        })
    }

    /// Close the session.
    ///
    /// Sends an MQTT DISCONNECT and waits up to the configured disconnect
    /// timeout for the event loop to finish before cancelling it.
    #[tracing::instrument(level = "info", skip_all, fields(host = %self.host))]
    pub async fn disconnect(&self) -> Result<()> {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            shutdown_session(session, self.config.disconnect_timeout, &self.host).await;
            info!("Disconnected");
        }
        self.shared.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    fn mqtt_options(&self) -> Result<MqttOptions> {
        let client_id = format!(
            "{}_{}",
            self.config.client_id_prefix,
            Uuid::new_v4().simple()
        );
        let mut options = MqttOptions::new(client_id, &self.host, self.config.port);
        options.set_credentials(PRINTER_USERNAME, &self.access_code);
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);
        options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);

        let tls_config = tls::insecure_client_config()?;
        options.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(
            Arc::new(tls_config),
        )));
        Ok(options)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let Some(session) = self.session.get_mut().take() else {
            return;
        };

        warn!(
            host = %self.host,
            "ConnectionManager dropped without calling disconnect() - performing best-effort cleanup"
        );

        let disconnect_timeout = self.config.disconnect_timeout;
        let host = self.host.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    shutdown_session(session, disconnect_timeout, &host).await;
                });
            }
            Err(_) => {
                session.cancel.cancel();
                session.task.abort();
            }
        }
    }
}

async fn shutdown_session(session: Session, disconnect_timeout: Duration, host: &str) {
    let Session {
        client,
        mut task,
        cancel,
    } = session;

    if let Err(e) = client.try_disconnect() {
        debug!(host, error = %e, "Could not queue DISCONNECT");
    }
    if tokio::time::timeout(disconnect_timeout, &mut task)
        .await
        .is_err()
    {
        warn!(host, ?disconnect_timeout, "Graceful disconnect timed out; cancelling I/O task");
    }
    cancel.cancel();
    task.abort();
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    connack: oneshot::Sender<Result<()>>,
    first_report: oneshot::Sender<()>,
) {
    let mut connack = Some(connack);
    let mut first_report = Some(first_report);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!(host = %shared.host, session_present = ack.session_present, "CONNACK");
                if let Some(tx) = connack.take() {
                    let _ = tx.send(Ok(()));
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match Report::from_slice(&publish.payload) {
                    Ok(report) => {
                        debug!(
                            host = %shared.host,
                            topic = %publish.topic,
                            sequence_id = %report.sequence_id,
                            "Report received"
                        );
                        shared.listener.on_report(report);
                        if let Some(tx) = first_report.take() {
                            let _ = tx.send(());
                        }
                    }
                    Err(e) => {
                        debug!(
                            host = %shared.host,
                            topic = %publish.topic,
                            bytes = publish.payload.len(),
                            error = %e,
                            "Dropping message that is not a status report"
                        );
                    }
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                debug!(host = %shared.host, pkid = ack.pkid, "SUBACK");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!(host = %shared.host, "DISCONNECT sent");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                match connack.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(Error::from(e)));
                    }
                    None => warn!(host = %shared.host, error = %e, "MQTT session ended"),
                }
                break;
            }
        }
    }

    if !cancel.is_cancelled() {
        shared.set_state(ConnectionState::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingListener {
        reports: StdMutex<Vec<Report>>,
        states: StdMutex<Vec<ConnectionState>>,
    }

    impl SessionListener for RecordingListener {
        fn on_report(&self, report: Report) {
            self.reports.lock().unwrap().push(report);
        }

        fn on_state_changed(&self, state: ConnectionState) {
            self.states.lock().unwrap().push(state);
        }
    }

    fn manager(host: &str, config: ConnectionConfig) -> (ConnectionManager, Arc<RecordingListener>) {
        let listener = Arc::new(RecordingListener::default());
        let manager = ConnectionManager::new(host, "12345678", config, listener.clone());
        (manager, listener)
    }

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.port, 8883);
        assert_eq!(config.ftps_port, 990);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.disconnect_timeout, Duration::from_secs(1));
        assert!(!config.subscribe_all);
        assert!(config.serial.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = ConnectionConfig::new()
            .port(1883)
            .connect_timeout(Duration::from_secs(3))
            .disconnect_timeout(Duration::from_millis(200))
            .keep_alive(Duration::from_secs(5))
            .ftps_port(2990)
            .client_id_prefix("test");
        assert_eq!(config.port, 1883);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.disconnect_timeout, Duration::from_millis(200));
        assert_eq!(config.keep_alive, Duration::from_secs(5));
        assert_eq!(config.ftps_port, 2990);
        assert_eq!(config.client_id_prefix, "test");
    }

    #[test]
    fn test_topics() {
        assert_eq!(
            ConnectionConfig::default().topics(),
            vec!["device/+/report", "bblp/printer/report"]
        );
        assert_eq!(
            ConnectionConfig::default().serial("ABC").topics(),
            vec!["device/ABC/report", "bblp/printer/report"]
        );
        assert_eq!(
            ConnectionConfig::default().subscribe_all(true).topics(),
            vec!["#"]
        );
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionConfig::default().validate().is_ok());
        assert!(ConnectionConfig::default().port(0).validate().is_err());
        assert!(
            ConnectionConfig::default()
                .keep_alive(Duration::from_millis(500))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
    }

    #[tokio::test]
    async fn test_initial_state_and_idle_disconnect() {
        let (manager, listener) = manager("127.0.0.1", ConnectionConfig::default());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.is_connected());

        manager.disconnect().await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(listener.states.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (manager, listener) = manager("127.0.0.1", ConnectionConfig::default().port(port));

        let err = manager
            .connect(Duration::from_secs(5), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_transport(), "unexpected error: {err:?}");
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        let states = listener.states.lock().unwrap().clone();
        assert_eq!(
            states,
            vec![ConnectionState::Connecting, ConnectionState::Disconnected]
        );
    }

    #[tokio::test]
    async fn test_empty_host_is_invalid_config() {
        let (manager, _) = manager("", ConnectionConfig::default());
        let err = manager
            .connect(Duration::from_secs(1), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
