//! Multi-printer management.
//!
//! [`PrinterManager`] keeps a registry of printers keyed by IP address and
//! runs connect/disconnect across all of them concurrently. Events from
//! every registered printer are forwarded to one dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionConfig, ConnectionState};
use crate::error::{Error, Result};
use crate::events::EventDispatcher;
use crate::printer::Printer;

/// A printer registered with the manager.
#[derive(Debug)]
pub struct ManagedPrinter {
    /// Display name.
    pub name: String,
    printer: Arc<Printer>,
    forwarder: JoinHandle<()>,
}

impl ManagedPrinter {
    /// Shared handle to the printer.
    pub fn printer(&self) -> Arc<Printer> {
        Arc::clone(&self.printer)
    }
}

/// Configuration for the printer manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Connection settings for new printers.
    pub connection: ConnectionConfig,
    /// Event channel capacity.
    pub event_capacity: usize,
    /// Upper bound for each printer's disconnect in `disconnect_all`.
    pub disconnect_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            event_capacity: 100,
            disconnect_timeout: Duration::from_secs(5),
        }
    }
}

/// Manager for multiple printers.
pub struct PrinterManager {
    /// Map of IP address to managed printer.
    printers: RwLock<HashMap<String, ManagedPrinter>>,
    events: EventDispatcher,
    config: ManagerConfig,
}

impl std::fmt::Debug for PrinterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PrinterManager {
    /// Create a new printer manager.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create a manager with full configuration.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            printers: RwLock::new(HashMap::new()),
            events: EventDispatcher::new(config.event_capacity),
            config,
        }
    }

    /// Get the event dispatcher for subscribing to events of all printers.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Register a printer. Fails with [`Error::DuplicatePrinter`] if the IP
    /// is already registered.
    pub async fn add(
        &self,
        name: impl Into<String>,
        ip_address: &str,
        access_code: &str,
    ) -> Result<Arc<Printer>> {
        self.add_with_config(name, ip_address, access_code, self.config.connection.clone())
            .await
    }

    /// Register a printer with its own connection settings, such as a known
    /// serial number.
    pub async fn add_with_config(
        &self,
        name: impl Into<String>,
        ip_address: &str,
        access_code: &str,
        connection: ConnectionConfig,
    ) -> Result<Arc<Printer>> {
        let mut printers = self.printers.write().await;
        if printers.contains_key(ip_address) {
            return Err(Error::DuplicatePrinter(ip_address.to_string()));
        }

        let printer = Arc::new(Printer::with_config(ip_address, access_code, connection));
        let forwarder = self.spawn_forwarder(&printer);
        let name = name.into();
        info!(name = %name, ip = %ip_address, "Printer added");

        printers.insert(
            ip_address.to_string(),
            ManagedPrinter {
                name,
                printer: Arc::clone(&printer),
                forwarder,
            },
        );
        Ok(printer)
    }

    fn spawn_forwarder(&self, printer: &Printer) -> JoinHandle<()> {
        let mut rx = printer.subscribe();
        let events = self.events.clone();
        let host = printer.host().to_string();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => events.send(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(host = %host, skipped, "Event forwarder lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Unregister a printer, disconnecting and disposing it.
    pub async fn remove(&self, ip_address: &str) -> Result<()> {
        let managed = self
            .printers
            .write()
            .await
            .remove(ip_address)
            .ok_or_else(|| Error::PrinterNotFound(ip_address.to_string()))?;

        let result = managed.printer.dispose().await;
        managed.forwarder.abort();
        info!(ip = %ip_address, "Printer removed");
        result
    }

    /// Get a registered printer by IP.
    pub async fn get(&self, ip_address: &str) -> Option<Arc<Printer>> {
        self.printers
            .read()
            .await
            .get(ip_address)
            .map(ManagedPrinter::printer)
    }

    /// Name and IP of every registered printer, sorted by IP.
    pub async fn list(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .printers
            .read()
            .await
            .iter()
            .map(|(ip, managed)| (managed.name.clone(), ip.clone()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    pub async fn printer_count(&self) -> usize {
        self.printers.read().await.len()
    }

    pub async fn connected_count(&self) -> usize {
        self.printers
            .read()
            .await
            .values()
            .filter(|m| m.printer.connection_state() == ConnectionState::Connected)
            .count()
    }

    fn handles(printers: &HashMap<String, ManagedPrinter>) -> Vec<(String, Arc<Printer>)> {
        printers
            .iter()
            .map(|(ip, managed)| (ip.clone(), managed.printer()))
            .collect()
    }

    /// Connect every printer concurrently.
    ///
    /// Failures do not stop the others; returns a map of IP to result.
    pub async fn connect_all(&self) -> HashMap<String, Result<()>> {
        let printers = Self::handles(&*self.printers.read().await);
        let timeout = self.config.connection.connect_timeout;

        let connect_futures = printers.into_iter().map(|(ip, printer)| async move {
            let result = printer.connect(timeout).await;
            if let Err(e) = &result {
                warn!(ip = %ip, error = %e, "Connect failed");
            }
            (ip, result)
        });

        join_all(connect_futures).await.into_iter().collect()
    }

    /// Disconnect every printer concurrently, each bounded by the
    /// configured disconnect timeout.
    pub async fn disconnect_all(&self) -> HashMap<String, Result<()>> {
        // Collect handles first so the lock is not held across awaits
        let printers = Self::handles(&*self.printers.read().await);
        let timeout = self.config.disconnect_timeout;

        let disconnect_futures = printers.into_iter().map(|(ip, printer)| async move {
            let result = tokio::time::timeout(timeout, printer.disconnect())
                .await
                .unwrap_or_else(|_| Err(Error::timeout("disconnect", timeout)));
            debug!(ip = %ip, ok = result.is_ok(), "Disconnected");
            (ip, result)
        });

        join_all(disconnect_futures).await.into_iter().collect()
    }
}

impl Default for PrinterManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PrinterManager {
    fn drop(&mut self) {
        if let Ok(printers) = self.printers.try_read() {
            for managed in printers.values() {
                managed.forwarder.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PrinterEvent;

    #[tokio::test]
    async fn test_manager_add_printer() {
        let manager = PrinterManager::new();
        manager.add("X1C", "192.168.1.50", "12345678").await.unwrap();

        assert_eq!(manager.printer_count().await, 1);
        assert_eq!(
            manager.list().await,
            vec![("X1C".to_string(), "192.168.1.50".to_string())]
        );
        assert!(manager.get("192.168.1.50").await.is_some());
        assert!(manager.get("192.168.1.51").await.is_none());
    }

    #[tokio::test]
    async fn test_manager_add_with_config_keeps_serial() {
        let manager = PrinterManager::new();
        let printer = manager
            .add_with_config(
                "X1C",
                "192.168.1.50",
                "12345678",
                ConnectionConfig::default().serial("01P00A123456789"),
            )
            .await
            .unwrap();
        assert_eq!(printer.config().serial.as_deref(), Some("01P00A123456789"));
        assert_eq!(
            printer.config().topics()[0],
            "device/01P00A123456789/report"
        );

        let err = manager
            .add_with_config("Y", "192.168.1.50", "1", ConnectionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePrinter(_)));
    }

    #[tokio::test]
    async fn test_manager_rejects_duplicate() {
        let manager = PrinterManager::new();
        manager.add("a", "192.168.1.50", "1").await.unwrap();
        let err = manager.add("b", "192.168.1.50", "2").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Printer with IP 192.168.1.50 already exists."
        );
        assert_eq!(manager.printer_count().await, 1);
    }

    #[tokio::test]
    async fn test_manager_remove_disposes() {
        let manager = PrinterManager::new();
        let printer = manager.add("a", "192.168.1.50", "1").await.unwrap();
        manager.remove("192.168.1.50").await.unwrap();

        assert_eq!(manager.printer_count().await, 0);
        assert!(printer.is_disposed());
        assert!(matches!(
            manager.remove("192.168.1.50").await,
            Err(Error::PrinterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_manager_not_connected_by_default() {
        let manager = PrinterManager::new();
        manager.add("a", "192.168.1.50", "1").await.unwrap();
        assert_eq!(manager.connected_count().await, 0);
    }

    #[tokio::test]
    async fn test_connect_all_reports_each_failure() {
        // Nothing listens on these ports, so every connect fails fast.
        let config = ManagerConfig {
            connection: ConnectionConfig::default()
                .port(1)
                .connect_timeout(Duration::from_secs(2)),
            ..Default::default()
        };
        let manager = PrinterManager::with_config(config);
        manager.add("a", "127.0.0.1", "1").await.unwrap();
        manager.add("b", "127.0.0.2", "1").await.unwrap();

        let results = manager.connect_all().await;
        assert_eq!(results.len(), 2);
        assert!(results.values().all(|r| r.is_err()));
        assert_eq!(manager.connected_count().await, 0);

        let results = manager.disconnect_all().await;
        assert!(results.values().all(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn test_manager_forwards_events() {
        let config = ManagerConfig {
            connection: ConnectionConfig::default()
                .port(1)
                .connect_timeout(Duration::from_secs(2)),
            ..Default::default()
        };
        let manager = PrinterManager::with_config(config);
        let mut rx = manager.events().subscribe();
        let printer = manager.add("a", "127.0.0.1", "1").await.unwrap();

        let _ = printer.connect(Duration::from_secs(2)).await;
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            PrinterEvent::ConnectionStateChanged {
                state: ConnectionState::Connecting,
                ..
            }
        ));
        assert_eq!(event.host(), "127.0.0.1");
    }
}
