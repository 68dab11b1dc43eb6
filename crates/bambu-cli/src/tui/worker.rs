//! Background worker for printer sessions.
//!
//! The [`PrinterWorker`] owns a [`PrinterManager`] and runs in its own Tokio
//! task so the render loop never waits on the network. It uses
//! `tokio::select!` to handle:
//! - Incoming [`Command`]s from the UI
//! - Events from every managed printer, forwarded as [`UiEvent`]s

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bambu_core::{DEFAULT_LIST_TIMEOUT, PrinterEvent, PrinterManager};

use super::messages::{Command, UiEvent};
use crate::config::Config;

/// Background worker that handles MQTT and FTPS operations.
pub struct PrinterWorker {
    /// Receiver for commands from the UI.
    command_rx: mpsc::Receiver<Command>,
    /// Sender for events back to the UI.
    event_tx: mpsc::Sender<UiEvent>,
    manager: Arc<PrinterManager>,
    /// Cancels in-flight connects on shutdown.
    cancel_token: CancellationToken,
}

impl PrinterWorker {
    pub fn new(
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<UiEvent>,
        manager: Arc<PrinterManager>,
    ) -> Self {
        Self {
            command_rx,
            event_tx,
            manager,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Register every configured printer with the manager.
    ///
    /// A printer the manager rejects is logged and skipped.
    pub async fn register(&self, config: &Config) {
        for printer in &config.printers {
            if let Err(e) = self
                .manager
                .add_with_config(
                    printer.display_name(),
                    &printer.ip_address,
                    &printer.access_code,
                    printer.connection_config(),
                )
                .await
            {
                warn!(ip = %printer.ip_address, error = %e, "Skipping printer");
            }
        }
    }

    /// Run until [`Command::Shutdown`] arrives or the command channel closes.
    pub async fn run(mut self) {
        info!("PrinterWorker started");
        let mut printer_events = self.manager.events().subscribe();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown) => {
                            info!("PrinterWorker received shutdown command");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed, shutting down worker");
                            break;
                        }
                    }
                }
                event = printer_events.recv() => {
                    match event {
                        Ok(event) => self.forward(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Worker lagged behind printer events");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }

        self.cancel_token.cancel();
        for (ip, result) in self.manager.disconnect_all().await {
            if let Err(e) = result {
                debug!(ip = %ip, error = %e, "Disconnect on shutdown failed");
            }
        }
        info!("PrinterWorker stopped");
    }

    async fn handle_command(&self, cmd: Command) {
        debug!(?cmd, "Handling command");
        match cmd {
            Command::Connect { ip } => self.handle_connect(ip).await,
            Command::Disconnect { ip } => self.handle_disconnect(&ip).await,
            Command::ConnectAll => self.handle_connect_all(),
            Command::ListFiles { ip } => self.handle_list_files(ip).await,
            Command::Shutdown => {}
        }
    }

    async fn handle_connect(&self, ip: String) {
        let Some(printer) = self.manager.get(&ip).await else {
            self.send(UiEvent::ConnectFailed {
                ip,
                error: "Printer not registered".to_string(),
            })
            .await;
            return;
        };
        let timeout = self.manager.config().connection.connect_timeout;
        let cancel = self.cancel_token.child_token();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = printer.connect_with_cancel(timeout, cancel).await {
                warn!(ip = %ip, error = %e, "Connect failed");
                let _ = tx
                    .send(UiEvent::ConnectFailed {
                        ip,
                        error: e.to_string(),
                    })
                    .await;
            }
        });
    }

    fn handle_connect_all(&self) {
        let manager = Arc::clone(&self.manager);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            for (ip, result) in manager.connect_all().await {
                if let Err(e) = result {
                    let _ = tx
                        .send(UiEvent::ConnectFailed {
                            ip,
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        });
    }

    async fn handle_disconnect(&self, ip: &str) {
        let Some(printer) = self.manager.get(ip).await else {
            return;
        };
        if let Err(e) = printer.disconnect().await {
            error!(ip = %ip, error = %e, "Disconnect failed");
        }
    }

    async fn handle_list_files(&self, ip: String) {
        let Some(printer) = self.manager.get(&ip).await else {
            return;
        };
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match printer.list_files(DEFAULT_LIST_TIMEOUT).await {
                Ok(files) => UiEvent::FilesListed { ip, files },
                Err(e) => UiEvent::FilesFailed {
                    ip,
                    error: e.to_string(),
                },
            };
            let _ = tx.send(event).await;
        });
    }

    /// Translate a printer event into a UI update.
    ///
    /// Field changes are folded into the snapshot sent on `ReportApplied`.
    async fn forward(&self, event: PrinterEvent) {
        let update = match event {
            PrinterEvent::ConnectionStateChanged { host, state } => {
                Some(UiEvent::ConnectionChanged { ip: host, state })
            }
            PrinterEvent::ReportApplied { host, .. } => {
                self.manager
                    .get(&host)
                    .await
                    .map(|printer| UiEvent::SnapshotUpdated {
                        snapshot: printer.snapshot(),
                        ip: host,
                    })
            }
            _ => None,
        };
        if let Some(update) = update {
            self.send(update).await;
        }
    }

    async fn send(&self, event: UiEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("UI event channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrinterConfig;

    #[tokio::test]
    async fn test_register_skips_duplicates() {
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, _event_rx) = mpsc::channel(4);
        let manager = Arc::new(PrinterManager::new());
        let worker = PrinterWorker::new(cmd_rx, event_tx, Arc::clone(&manager));

        let config = Config {
            printers: vec![
                PrinterConfig::new("A", "192.0.2.1", "x"),
                PrinterConfig::new("B", "192.0.2.1", "y"),
                PrinterConfig::new("C", "192.0.2.2", "z"),
            ],
        };
        worker.register(&config).await;
        assert_eq!(manager.printer_count().await, 2);
    }

    #[tokio::test]
    async fn test_register_passes_serial() {
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, _event_rx) = mpsc::channel(4);
        let manager = Arc::new(PrinterManager::new());
        let worker = PrinterWorker::new(cmd_rx, event_tx, Arc::clone(&manager));

        let mut with_serial = PrinterConfig::new("X1C", "192.0.2.1", "x");
        with_serial.serial = Some("01P00A123456789".to_string());
        let config = Config {
            printers: vec![with_serial, PrinterConfig::new("A1", "192.0.2.2", "y")],
        };
        worker.register(&config).await;

        let printer = manager.get("192.0.2.1").await.unwrap();
        assert_eq!(printer.config().serial.as_deref(), Some("01P00A123456789"));
        let printer = manager.get("192.0.2.2").await.unwrap();
        assert!(printer.config().serial.is_none());
    }

    #[tokio::test]
    async fn test_connect_unknown_printer_reports_failure() {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let worker = PrinterWorker::new(cmd_rx, event_tx, Arc::new(PrinterManager::new()));
        let handle = tokio::spawn(worker.run());

        cmd_tx
            .send(Command::Connect {
                ip: "192.0.2.9".to_string(),
            })
            .await
            .unwrap();
        match event_rx.recv().await {
            Some(UiEvent::ConnectFailed { ip, .. }) => assert_eq!(ip, "192.0.2.9"),
            other => panic!("unexpected event: {other:?}"),
        }

        cmd_tx.send(Command::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
