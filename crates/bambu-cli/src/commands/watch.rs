//! Watch command implementation.
//!
//! Holds one MQTT session open and prints every field change until Ctrl-C
//! or until the session drops.

use anyhow::{Result, anyhow};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use bambu_core::{ConnectionState, Printer, PrinterEvent};

use super::resolve_printer;
use crate::cli::{OutputFormat, PrinterArgs};
use crate::config::Config;
use crate::format::{format_change, format_connection_change, format_status_text};

pub async fn cmd_watch(args: PrinterArgs, format: OutputFormat, no_color: bool) -> Result<()> {
    let config = Config::load();
    let target = resolve_printer(&args, &config)?;

    let printer = Printer::with_config(
        target.ip_address.clone(),
        target.access_code.clone(),
        target.connection_config(),
    );
    // Subscribe before connecting so the initial changes are not missed.
    let mut events = printer.subscribe();
    printer.connect(args.timeout()).await?;

    if format == OutputFormat::Text {
        print!(
            "{}",
            format_status_text(
                target.display_name(),
                &printer.snapshot(),
                printer.latest_report().as_deref(),
                no_color
            )
        );
        // The first report's changes are already in the block above.
        while events.try_recv().is_ok() {}
    }

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break Ok(());
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if format == OutputFormat::Json {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{line}"),
                            Err(e) => break Err(e.into()),
                        }
                    } else {
                        match &event {
                            PrinterEvent::FieldChanged { change, .. } => {
                                println!("{}", format_change(change, no_color));
                            }
                            PrinterEvent::ConnectionStateChanged { state, .. } => {
                                println!("{}", format_connection_change(*state, no_color));
                            }
                            _ => {}
                        }
                    }
                    if let PrinterEvent::ConnectionStateChanged {
                        state: ConnectionState::Disconnected,
                        ..
                    } = event
                    {
                        break Err(anyhow!("Connection to {} lost", target.ip_address));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break Ok(()),
            }
        }
    };

    if let Err(e) = printer.dispose().await {
        warn!(error = %e, "Disconnect failed");
    }
    result
}
