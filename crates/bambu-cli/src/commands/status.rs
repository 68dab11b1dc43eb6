//! Status command implementation.

use anyhow::Result;
use tracing::{debug, warn};

use bambu_core::Printer;

use super::resolve_printer;
use crate::cli::{OutputFormat, PrinterArgs};
use crate::config::Config;
use crate::format::{format_status_json, format_status_text};

pub async fn cmd_status(args: PrinterArgs, format: OutputFormat, no_color: bool) -> Result<()> {
    let config = Config::load();
    let target = resolve_printer(&args, &config)?;

    let printer = Printer::with_config(
        target.ip_address.clone(),
        target.access_code.clone(),
        target.connection_config(),
    );
    debug!(ip = %target.ip_address, timeout = ?args.timeout(), "Connecting");
    printer.connect(args.timeout()).await?;

    let snapshot = printer.snapshot();
    let report = printer.latest_report();
    let connection = printer.connection_state();

    if let Err(e) = printer.dispose().await {
        warn!(error = %e, "Disconnect failed");
    }

    match format {
        OutputFormat::Json => print!(
            "{}",
            format_status_json(&target, connection, &snapshot, report.as_deref())?
        ),
        OutputFormat::Text => print!(
            "{}",
            format_status_text(target.display_name(), &snapshot, report.as_deref(), no_color)
        ),
    }
    Ok(())
}
