//! Printer configuration commands: add, remove and list.

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use tracing::info;

use crate::config::{Config, PrinterConfig};

use crate::cli::OutputFormat;
use crate::format::format_printer_list;

pub fn cmd_add(
    name: String,
    ip: String,
    access_code: String,
    serial: Option<String>,
    quiet: bool,
) -> Result<()> {
    if ip.trim().is_empty() {
        bail!("IP address must not be empty");
    }
    if access_code.trim().is_empty() {
        bail!("Access code must not be empty");
    }

    let printer = PrinterConfig {
        name,
        ip_address: ip.trim().to_string(),
        access_code,
        serial,
    };
    let label = format!("{} ({})", printer.display_name(), printer.ip_address);
    Config::modify(|config| config.add(printer))?;

    info!(path = %Config::path().display(), "Config saved");
    if !quiet {
        println!("Added printer {}", label.green());
    }
    Ok(())
}

pub fn cmd_remove(ip: &str, quiet: bool) -> Result<()> {
    let removed = Config::modify(|config| match config.remove(ip) {
        Some(removed) => Ok(removed),
        None => bail!("Printer with IP {ip} not found"),
    })?;

    if !quiet {
        println!(
            "Removed printer {} ({})",
            removed.display_name(),
            removed.ip_address
        );
    }
    Ok(())
}

pub fn cmd_list(format: OutputFormat, no_color: bool) -> Result<()> {
    let config = Config::load();
    match format {
        OutputFormat::Json => {
            // Access codes stay out of the listing.
            let entries: Vec<_> = config
                .printers
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "ip_address": p.ip_address,
                        "serial": p.serial,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => print!("{}", format_printer_list(&config.printers, no_color)),
    }
    Ok(())
}
