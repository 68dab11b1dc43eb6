//! Files command implementation.

use anyhow::Result;

use bambu_core::Printer;

use super::resolve_printer;
use crate::cli::{OutputFormat, PrinterArgs};
use crate::config::Config;
use crate::format::format_file_list;

pub async fn cmd_files(args: PrinterArgs, format: OutputFormat, no_color: bool) -> Result<()> {
    let config = Config::load();
    let target = resolve_printer(&args, &config)?;

    // FTPS only; no MQTT session is needed.
    let printer = Printer::with_config(
        target.ip_address.clone(),
        target.access_code.clone(),
        target.connection_config(),
    );
    let files = printer.list_files(args.timeout()).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&files)?),
        OutputFormat::Text => print!("{}", format_file_list(&files, no_color)),
    }
    Ok(())
}
