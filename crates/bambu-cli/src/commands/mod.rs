//! Command implementations for the CLI.

mod files;
mod printers;
mod status;
mod watch;

pub use files::cmd_files;
pub use printers::{cmd_add, cmd_list, cmd_remove};
pub use status::cmd_status;
pub use watch::cmd_watch;

use anyhow::{Result, bail};

use crate::config::{Config, PrinterConfig};

use crate::cli::PrinterArgs;

/// Resolve the target printer from arguments and config.
///
/// A name or IP found in the config wins. An unknown value is used as an
/// ad hoc host when `--access-code` is given. With no `--printer`, a config
/// holding exactly one printer selects it.
pub fn resolve_printer(args: &PrinterArgs, config: &Config) -> Result<PrinterConfig> {
    match &args.printer {
        Some(target) => {
            if let Some(found) = config.find(target) {
                let mut found = found.clone();
                if let Some(code) = &args.access_code {
                    found.access_code = code.clone();
                }
                return Ok(found);
            }
            match &args.access_code {
                Some(code) => Ok(PrinterConfig::new("", target.clone(), code.clone())),
                None => bail!(
                    "Printer '{target}' is not configured. Add it with `bambu add` or pass --access-code."
                ),
            }
        }
        None => match config.printers.as_slice() {
            [only] => Ok(only.clone()),
            [] => bail!("No printers configured. Add one with `bambu add`."),
            _ => bail!("Several printers are configured; choose one with --printer."),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(printer: Option<&str>, access_code: Option<&str>) -> PrinterArgs {
        PrinterArgs {
            printer: printer.map(String::from),
            access_code: access_code.map(String::from),
            timeout: 10,
        }
    }

    fn config(count: usize) -> Config {
        let mut config = Config::default();
        for i in 0..count {
            config
                .add(PrinterConfig::new(
                    format!("P{i}"),
                    format!("192.168.1.{}", 50 + i),
                    "code",
                ))
                .unwrap();
        }
        config
    }

    #[test]
    fn test_single_printer_is_default() {
        let printer = resolve_printer(&args(None, None), &config(1)).unwrap();
        assert_eq!(printer.ip_address, "192.168.1.50");
    }

    #[test]
    fn test_ambiguous_without_printer() {
        assert!(resolve_printer(&args(None, None), &config(2)).is_err());
        assert!(resolve_printer(&args(None, None), &config(0)).is_err());
    }

    #[test]
    fn test_by_name_and_ip() {
        let config = config(2);
        assert_eq!(
            resolve_printer(&args(Some("p1"), None), &config)
                .unwrap()
                .ip_address,
            "192.168.1.51"
        );
        assert_eq!(
            resolve_printer(&args(Some("192.168.1.50"), None), &config)
                .unwrap()
                .name,
            "P0"
        );
    }

    #[test]
    fn test_ad_hoc_requires_access_code() {
        let config = config(0);
        assert!(resolve_printer(&args(Some("10.0.0.9"), None), &config).is_err());
        let printer = resolve_printer(&args(Some("10.0.0.9"), Some("abc")), &config).unwrap();
        assert_eq!(printer.ip_address, "10.0.0.9");
        assert_eq!(printer.access_code, "abc");
    }
}
