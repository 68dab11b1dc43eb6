//! CLI argument definitions using clap.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reusable printer selection arguments
#[derive(Debug, Clone, Args)]
pub struct PrinterArgs {
    /// Printer name or IP address; may be omitted when only one printer is configured
    #[arg(short, long, env = "BAMBU_PRINTER")]
    pub printer: Option<String>,

    /// Access code for a printer that is not in the config
    #[arg(long, env = "BAMBU_ACCESS_CODE", hide_env_values = true)]
    pub access_code: Option<String>,

    /// Connection timeout in seconds
    #[arg(short = 'T', long, default_value = "10")]
    pub timeout: u64,
}

impl PrinterArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Parser)]
#[command(name = "bambu")]
#[command(author, version, about = "CLI for Bambu Lab printers on the local network", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a printer to the configuration
    Add {
        /// Friendly name
        #[arg(short, long)]
        name: String,

        /// IP address of the printer
        #[arg(short, long)]
        ip: String,

        /// LAN access code (shown on the printer's screen)
        #[arg(short, long)]
        access_code: String,

        /// Serial number, narrows the report subscription
        #[arg(short, long)]
        serial: Option<String>,
    },

    /// Remove a printer from the configuration
    Remove {
        /// IP address of the printer
        ip: String,
    },

    /// List configured printers
    List {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Connect, wait for the first report and print a status snapshot
    Status {
        #[command(flatten)]
        printer: PrinterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Stream field changes until Ctrl-C
    Watch {
        #[command(flatten)]
        printer: PrinterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List print files on the printer's storage
    Files {
        #[command(flatten)]
        printer: PrinterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Open the interactive terminal dashboard
    #[cfg(feature = "tui")]
    Tui,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "bambu",
            "add",
            "--name",
            "X1C",
            "--ip",
            "192.168.1.50",
            "--access-code",
            "12345678",
        ])
        .unwrap();
        match cli.command {
            Commands::Add {
                name,
                ip,
                access_code,
                serial,
            } => {
                assert_eq!(name, "X1C");
                assert_eq!(ip, "192.168.1.50");
                assert_eq!(access_code, "12345678");
                assert!(serial.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_status_json() {
        let cli = Cli::try_parse_from([
            "bambu", "status", "-p", "X1C", "--format", "json", "-T", "20",
        ])
        .unwrap();
        match cli.command {
            Commands::Status { printer, output } => {
                assert_eq!(printer.printer.as_deref(), Some("X1C"));
                assert_eq!(printer.timeout(), Duration::from_secs(20));
                assert_eq!(output.format, OutputFormat::Json);
            }
            _ => panic!("expected status"),
        }
    }
}
