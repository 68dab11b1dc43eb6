use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use bambu_cli::{config, format};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The dashboard owns the terminal, so it logs to a file instead.
    #[cfg(feature = "tui")]
    if let Commands::Tui = cli.command {
        bambu_cli::tui::init_file_logging(&config::default_log_path());
        return bambu_cli::tui::run(config::Config::load()).await;
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Add {
            name,
            ip,
            access_code,
            serial,
        } => commands::cmd_add(name, ip, access_code, serial, cli.quiet),
        Commands::Remove { ip } => commands::cmd_remove(&ip, cli.quiet),
        Commands::List { output } => commands::cmd_list(output.format, cli.no_color),
        Commands::Status { printer, output } => {
            commands::cmd_status(printer, output.format, cli.no_color).await
        }
        Commands::Watch { printer, output } => {
            commands::cmd_watch(printer, output.format, cli.no_color).await
        }
        Commands::Files { printer, output } => {
            commands::cmd_files(printer, output.format, cli.no_color).await
        }
        #[cfg(feature = "tui")]
        Commands::Tui => unreachable!("handled before logging setup"),
    }
}
