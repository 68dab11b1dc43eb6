use anyhow::Result;

use bambu_cli::config::{Config, default_log_path};
use bambu_cli::tui;

#[tokio::main]
async fn main() -> Result<()> {
    tui::init_file_logging(&default_log_path());
    tui::run(Config::load()).await
}
