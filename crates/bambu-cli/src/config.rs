//! Printer configuration file management.
//!
//! Printers are stored as `[[printers]]` tables in
//! `~/.config/bambu/printers.toml` (or the platform equivalent), keyed by IP
//! address. Set `BAMBU_CONFIG` to use a different file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bambu_core::ConnectionConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "BAMBU_CONFIG";

/// One configured printer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// User-friendly name.
    pub name: String,
    /// IP address on the local network.
    pub ip_address: String,
    /// LAN access code shown on the printer's screen.
    pub access_code: String,
    /// Serial number, used to narrow the report subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

impl PrinterConfig {
    pub fn new(
        name: impl Into<String>,
        ip_address: impl Into<String>,
        access_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ip_address: ip_address.into(),
            access_code: access_code.into(),
            serial: None,
        }
    }

    /// Connection settings for this printer.
    pub fn connection_config(&self) -> ConnectionConfig {
        match &self.serial {
            Some(serial) => ConnectionConfig::default().serial(serial.clone()),
            None => ConnectionConfig::default(),
        }
    }

    /// Name for display, falling back to the IP address.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.ip_address
        } else {
            &self.name
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Configured printers
    #[serde(default)]
    pub printers: Vec<PrinterConfig>,
}

impl Config {
    /// Get config file path
    pub fn path() -> PathBuf {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bambu")
            .join("printers.toml")
    }

    /// Load config from the default path, or return default if missing or unreadable.
    ///
    /// Only for read-only use; commands that save go through [`Config::modify`].
    pub fn load() -> Self {
        let path = Self::path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {e:#}");
                Self::default()
            }
        }
    }

    /// Load config from a specific file. A missing file is an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load the config at the default path, apply `edit` and save it back.
    ///
    /// Unlike [`Config::load`], a file that fails to parse is an error and is
    /// left untouched.
    pub fn modify<T>(edit: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        Self::modify_at(&Self::path(), edit)
    }

    /// Load the config at `path`, apply `edit` and save it back.
    pub fn modify_at<T>(path: &Path, edit: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut config = Self::load_from(path)?;
        let value = edit(&mut config)?;
        config.save_to(path)?;
        Ok(value)
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Add a printer. IP addresses must be unique.
    pub fn add(&mut self, printer: PrinterConfig) -> Result<()> {
        if self
            .printers
            .iter()
            .any(|p| p.ip_address == printer.ip_address)
        {
            return Err(bambu_core::Error::DuplicatePrinter(printer.ip_address).into());
        }
        self.printers.push(printer);
        Ok(())
    }

    /// Remove the printer with this IP, returning it if present.
    pub fn remove(&mut self, ip_address: &str) -> Option<PrinterConfig> {
        let index = self
            .printers
            .iter()
            .position(|p| p.ip_address == ip_address)?;
        Some(self.printers.remove(index))
    }

    /// Find a printer by IP address or (case-insensitive) name.
    pub fn find(&self, name_or_ip: &str) -> Option<&PrinterConfig> {
        self.printers
            .iter()
            .find(|p| p.ip_address == name_or_ip)
            .or_else(|| {
                self.printers
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name_or_ip))
            })
    }
}

/// Default path of the TUI log file.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bambu")
        .join("bambu-tui.log")
}
