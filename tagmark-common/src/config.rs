//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file; it cannot change while
//! the kiosk is running. All external identities (serial port, baud rate,
//! EmailJS credentials) live here rather than in code.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct KioskConfig {
    /// Root folder holding the attendance database (optional)
    ///
    /// If not specified, resolution falls through to environment → OS default.
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Serial link to the RFID reader
    #[serde(default)]
    pub serial: SerialConfig,

    /// Transactional-email identity; absent section disables notifications
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial link configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Port name; omit to pick the first port matching the platform convention
    #[serde(default)]
    pub port: Option<String>,

    /// Baud rate of the reader's serial link
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Polling cadence of the reader loop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Repeat scans of one tag inside this window are duplicate card reads
    #[serde(default = "default_duplicate_scan_window_secs")]
    pub duplicate_scan_window_secs: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
            duplicate_scan_window_secs: default_duplicate_scan_window_secs(),
        }
    }
}

/// EmailJS service identity
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub reply_to: String,

    /// Sender name shown in the notification template
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Send endpoint; override for testing
    #[serde(default = "default_email_endpoint")]
    pub endpoint: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_duplicate_scan_window_secs() -> u64 {
    3
}

fn default_from_name() -> String {
    "RFID System".to_string()
}

fn default_email_endpoint() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an explicit path, or from the default location
/// (`<config_dir>/tagmark/config.toml`).
///
/// A missing default file yields built-in defaults; an explicitly named file
/// that does not exist, or a malformed file, is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<KioskConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_file(),
    };

    match path {
        Some(p) if p.exists() => {
            let raw = std::fs::read_to_string(&p)?;
            toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {}", p.display(), e)))
        }
        Some(p) if explicit.is_some() => {
            Err(Error::Config(format!("Config file not found: {}", p.display())))
        }
        _ => Ok(KioskConfig::default()),
    }
}

/// Default configuration file path for the platform
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tagmark").join("config.toml"))
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`TAGMARK_ROOT_FOLDER`)
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &KioskConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("TAGMARK_ROOT_FOLDER") {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tagmark"))
        .unwrap_or_else(|| PathBuf::from("./tagmark_data"))
}

/// Database file inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("tagmark.db")
}
