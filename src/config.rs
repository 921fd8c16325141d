//! Client configuration module
//!
//! Handles loading and parsing of client configuration from files and environment variables.

use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/client.toml";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Path to the configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Login type marker sent in the login request
    #[serde(default = "default_login_type")]
    pub login_type: u8,

    /// Local address reported to the login server
    #[serde(default = "default_local_address")]
    pub local_address: String,

    /// Log packets without a handler at info level
    #[serde(default = "default_true")]
    pub log_unhandled_packets: bool,

    /// Include the payload hex dump when a packet fails to decode
    #[serde(default = "default_true")]
    pub dump_failed_payloads: bool,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_login_type() -> u8 {
    12 // normal login
}

fn default_local_address() -> String {
    "127.0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            login_type: default_login_type(),
            local_address: default_local_address(),
            log_unhandled_packets: default_true(),
            dump_failed_payloads: default_true(),
            debug: false,
            json_logs: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the file named by `AURORA_CONFIG` and
    /// environment variables
    pub async fn load() -> Result<Self> {
        let config_path = env::var("AURORA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::load_from(&config_path).await
    }

    /// Load configuration from a specific file and environment variables
    pub async fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(config_path)
                .await
                .with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

            Self::from_toml(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.config_path = config_path.to_path_buf();

        // Override with environment variables
        config.apply_env_overrides();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("AURORA_LOGIN_TYPE") {
            if let Ok(login_type) = val.parse() {
                self.login_type = login_type;
            }
        }
        if let Ok(val) = env::var("AURORA_LOCAL_ADDRESS") {
            self.local_address = val;
        }
        if let Ok(val) = env::var("AURORA_LOG_UNHANDLED") {
            self.log_unhandled_packets = parse_flag(&val);
        }
        if let Ok(val) = env::var("AURORA_DUMP_PAYLOADS") {
            self.dump_failed_payloads = parse_flag(&val);
        }
        if let Ok(val) = env::var("AURORA_DEBUG") {
            self.debug = parse_flag(&val);
        }
        if let Ok(val) = env::var("AURORA_JSON_LOGS") {
            self.json_logs = parse_flag(&val);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.local_address.parse::<IpAddr>().is_err() {
            anyhow::bail!(
                "Local address must be an IP address, got '{}'",
                self.local_address
            );
        }

        // Login request strings carry a 16-bit length prefix
        if self.local_address.len() > u16::MAX as usize {
            anyhow::bail!("Local address is too long");
        }

        Ok(())
    }
}
