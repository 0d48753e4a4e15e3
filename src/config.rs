//! Configuration management for copilot-relay.
//!
//! Configuration is loaded from `~/.config/copilot-relay/config.toml`.
//! Every value has a default, so the file is optional.

use crate::compose::InfoSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default port the editor extension listens on.
pub const DEFAULT_PORT: u16 = 12345;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listener connection settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Defaults for project task composition.
    #[serde(default)]
    pub project: ProjectDefaults,
}

/// Where and how to reach the listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Listener host (default: localhost).
    #[serde(default = "default_host")]
    pub host: String,
    /// Listener port (default: 12345).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// The message endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/message", self.host, self.port)
    }

    /// The timeout as a duration.
    ///
    /// Values that are not positive or do not fit a `Duration` fall back to the default.
    pub fn timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.timeout_secs) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

/// Defaults applied to project tasks when the CLI leaves them unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDefaults {
    /// Information source preselected in the form and `project` command.
    #[serde(default)]
    pub info_source: InfoSource,
}

/// Command-line overrides layered over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<f64>,
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("copilot-relay"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, using defaults if not found.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.client.host = host;
        }
        if let Some(port) = overrides.port {
            self.client.port = port;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.client.timeout_secs = timeout;
        }
        self
    }
}
