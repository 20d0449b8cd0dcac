//! # Client Configuration
//!
//! Where the engine lives and how the SDK talks to it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     OCTANE_GRPC_URL=http://render-box:51022                            │
//! │     OCTANE_REQUEST_TIMEOUT_SECS=60                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/octane-sdk/client.toml (Linux)                           │
//! │     ~/Library/Application Support/com.octane.octane-sdk/client.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://127.0.0.1:51022, callbacks enabled                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [connection]
//! url = "http://127.0.0.1:51022"
//! connect_timeout_ms = 5000
//! request_timeout_secs = 30
//!
//! [callbacks]
//! enabled = true
//! client_name = "lookdev-station"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Port the engine's gRPC server listens on by default.
pub const DEFAULT_PORT: u16 = 51022;

// =============================================================================
// Connection Settings
// =============================================================================

/// How to reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// gRPC endpoint (`http://` or `https://`).
    #[serde(default = "default_url")]
    pub url: String,

    /// Time allowed to establish the channel (milliseconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Deadline applied to every unary call (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    format!("http://127.0.0.1:{}", DEFAULT_PORT)
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            url: default_url(),
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Callback Settings
// =============================================================================

/// Callback stream behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackSettings {
    /// Open the callback stream as part of `connect`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Name the engine logs for this subscriber.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

fn default_true() -> bool {
    true
}

fn default_client_name() -> String {
    format!("octane-client-{}", uuid::Uuid::new_v4())
}

impl Default for CallbackSettings {
    fn default() -> Self {
        CallbackSettings {
            enabled: default_true(),
            client_name: default_client_name(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub callbacks: CallbackSettings,
}

impl ClientConfig {
    /// Default settings pointed at `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.connection.url = url.into();
        config
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.connection.url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidEndpoint(format!(
                "Engine URL must start with http:// or https://, got: {}",
                self.connection.url
            )));
        }
        if url.host_str().is_none() {
            return Err(ClientError::InvalidEndpoint(format!(
                "Engine URL has no host: {}",
                self.connection.url
            )));
        }

        if self.connection.connect_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "connect_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.connection.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.callbacks.client_name.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "callbacks.client_name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OCTANE_GRPC_URL") {
            debug!(url = %url, "Overriding engine URL from environment");
            self.connection.url = url;
        }

        if let Ok(timeout) = std::env::var("OCTANE_CONNECT_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.connection.connect_timeout_ms = ms,
                Err(_) => warn!(value = %timeout, "Ignoring invalid OCTANE_CONNECT_TIMEOUT_MS"),
            }
        }

        if let Ok(timeout) = std::env::var("OCTANE_REQUEST_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.connection.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid OCTANE_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Ok(enabled) = std::env::var("OCTANE_CALLBACKS") {
            self.callbacks.enabled = enabled != "false" && enabled != "0";
        }

        if let Ok(name) = std::env::var("OCTANE_CLIENT_NAME") {
            self.callbacks.client_name = name;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "octane", "octane-sdk")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn url(&self) -> &str {
        &self.connection.url
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connection.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.request_timeout_secs)
    }
}
