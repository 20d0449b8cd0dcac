//! Mock server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Mock server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the gRPC server binds to
    pub bind_addr: SocketAddr,

    /// Interval between render simulation steps in milliseconds
    pub tick_interval_ms: u64,

    /// Samples added per simulation step
    pub samples_per_tick: u32,

    /// Max samples when the render target has no kernel setting
    pub default_max_samples: u32,

    /// Resolution when the render target has no film settings
    pub default_width: u32,
    pub default_height: u32,

    /// Reported by the info service
    pub version_name: String,
    pub is_demo: bool,

    /// Capacity of the callback event fan-out channel
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 51022)),
            tick_interval_ms: 50,
            samples_per_tick: 16,
            default_max_samples: 256,
            default_width: 640,
            default_height: 360,
            version_name: octane_core::API_VERSION_NAME.to_string(),
            is_demo: false,
            event_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let config = ServerConfig {
            bind_addr: parse_var("OCTANE_MOCK_BIND_ADDR", defaults.bind_addr)?,
            tick_interval_ms: parse_var("OCTANE_MOCK_TICK_MS", defaults.tick_interval_ms)?,
            samples_per_tick: parse_var("OCTANE_MOCK_SAMPLES_PER_TICK", defaults.samples_per_tick)?,
            default_max_samples: parse_var("OCTANE_MOCK_MAX_SAMPLES", defaults.default_max_samples)?,
            default_width: parse_var("OCTANE_MOCK_WIDTH", defaults.default_width)?,
            default_height: parse_var("OCTANE_MOCK_HEIGHT", defaults.default_height)?,
            version_name: env::var("OCTANE_MOCK_VERSION_NAME").unwrap_or(defaults.version_name),
            is_demo: parse_var("OCTANE_MOCK_DEMO", defaults.is_demo)?,
            event_buffer: parse_var("OCTANE_MOCK_EVENT_BUFFER", defaults.event_buffer)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("OCTANE_MOCK_TICK_MS".to_string()));
        }
        if self.samples_per_tick == 0 {
            return Err(ConfigError::InvalidValue(
                "OCTANE_MOCK_SAMPLES_PER_TICK".to_string(),
            ));
        }
        if self.default_width == 0 || self.default_height == 0 {
            return Err(ConfigError::InvalidValue("OCTANE_MOCK_WIDTH/HEIGHT".to_string()));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::InvalidValue("OCTANE_MOCK_EVENT_BUFFER".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
