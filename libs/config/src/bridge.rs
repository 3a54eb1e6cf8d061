//! Top-level bridge configuration

use crate::endpoint::LinkEndpoint;
use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Smallest frame the link can carry: a header with an empty payload
pub const MIN_FRAME_SIZE: usize = 24;

/// Main bridge configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub link: LinkConfig,
    pub bus: BusConfig,
    pub service: ServiceSettings,
    pub units: UnitsConfig,
}

/// Autopilot link settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkConfig {
    pub endpoint: LinkEndpoint,
    /// Delay between reconnect attempts after the link drops
    pub reconnect_interval_ms: u64,
    /// Largest frame (header + payload) accepted from the link
    pub max_frame_size: usize,
    /// Longest a single frame write may take before the link is dropped
    pub write_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            endpoint: LinkEndpoint::Tcp {
                host: "127.0.0.1".to_string(),
                port: 5760,
            },
            reconnect_interval_ms: 1000,
            max_frame_size: 1024,
            write_timeout_ms: 1000,
        }
    }
}

impl LinkConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// In-process bus settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Default per-subscription queue depth; overflow drops the oldest message
    pub queue_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { queue_depth: 10 }
    }
}

/// Service-level settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Period of the router statistics log line (0 disables it)
    pub stats_interval_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            stats_interval_ms: 10_000,
        }
    }
}

/// Which units to load, in order, and their settings tables
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnitsConfig {
    pub enabled: Vec<String>,
    pub settings: BTreeMap<String, UnitSettings>,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["hil_sensor".to_string()],
            settings: BTreeMap::new(),
        }
    }
}

impl UnitsConfig {
    /// Settings for `unit`, empty when the file has no table for it
    pub fn settings_for(&self, unit: &str) -> UnitSettings {
        self.settings.get(unit).cloned().unwrap_or_default()
    }
}

/// Raw settings table of one unit
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UnitSettings(toml::Table);

impl UnitSettings {
    pub fn new(table: toml::Table) -> Self {
        Self(table)
    }

    /// Deserialise into the unit's own settings type
    pub fn parse<T: DeserializeOwned>(&self, unit: &str) -> ConfigResult<T> {
        toml::Value::Table(self.0.clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::UnitSettings {
                unit: unit.to_string(),
                reason: e.message().to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }
}

impl BridgeConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), "Loaded bridge configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: BridgeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.units.enabled.is_empty() {
            return Err(ConfigError::Invalid("units.enabled must name at least one unit".into()));
        }

        if self.units.enabled.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid("units.enabled contains an empty name".into()));
        }

        if self.bus.queue_depth == 0 {
            return Err(ConfigError::Invalid("bus.queue_depth must be greater than zero".into()));
        }

        if self.link.max_frame_size < MIN_FRAME_SIZE {
            return Err(ConfigError::Invalid(format!(
                "link.max_frame_size must be at least {} bytes, got {}",
                MIN_FRAME_SIZE, self.link.max_frame_size
            )));
        }

        if self.link.reconnect_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "link.reconnect_interval_ms must be greater than zero".into(),
            ));
        }

        if self.link.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "link.write_timeout_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
