//! Link endpoint addressing

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where the autopilot link is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LinkEndpoint {
    /// `tcp://host:port` (SITL, telemetry radios behind a TCP bridge)
    Tcp { host: String, port: u16 },
    /// `unix:///path/to/socket`
    Unix { path: PathBuf },
}

impl LinkEndpoint {
    /// Parse an endpoint URL after expanding `${VAR}` / `$VAR` references
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let expanded = shellexpand::env(raw).map_err(|e| ConfigError::EnvExpansion {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        expanded.parse()
    }
}

impl FromStr for LinkEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ConfigError::invalid_endpoint(s, "missing scheme (tcp:// or unix://)"))?;

        match scheme {
            "tcp" => {
                let (host, port) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| ConfigError::invalid_endpoint(s, "expected host:port"))?;
                if host.is_empty() {
                    return Err(ConfigError::invalid_endpoint(s, "empty host"));
                }
                let port = port
                    .parse::<u16>()
                    .map_err(|e| ConfigError::invalid_endpoint(s, format!("bad port: {}", e)))?;
                Ok(LinkEndpoint::Tcp {
                    host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
                    port,
                })
            }
            "unix" => {
                if rest.is_empty() {
                    return Err(ConfigError::invalid_endpoint(s, "empty socket path"));
                }
                Ok(LinkEndpoint::Unix {
                    path: PathBuf::from(rest),
                })
            }
            other => Err(ConfigError::invalid_endpoint(
                s,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }
}

impl TryFrom<String> for LinkEndpoint {
    type Error = ConfigError;

    fn try_from(value: String) -> ConfigResult<Self> {
        LinkEndpoint::parse(&value)
    }
}

impl From<LinkEndpoint> for String {
    fn from(endpoint: LinkEndpoint) -> Self {
        endpoint.to_string()
    }
}

impl fmt::Display for LinkEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEndpoint::Tcp { host, port } if host.contains(':') => {
                write!(f, "tcp://[{}]:{}", host, port)
            }
            LinkEndpoint::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            LinkEndpoint::Unix { path } => write!(f, "unix://{}", path.display()),
        }
    }
}
