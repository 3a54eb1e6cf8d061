//! # FCU Bridge Configuration
//!
//! One TOML file drives the whole process:
//!
//! ```toml
//! [link]
//! endpoint = "tcp://127.0.0.1:5760"   # or unix:///run/fcu.sock, ${VAR} expanded
//! reconnect_interval_ms = 1000
//! max_frame_size = 1024
//!
//! [bus]
//! queue_depth = 10
//!
//! [service]
//! stats_interval_ms = 10000
//!
//! [units]
//! enabled = ["hil_sensor", "highres_imu"]
//!
//! [units.settings.hil_sensor]
//! topic = "imu_ned"
//! min_interval_ms = 25
//! ```
//!
//! Every section and key has a default, so an empty file is a valid
//! configuration that loads `hil_sensor` against a local SITL endpoint.
//! Unit settings stay untyped here; each unit deserialises its own table.

pub mod bridge;
pub mod endpoint;
pub mod error;

pub use bridge::{BridgeConfig, BusConfig, LinkConfig, ServiceSettings, UnitSettings, UnitsConfig};
pub use endpoint::LinkEndpoint;
pub use error::{ConfigError, ConfigResult};
