//! # FCU Bridge Types
//!
//! Shared data types for the bus <-> autopilot bridge.
//!
//! ## Layers
//!
//! ```text
//! bus side                      link side
//! ─────────                     ─────────
//! SensorSample  ── mapper ──▶   Frame { FrameHeader, payload }
//! (named fields)                (message id + µs timestamp + flat fields)
//! ```
//!
//! - [`protocol`]: wire-level types. [`FrameHeader`] is the fixed 24-byte
//!   prefix of every frame, [`Frame`] is a decoded frame with its payload, and
//!   [`SensorPayload`] is the declared field layout of HIL_SENSOR/HIGHRES_IMU.
//! - [`sensor`]: strongly-typed bus records with named physical fields.
//! - [`time`]: conversion from bus-native time to protocol microseconds.
//!
//! Payload byte layouts are defined next to the types that own them. Framing,
//! checksum validation and the bus <-> frame field mapping live in
//! `bridge-codec`.

pub mod protocol;
pub mod sensor;
pub mod time;

pub use protocol::message::header::FrameHeader;
pub use protocol::message::Frame;
pub use protocol::payload::{FieldKind, SensorPayload, SENSOR_LAYOUT};
pub use protocol::{MessageId, FRAME_MAGIC, MAX_PAYLOAD_SIZE};
pub use sensor::{SensorFields, SensorSample, Vector3};
pub use time::BusTime;
