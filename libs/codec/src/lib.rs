//! # FCU Bridge Codec
//!
//! The "rules" layer between the typed bus records and the bytes on the link:
//!
//! ```text
//! bridge-types → [codec] → link-router
//!      ↑            ↓           ↓
//!  Pure shapes   Mapping     Link I/O
//!  SensorSample  Framing     Sockets
//!  FrameHeader   Checksums
//! ```
//!
//! - [`mapper`]: [`SensorMapper`] converts [`SensorSample`] records to and from
//!   [`Frame`]s. Values pass through unchanged on encode; the bitmask is copied
//!   verbatim; the bus timestamp is truncated to whole microseconds.
//! - [`builder`]: serialises a [`Frame`] into header + payload with checksum.
//! - [`parser`]: validates complete frames and reassembles frames from a byte
//!   stream ([`FrameDecoder`]), resynchronising on the magic after garbage.
//!
//! ## What This Crate Does NOT Contain
//! - Socket management or connection handling (belongs in `link-router`)
//! - Rate limiting or unit lifecycle (belongs in `bridge-units`)
//!
//! [`SensorSample`]: bridge_types::SensorSample
//! [`Frame`]: bridge_types::Frame

pub mod builder;
pub mod error;
pub mod mapper;
pub mod parser;

pub use builder::{encode_frame, encode_frame_into, encoded_len};
pub use error::{ProtocolError, ProtocolResult};
pub use mapper::{FrameMapper, Scaling, SensorMapper};
pub use parser::{decode_frame, parse_header, FrameDecoder};
