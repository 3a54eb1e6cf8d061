//! Decoded protocol frames

pub mod header;

use crate::protocol::MessageId;
use bytes::Bytes;

/// One protocol message: routing key, sample time and the flat field payload
///
/// Transient by construction. Units build one per outbound sample and hand it
/// to the router; the router builds one per inbound frame and drops it after
/// dispatch. The payload is reference-counted so fan-out to several handlers
/// does not copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub message_id: MessageId,
    /// Microseconds since the Unix epoch
    pub timestamp_us: u64,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(message_id: MessageId, timestamp_us: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            message_id,
            timestamp_us,
            payload: payload.into(),
        }
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}
