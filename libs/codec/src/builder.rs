//! # Frame Builder
//!
//! Serialises a [`Frame`] into its wire form:
//!
//! ```text
//! ┌──────────────────────┬───────────────────────┐
//! │ FrameHeader (24 B)   │ payload (≤ 255 B)     │
//! └──────────────────────┴───────────────────────┘
//! ```
//!
//! Encoding happens on the caller's task, before any link lock is taken, so
//! the router only holds its writer for the byte copy.

use crate::error::{ProtocolError, ProtocolResult};
use bridge_types::{Frame, FrameHeader, MAX_PAYLOAD_SIZE};
use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::AsBytes;

/// Total wire size of a frame
pub fn encoded_len(frame: &Frame) -> usize {
    FrameHeader::SIZE + frame.payload_len()
}

/// Append the wire form of `frame` to `buf`
pub fn encode_frame_into(frame: &Frame, buf: &mut BytesMut) -> ProtocolResult<()> {
    let payload = frame.payload.as_ref();
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::payload_too_large(
            frame.message_id,
            payload.len(),
            MAX_PAYLOAD_SIZE,
        ));
    }

    let mut header = FrameHeader::new(frame.message_id, frame.timestamp_us, payload.len() as u32);
    header.seal(payload);

    buf.reserve(encoded_len(frame));
    buf.put_slice(header.as_bytes());
    buf.put_slice(payload);
    Ok(())
}

/// Encode `frame` into a freshly allocated buffer
pub fn encode_frame(frame: &Frame) -> ProtocolResult<Bytes> {
    let mut buf = BytesMut::with_capacity(encoded_len(frame));
    encode_frame_into(frame, &mut buf)?;
    Ok(buf.freeze())
}
