//! # Frame Parser
//!
//! Two entry points:
//!
//! - [`decode_frame`] validates a buffer holding exactly one frame.
//! - [`FrameDecoder`] reassembles frames from an arbitrary byte stream (TCP,
//!   serial, Unix socket) where reads may split or merge frames.
//!
//! ## Resynchronisation
//!
//! A link can deliver garbage (line noise, a reconnect in the middle of a
//! frame). The decoder never trusts a header it has not checksummed: on a bad
//! magic it skips to the next candidate magic, and on an oversized length or a
//! checksum mismatch it drops a single byte and rescans. Each skip is reported
//! once as an error so the caller can count it; the stream keeps flowing.

use crate::error::{ProtocolError, ProtocolResult};
use bridge_types::{Frame, FrameHeader, FRAME_MAGIC, MAX_PAYLOAD_SIZE};
use bytes::{Buf, BytesMut};
use tracing::trace;
use zerocopy::FromBytes;

const MAGIC_BYTES: [u8; 4] = FRAME_MAGIC.to_le_bytes();

/// Parse and validate a frame header from the start of `data`
///
/// Checks size, magic and the payload limit. The checksum needs the payload
/// and is verified by [`decode_frame`].
pub fn parse_header(data: &[u8]) -> ProtocolResult<FrameHeader> {
    let header = FrameHeader::read_from_prefix(data).ok_or_else(|| {
        ProtocolError::frame_too_small(FrameHeader::SIZE, data.len(), "FrameHeader parsing")
    })?;

    if header.magic() != FRAME_MAGIC {
        return Err(ProtocolError::invalid_magic(FRAME_MAGIC, header.magic(), 0));
    }

    if header.payload_size() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::payload_too_large(
            header.message_id(),
            header.payload_size(),
            MAX_PAYLOAD_SIZE,
        ));
    }

    Ok(header)
}

/// Decode a buffer that holds exactly one complete frame
pub fn decode_frame(data: &[u8]) -> ProtocolResult<Frame> {
    let header = parse_header(data)?;

    if data.len() != header.frame_size() {
        return Err(ProtocolError::frame_too_small(
            header.frame_size(),
            data.len(),
            "frame length does not match declared payload size",
        ));
    }

    let payload = &data[FrameHeader::SIZE..];
    verify(&header, payload)?;

    Ok(Frame::new(
        header.message_id(),
        header.timestamp_us(),
        payload.to_vec(),
    ))
}

fn verify(header: &FrameHeader, payload: &[u8]) -> ProtocolResult<()> {
    let calculated = header.compute_checksum(payload);
    if calculated != header.checksum() {
        return Err(ProtocolError::checksum_mismatch(
            header.message_id(),
            header.checksum(),
            calculated,
            header.frame_size(),
        ));
    }
    Ok(())
}

/// Incremental stream decoder
///
/// Feed it whatever the link returns with [`extend`](Self::extend), then drain
/// [`next_frame`](Self::next_frame) until it returns `None`.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    max_payload: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_SIZE)
    }

    /// Decoder with a tighter payload limit than the protocol maximum
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4 * 1024),
            max_payload: max_payload.min(MAX_PAYLOAD_SIZE),
        }
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes received but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pull the next frame out of the buffer
    ///
    /// - `None`: need more bytes
    /// - `Some(Ok(frame))`: one complete, checksummed frame
    /// - `Some(Err(e))`: bytes were discarded; call again to continue
    pub fn next_frame(&mut self) -> Option<ProtocolResult<Frame>> {
        if self.buffer.len() < MAGIC_BYTES.len() {
            return None;
        }

        if self.buffer[..MAGIC_BYTES.len()] != MAGIC_BYTES {
            return Some(Err(self.skip_to_magic()));
        }

        if self.buffer.len() < FrameHeader::SIZE {
            return None;
        }

        let header = match FrameHeader::read_from_prefix(&self.buffer[..]) {
            Some(header) => header,
            None => return None,
        };

        if header.payload_size() > self.max_payload {
            self.buffer.advance(1);
            return Some(Err(ProtocolError::payload_too_large(
                header.message_id(),
                header.payload_size(),
                self.max_payload,
            )));
        }

        let frame_size = header.frame_size();
        if self.buffer.len() < frame_size {
            return None;
        }

        if let Err(e) = verify(&header, &self.buffer[FrameHeader::SIZE..frame_size]) {
            self.buffer.advance(1);
            return Some(Err(e));
        }

        let mut frame_bytes = self.buffer.split_to(frame_size);
        let payload = frame_bytes.split_off(FrameHeader::SIZE).freeze();
        trace!(
            message_id = %header.message_id(),
            size = frame_size,
            "Decoded frame"
        );

        Some(Ok(Frame::new(
            header.message_id(),
            header.timestamp_us(),
            payload,
        )))
    }

    /// Drop bytes up to the next candidate magic, keeping a possible partial
    /// magic at the tail
    fn skip_to_magic(&mut self) -> ProtocolError {
        let actual = u32::from_le_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]);

        let skip = self.buffer[1..]
            .windows(MAGIC_BYTES.len())
            .position(|window| window == MAGIC_BYTES)
            .map(|pos| pos + 1)
            .unwrap_or_else(|| self.buffer.len() - (MAGIC_BYTES.len() - 1));

        self.buffer.advance(skip);
        ProtocolError::invalid_magic(FRAME_MAGIC, actual, skip)
    }
}
