//! Frame Header Implementation
//!
//! The header is identical for all frames and carries the routing key, the
//! sample timestamp and the integrity check.

use crate::protocol::{MessageId, FRAME_MAGIC};
use zerocopy::byteorder::{LittleEndian, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Frame Header (24 bytes, little-endian on the wire)
///
/// ```text
/// ┌────────┬────────────┬──────────────┬──────────────┬──────────┬─────────────┐
/// │ magic  │ message_id │ timestamp_us │ payload_size │ checksum │ payload ... │
/// │ 0..4   │ 4..8       │ 8..16        │ 16..20       │ 20..24   │ 24..        │
/// └────────┴────────────┴──────────────┴──────────────┴──────────┴─────────────┘
/// ```
///
/// Byte-order wrappers have alignment 1, so the struct has no padding and can
/// be read from any offset of a receive buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
pub struct FrameHeader {
    pub magic: U32<LittleEndian>,
    pub message_id: U32<LittleEndian>,
    /// Microseconds since the Unix epoch
    pub timestamp_us: U64<LittleEndian>,
    pub payload_size: U32<LittleEndian>,
    /// CRC32 over header (excluding this field) and payload
    pub checksum: U32<LittleEndian>,
}

impl FrameHeader {
    /// Header size in bytes
    pub const SIZE: usize = 24;

    const CHECKSUM_OFFSET: usize = 20;

    pub fn new(message_id: MessageId, timestamp_us: u64, payload_size: u32) -> Self {
        Self {
            magic: U32::new(FRAME_MAGIC),
            message_id: U32::new(message_id.value()),
            timestamp_us: U64::new(timestamp_us),
            payload_size: U32::new(payload_size),
            checksum: U32::new(0),
        }
    }

    pub fn magic(&self) -> u32 {
        self.magic.get()
    }

    pub fn message_id(&self) -> MessageId {
        MessageId(self.message_id.get())
    }

    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us.get()
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size.get() as usize
    }

    pub fn checksum(&self) -> u32 {
        self.checksum.get()
    }

    /// Size of header plus declared payload
    pub fn frame_size(&self) -> usize {
        Self::SIZE + self.payload_size()
    }

    /// Calculate and set the checksum for the given payload
    pub fn seal(&mut self, payload: &[u8]) {
        self.checksum = U32::new(self.compute_checksum(payload));
    }

    /// Verify the stored checksum against the given payload
    pub fn verify_checksum(&self, payload: &[u8]) -> bool {
        self.compute_checksum(payload) == self.checksum()
    }

    /// CRC32 over the header bytes before the checksum field, then the payload
    pub fn compute_checksum(&self, payload: &[u8]) -> u32 {
        let bytes = self.as_bytes();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&bytes[..Self::CHECKSUM_OFFSET]);
        hasher.update(payload);
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_exactly_24_bytes() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
        assert_eq!(std::mem::align_of::<FrameHeader>(), 1);
    }

    #[test]
    fn test_header_field_offsets_are_little_endian() {
        let header = FrameHeader::new(MessageId::HIL_SENSOR, 0x0102_0304_0506_0708, 64);
        let bytes = header.as_bytes();

        assert_eq!(&bytes[0..4], &FRAME_MAGIC.to_le_bytes());
        assert_eq!(&bytes[4..8], &107u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(&bytes[16..20], &64u32.to_le_bytes());
    }

    #[test]
    fn test_checksum_detects_payload_corruption() {
        let payload = [1u8, 2, 3, 4];
        let mut header = FrameHeader::new(MessageId(9), 10, payload.len() as u32);
        header.seal(&payload);

        assert!(header.verify_checksum(&payload));
        assert!(!header.verify_checksum(&[1, 2, 3, 5]));
    }

    #[test]
    fn test_checksum_covers_header_fields() {
        let payload = [0u8; 4];
        let mut header = FrameHeader::new(MessageId(9), 10, 4);
        header.seal(&payload);

        let mut tampered = header;
        tampered.timestamp_us = U64::new(11);
        assert!(!tampered.verify_checksum(&payload));
    }
}
