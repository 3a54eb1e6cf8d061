//! Protocol-level errors for frame processing
//!
//! Each variant carries enough context to diagnose a bad link from the log
//! line alone: what was expected, what arrived, and the likely cause.

use bridge_types::MessageId;
use thiserror::Error;

/// Frame encoding, decoding and mapping errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Buffer is too small to contain the expected structure
    #[error("Frame too small: need {need} bytes, got {got} (context: {context})")]
    FrameTooSmall {
        need: usize,
        got: usize,
        context: String,
    },

    /// Frame magic validation failed
    #[error("Invalid magic: expected {expected:#010x}, got {actual:#010x} (skipped {skipped} bytes, indicates: {diagnosis})")]
    InvalidMagic {
        expected: u32,
        actual: u32,
        skipped: usize,
        diagnosis: String,
    },

    /// Checksum validation failed - indicates corruption on the link
    #[error("Checksum mismatch for {message_id}: expected {expected:#010x}, calculated {calculated:#010x} (frame: {frame_size} bytes)")]
    ChecksumMismatch {
        message_id: MessageId,
        expected: u32,
        calculated: u32,
        frame_size: usize,
    },

    /// Declared or supplied payload exceeds the protocol limit
    #[error("Payload too large for {message_id}: {size} bytes exceeds limit {limit}")]
    PayloadTooLarge {
        message_id: MessageId,
        size: usize,
        limit: usize,
    },

    /// Frame does not match the layout the mapper expects
    #[error("Malformed frame {message_id}: {reason}")]
    MalformedFrame {
        message_id: MessageId,
        reason: String,
    },
}

impl ProtocolError {
    pub fn frame_too_small(need: usize, got: usize, context: impl Into<String>) -> Self {
        Self::FrameTooSmall {
            need,
            got,
            context: context.into(),
        }
    }

    /// Create InvalidMagic error with a best-guess diagnosis
    pub fn invalid_magic(expected: u32, actual: u32, skipped: usize) -> Self {
        let diagnosis = match actual {
            0x0000_0000 => "uninitialized buffer or line idle",
            0xFFFF_FFFF => "corrupted buffer or floating serial line",
            _ if actual.swap_bytes() == expected => "byte order (endianness) mismatch",
            _ => "stream desynchronised or foreign protocol on the link",
        };

        Self::InvalidMagic {
            expected,
            actual,
            skipped,
            diagnosis: diagnosis.to_string(),
        }
    }

    pub fn checksum_mismatch(
        message_id: MessageId,
        expected: u32,
        calculated: u32,
        frame_size: usize,
    ) -> Self {
        Self::ChecksumMismatch {
            message_id,
            expected,
            calculated,
            frame_size,
        }
    }

    pub fn payload_too_large(message_id: MessageId, size: usize, limit: usize) -> Self {
        Self::PayloadTooLarge {
            message_id,
            size,
            limit,
        }
    }

    /// Frame carries a different identifier than the mapper handles
    pub fn unexpected_message_id(expected: MessageId, got: MessageId) -> Self {
        Self::MalformedFrame {
            message_id: got,
            reason: format!("expected message id {}", expected),
        }
    }

    /// Payload length does not match the declared field layout
    pub fn payload_size_mismatch(message_id: MessageId, expected: usize, got: usize) -> Self {
        Self::MalformedFrame {
            message_id,
            reason: format!("payload is {} bytes, layout requires {}", got, expected),
        }
    }

    /// Structural mismatch against an expected layout
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtocolError::MalformedFrame { .. })
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
