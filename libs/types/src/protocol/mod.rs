//! Protocol identifiers and limits

pub mod message;
pub mod payload;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Magic number opening every frame on the link ("FCUB" in ASCII)
pub const FRAME_MAGIC: u32 = 0x4643_5542;

/// Largest payload a single frame may carry
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Protocol message-type identifier
///
/// Open set: inbound frames may carry identifiers this process has no layout
/// for. They are still routed by value and simply find no handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u32);

impl MessageId {
    /// IMU readings in NED body frame, sent by the FCU
    pub const HIGHRES_IMU: MessageId = MessageId(105);
    /// Simulated sensor readings injected into the FCU (hardware-in-the-loop)
    pub const HIL_SENSOR: MessageId = MessageId(107);

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Protocol name for known identifiers
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::HIGHRES_IMU => Some("HIGHRES_IMU"),
            Self::HIL_SENSOR => Some("HIL_SENSOR"),
            _ => None,
        }
    }
}

impl From<u32> for MessageId {
    fn from(value: u32) -> Self {
        MessageId(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "#{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_display() {
        assert_eq!(MessageId::HIL_SENSOR.to_string(), "HIL_SENSOR(107)");
        assert_eq!(MessageId(42).to_string(), "#42");
    }
}
