//! Bus-native time and its conversion to protocol microseconds

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MICRO: u64 = 1_000;

/// Header timestamp as carried by bus messages (seconds + nanoseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BusTime {
    pub sec: u32,
    pub nanosec: u32,
}

impl BusTime {
    pub const ZERO: BusTime = BusTime { sec: 0, nanosec: 0 };

    /// Build from seconds and nanoseconds, carrying excess nanoseconds
    pub fn new(sec: u32, nanosec: u32) -> Self {
        let carry = nanosec / NANOS_PER_SEC as u32;
        Self {
            sec: sec.saturating_add(carry),
            nanosec: nanosec % NANOS_PER_SEC as u32,
        }
    }

    /// Build from floating-point seconds, rounded to the nearest nanosecond
    ///
    /// Negative and non-finite inputs clamp to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::ZERO;
        }
        let whole = secs.trunc();
        let nanos = ((secs - whole) * NANOS_PER_SEC as f64).round() as u32;
        Self::new(whole.min(u32::MAX as f64) as u32, nanos)
    }

    pub fn now() -> Self {
        SystemTime::now().into()
    }

    pub fn as_nanos(&self) -> u64 {
        self.sec as u64 * NANOS_PER_SEC + self.nanosec as u64
    }

    /// Protocol timestamp: microseconds since the epoch, sub-microsecond
    /// precision truncated (never rounded up)
    pub fn as_micros(&self) -> u64 {
        self.as_nanos() / NANOS_PER_MICRO
    }

    /// Inverse of [`as_micros`](Self::as_micros) at microsecond resolution
    pub fn from_micros(micros: u64) -> Self {
        let sec = micros / 1_000_000;
        let nanosec = (micros % 1_000_000) * NANOS_PER_MICRO;
        Self {
            sec: sec.min(u32::MAX as u64) as u32,
            nanosec: nanosec as u32,
        }
    }
}

impl From<SystemTime> for BusTime {
    fn from(time: SystemTime) -> Self {
        let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        Self {
            sec: since_epoch.as_secs().min(u32::MAX as u64) as u32,
            nanosec: since_epoch.subsec_nanos(),
        }
    }
}
