//! Bus-side sensor records

use crate::time::BusTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validity bitmask: which fields of a sample hold fresh data
///
/// Bit assignments follow the autopilot protocol. Unknown bits are preserved
/// untouched; the bridge never interprets or clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorFields(pub u32);

impl SensorFields {
    pub const NONE: SensorFields = SensorFields(0);
    pub const XACC: SensorFields = SensorFields(1 << 0);
    pub const YACC: SensorFields = SensorFields(1 << 1);
    pub const ZACC: SensorFields = SensorFields(1 << 2);
    pub const XGYRO: SensorFields = SensorFields(1 << 3);
    pub const YGYRO: SensorFields = SensorFields(1 << 4);
    pub const ZGYRO: SensorFields = SensorFields(1 << 5);
    pub const XMAG: SensorFields = SensorFields(1 << 6);
    pub const YMAG: SensorFields = SensorFields(1 << 7);
    pub const ZMAG: SensorFields = SensorFields(1 << 8);
    pub const ABS_PRESSURE: SensorFields = SensorFields(1 << 9);
    pub const DIFF_PRESSURE: SensorFields = SensorFields(1 << 10);
    pub const PRESSURE_ALT: SensorFields = SensorFields(1 << 11);
    pub const TEMPERATURE: SensorFields = SensorFields(1 << 12);
    /// Full reset of the simulated sensor state on the FCU
    pub const RESET: SensorFields = SensorFields(1 << 31);

    /// Every measurement bit (excludes [`RESET`](Self::RESET))
    pub const ALL: SensorFields = SensorFields(0x1FFF);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: SensorFields) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: SensorFields) -> SensorFields {
        SensorFields(self.0 | other.0)
    }
}

impl std::ops::BitOr for SensorFields {
    type Output = SensorFields;

    fn bitor(self, rhs: SensorFields) -> SensorFields {
        self.union(rhs)
    }
}

impl fmt::Display for SensorFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Three-axis measurement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Combined inertial / magnetic / pressure / temperature sample
///
/// Units are whatever the producer publishes; the bridge passes values through
/// without conversion (m/s², rad/s, gauss, hPa, m, °C by convention).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSample {
    pub stamp: BusTime,
    pub accel: Vector3,
    pub gyro: Vector3,
    pub mag: Vector3,
    pub abs_pressure: f32,
    pub diff_pressure: f32,
    pub pressure_alt: f32,
    pub temperature: f32,
    pub fields_updated: SensorFields,
}
