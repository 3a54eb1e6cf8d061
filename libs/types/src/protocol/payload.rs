//! Fixed payload layouts
//!
//! HIL_SENSOR (107) and HIGHRES_IMU (105) share one 64-byte layout. The order
//! below is the wire contract; reordering a field is a silent data corruption
//! on the remote side, so the layout table and the read/write paths are kept
//! next to each other and checked against each other in tests.

use bytes::{Buf, BufMut};

/// Scalar kinds that appear in payload layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U64,
    U32,
    F32,
}

impl FieldKind {
    pub const fn size(self) -> usize {
        match self {
            FieldKind::U64 => 8,
            FieldKind::U32 | FieldKind::F32 => 4,
        }
    }
}

/// Declared field order of the sensor payload
pub const SENSOR_LAYOUT: [(&str, FieldKind); 15] = [
    ("time_usec", FieldKind::U64),
    ("xacc", FieldKind::F32),
    ("yacc", FieldKind::F32),
    ("zacc", FieldKind::F32),
    ("xgyro", FieldKind::F32),
    ("ygyro", FieldKind::F32),
    ("zgyro", FieldKind::F32),
    ("xmag", FieldKind::F32),
    ("ymag", FieldKind::F32),
    ("zmag", FieldKind::F32),
    ("abs_pressure", FieldKind::F32),
    ("diff_pressure", FieldKind::F32),
    ("pressure_alt", FieldKind::F32),
    ("temperature", FieldKind::F32),
    ("fields_updated", FieldKind::U32),
];

/// Flat sensor payload in protocol field order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorPayload {
    pub time_usec: u64,
    pub xacc: f32,
    pub yacc: f32,
    pub zacc: f32,
    pub xgyro: f32,
    pub ygyro: f32,
    pub zgyro: f32,
    pub xmag: f32,
    pub ymag: f32,
    pub zmag: f32,
    pub abs_pressure: f32,
    pub diff_pressure: f32,
    pub pressure_alt: f32,
    pub temperature: f32,
    pub fields_updated: u32,
}

impl SensorPayload {
    /// Encoded size in bytes
    pub const SIZE: usize = 64;

    /// Append the payload in declared field order (little-endian)
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(self.time_usec);
        for value in self.scalars() {
            buf.put_f32_le(value);
        }
        buf.put_u32_le(self.fields_updated);
    }

    /// Read a payload of exactly [`Self::SIZE`] bytes
    ///
    /// Returns `None` on any other length; callers turn that into their own
    /// error with context.
    pub fn read_from(mut bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }

        let time_usec = bytes.get_u64_le();
        let mut scalars = [0f32; 13];
        for slot in scalars.iter_mut() {
            *slot = bytes.get_f32_le();
        }
        let fields_updated = bytes.get_u32_le();

        let [xacc, yacc, zacc, xgyro, ygyro, zgyro, xmag, ymag, zmag, abs_pressure, diff_pressure, pressure_alt, temperature] =
            scalars;

        Some(Self {
            time_usec,
            xacc,
            yacc,
            zacc,
            xgyro,
            ygyro,
            zgyro,
            xmag,
            ymag,
            zmag,
            abs_pressure,
            diff_pressure,
            pressure_alt,
            temperature,
            fields_updated,
        })
    }

    fn scalars(&self) -> [f32; 13] {
        [
            self.xacc,
            self.yacc,
            self.zacc,
            self.xgyro,
            self.ygyro,
            self.zgyro,
            self.xmag,
            self.ymag,
            self.zmag,
            self.abs_pressure,
            self.diff_pressure,
            self.pressure_alt,
            self.temperature,
        ]
    }
}
