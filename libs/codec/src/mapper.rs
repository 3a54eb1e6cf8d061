//! # Field Mapper
//!
//! Bidirectional translation between bus records and protocol frames.
//!
//! A mapper is bound to exactly one [`MessageId`]. Encoding passes numeric
//! values through unchanged, copies the `fields_updated` bitmask verbatim and
//! truncates the bus timestamp to whole microseconds. Decoding is the inverse,
//! with an optional per-unit [`Scaling`] applied to the physical fields.
//!
//! Frames with a different identifier or a payload that does not match the
//! declared layout are rejected; a short payload is never zero-filled.

use crate::error::{ProtocolError, ProtocolResult};
use bridge_types::{BusTime, Frame, MessageId, SensorFields, SensorPayload, SensorSample, Vector3};
use bytes::BytesMut;

/// Translation between one bus record type and one protocol message type
pub trait FrameMapper: Send + Sync {
    type Record;

    fn message_id(&self) -> MessageId;

    fn encode(&self, record: &Self::Record) -> Frame;

    fn decode(&self, frame: &Frame) -> ProtocolResult<Self::Record>;
}

/// Per-quantity multipliers applied on decode
///
/// Identity by default. Units whose remote side reports in different units
/// (e.g. mbar vs hPa) configure a factor instead of post-processing samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub accel: f32,
    pub gyro: f32,
    pub mag: f32,
    pub pressure: f32,
    pub altitude: f32,
    pub temperature: f32,
}

impl Default for Scaling {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Scaling {
    pub const IDENTITY: Scaling = Scaling {
        accel: 1.0,
        gyro: 1.0,
        mag: 1.0,
        pressure: 1.0,
        altitude: 1.0,
        temperature: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn vector(v: Vector3, factor: f32) -> Vector3 {
        Vector3::new(v.x * factor, v.y * factor, v.z * factor)
    }
}

/// Mapper for the shared 64-byte sensor layout (HIL_SENSOR, HIGHRES_IMU)
#[derive(Debug, Clone, Copy)]
pub struct SensorMapper {
    message_id: MessageId,
    scaling: Scaling,
}

impl SensorMapper {
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            scaling: Scaling::IDENTITY,
        }
    }

    /// Outbound simulated sensor injection
    pub fn hil_sensor() -> Self {
        Self::new(MessageId::HIL_SENSOR)
    }

    /// Inbound IMU readings from the FCU
    pub fn highres_imu() -> Self {
        Self::new(MessageId::HIGHRES_IMU)
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn scaling(&self) -> &Scaling {
        &self.scaling
    }

    fn to_payload(sample: &SensorSample, time_usec: u64) -> SensorPayload {
        SensorPayload {
            time_usec,
            xacc: sample.accel.x,
            yacc: sample.accel.y,
            zacc: sample.accel.z,
            xgyro: sample.gyro.x,
            ygyro: sample.gyro.y,
            zgyro: sample.gyro.z,
            xmag: sample.mag.x,
            ymag: sample.mag.y,
            zmag: sample.mag.z,
            abs_pressure: sample.abs_pressure,
            diff_pressure: sample.diff_pressure,
            pressure_alt: sample.pressure_alt,
            temperature: sample.temperature,
            fields_updated: sample.fields_updated.bits(),
        }
    }

    fn from_payload(&self, payload: &SensorPayload) -> SensorSample {
        let s = &self.scaling;
        SensorSample {
            stamp: BusTime::from_micros(payload.time_usec),
            accel: Scaling::vector(Vector3::new(payload.xacc, payload.yacc, payload.zacc), s.accel),
            gyro: Scaling::vector(Vector3::new(payload.xgyro, payload.ygyro, payload.zgyro), s.gyro),
            mag: Scaling::vector(Vector3::new(payload.xmag, payload.ymag, payload.zmag), s.mag),
            abs_pressure: payload.abs_pressure * s.pressure,
            diff_pressure: payload.diff_pressure * s.pressure,
            pressure_alt: payload.pressure_alt * s.altitude,
            temperature: payload.temperature * s.temperature,
            fields_updated: SensorFields(payload.fields_updated),
        }
    }
}

impl FrameMapper for SensorMapper {
    type Record = SensorSample;

    fn message_id(&self) -> MessageId {
        self.message_id
    }

    fn encode(&self, sample: &SensorSample) -> Frame {
        let time_usec = sample.stamp.as_micros();
        let mut buf = BytesMut::with_capacity(SensorPayload::SIZE);
        Self::to_payload(sample, time_usec).write_to(&mut buf);
        Frame::new(self.message_id, time_usec, buf.freeze())
    }

    fn decode(&self, frame: &Frame) -> ProtocolResult<SensorSample> {
        if frame.message_id != self.message_id {
            return Err(ProtocolError::unexpected_message_id(
                self.message_id,
                frame.message_id,
            ));
        }

        let payload = SensorPayload::read_from(&frame.payload).ok_or_else(|| {
            ProtocolError::payload_size_mismatch(
                frame.message_id,
                SensorPayload::SIZE,
                frame.payload_len(),
            )
        })?;

        Ok(self.from_payload(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SensorSample {
        SensorSample {
            stamp: BusTime::new(1, 500_000_000),
            accel: Vector3::new(0.1, 0.2, -9.81),
            gyro: Vector3::new(0.01, 0.02, 0.03),
            mag: Vector3::new(0.2, 0.0, 0.4),
            abs_pressure: 1013.25,
            diff_pressure: 0.5,
            pressure_alt: 120.0,
            temperature: 21.5,
            fields_updated: SensorFields::ALL,
        }
    }

    #[test]
    fn test_encode_sets_id_timestamp_and_layout() {
        let frame = SensorMapper::hil_sensor().encode(&sample());

        assert_eq!(frame.message_id, MessageId::HIL_SENSOR);
        assert_eq!(frame.timestamp_us, 1_500_000);
        assert_eq!(frame.payload_len(), SensorPayload::SIZE);

        let payload = SensorPayload::read_from(&frame.payload).unwrap();
        assert_eq!(payload.time_usec, 1_500_000);
        assert_eq!(payload.zacc, -9.81);
        assert_eq!(payload.abs_pressure, 1013.25);
        assert_eq!(payload.fields_updated, 0x1FFF);
    }

    #[test]
    fn test_timestamp_is_truncated_not_rounded() {
        let mut s = sample();
        s.stamp = BusTime::from_secs_f64(1.0000009);
        let frame = SensorMapper::hil_sensor().encode(&s);
        assert_eq!(frame.timestamp_us, 1_000_000);
    }

    #[test]
    fn test_bitmask_passes_through_verbatim() {
        let mut s = sample();
        s.fields_updated = SensorFields::XACC | SensorFields::TEMPERATURE | SensorFields::RESET;
        let mapper = SensorMapper::hil_sensor();
        let decoded = mapper.decode(&mapper.encode(&s)).unwrap();
        assert_eq!(decoded.fields_updated.bits(), (1 << 0) | (1 << 12) | (1 << 31));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let mapper = SensorMapper::highres_imu();
        assert_eq!(mapper.decode(&mapper.encode(&sample())).unwrap(), sample());
    }

    #[test]
    fn test_decode_rejects_other_message_id() {
        let frame = SensorMapper::hil_sensor().encode(&sample());
        let err = SensorMapper::highres_imu().decode(&frame).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        let frame = Frame::new(MessageId::HIGHRES_IMU, 0, vec![0u8; 60]);
        let err = SensorMapper::highres_imu().decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame { .. }));
        assert!(err.to_string().contains("60 bytes"));
    }

    #[test]
    fn test_scaling_applies_on_decode_only() {
        let scaled = SensorMapper::highres_imu().with_scaling(Scaling {
            pressure: 0.1,
            ..Scaling::IDENTITY
        });
        assert!(!scaled.scaling().is_identity());

        let frame = scaled.encode(&sample());
        let payload = SensorPayload::read_from(&frame.payload).unwrap();
        assert_eq!(payload.abs_pressure, 1013.25);

        let decoded = scaled.decode(&frame).unwrap();
        assert_eq!(decoded.abs_pressure, 1013.25 * 0.1);
        assert_eq!(decoded.accel, sample().accel);
    }
}
