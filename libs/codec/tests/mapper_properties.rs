//! Property tests for the sensor field mapper

use bridge_codec::{decode_frame, encode_frame, FrameMapper, SensorMapper};
use bridge_types::{BusTime, SensorFields, SensorSample, Vector3};
use proptest::num::f32::{INFINITE, NEGATIVE, NORMAL, POSITIVE, ZERO};
use proptest::prelude::*;

fn sensor_f32() -> impl Strategy<Value = f32> {
    POSITIVE | NEGATIVE | NORMAL | ZERO | INFINITE
}

fn vector3() -> impl Strategy<Value = Vector3> {
    (sensor_f32(), sensor_f32(), sensor_f32()).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

prop_compose! {
    fn sensor_sample()(
        micros in 0u64..(u32::MAX as u64 * 1_000_000),
        accel in vector3(),
        gyro in vector3(),
        mag in vector3(),
        scalars in proptest::array::uniform4(sensor_f32()),
        bits in any::<u32>(),
    ) -> SensorSample {
        SensorSample {
            stamp: BusTime::from_micros(micros),
            accel,
            gyro,
            mag,
            abs_pressure: scalars[0],
            diff_pressure: scalars[1],
            pressure_alt: scalars[2],
            temperature: scalars[3],
            fields_updated: SensorFields(bits),
        }
    }
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(sample in sensor_sample()) {
        let mapper = SensorMapper::hil_sensor();
        let frame = mapper.encode(&sample);
        prop_assert_eq!(mapper.decode(&frame).unwrap(), sample);
    }

    #[test]
    fn prop_wire_round_trip_preserves_frame(sample in sensor_sample()) {
        let frame = SensorMapper::highres_imu().encode(&sample);
        let wire = encode_frame(&frame).unwrap();
        prop_assert_eq!(decode_frame(&wire).unwrap(), frame);
    }

    #[test]
    fn prop_timestamp_never_rounds_up(sec in 0u32..4_000_000_000, nanosec in 0u32..1_000_000_000) {
        let stamp = BusTime::new(sec, nanosec);
        let sample = SensorSample { stamp, ..SensorSample::default() };
        let frame = SensorMapper::hil_sensor().encode(&sample);

        prop_assert!(frame.timestamp_us * 1_000 <= stamp.as_nanos());
        prop_assert!(stamp.as_nanos() - frame.timestamp_us * 1_000 < 1_000);
    }
}
