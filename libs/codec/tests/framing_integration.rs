//! Integration tests for link framing
//!
//! End-to-end: bus sample -> mapper -> wire bytes -> stream decoder -> mapper.

use bridge_codec::{
    decode_frame, encode_frame, parse_header, FrameDecoder, FrameMapper, ProtocolError,
    SensorMapper,
};
use bridge_types::{
    BusTime, FrameHeader, MessageId, SensorFields, SensorPayload, SensorSample, Vector3,
    FRAME_MAGIC,
};

fn imu_sample(sec: u32) -> SensorSample {
    SensorSample {
        stamp: BusTime::new(sec, 250_000),
        accel: Vector3::new(0.0, 0.0, -9.81),
        gyro: Vector3::new(0.001, -0.002, 0.0),
        mag: Vector3::new(0.21, 0.0, 0.43),
        abs_pressure: 1001.0,
        diff_pressure: 0.0,
        pressure_alt: 88.0,
        temperature: 24.0,
        fields_updated: SensorFields::ALL,
    }
}

#[test]
fn test_sample_survives_the_wire() {
    let mapper = SensorMapper::hil_sensor();
    let wire = encode_frame(&mapper.encode(&imu_sample(10))).expect("encode");

    let header = parse_header(&wire).expect("header");
    assert_eq!(header.magic(), FRAME_MAGIC);
    assert_eq!(header.message_id(), MessageId::HIL_SENSOR);
    assert_eq!(header.payload_size(), SensorPayload::SIZE);
    assert_eq!(header.timestamp_us(), 10_000_250);

    let frame = decode_frame(&wire).expect("decode");
    assert_eq!(mapper.decode(&frame).expect("map"), imu_sample(10));
}

#[test]
fn test_stream_of_mixed_frames_with_noise() {
    let outbound = SensorMapper::hil_sensor();
    let inbound = SensorMapper::highres_imu();

    let mut stream = Vec::new();
    for sec in 0..5u32 {
        let mapper = if sec % 2 == 0 { &outbound } else { &inbound };
        stream.extend_from_slice(&encode_frame(&mapper.encode(&imu_sample(sec))).unwrap());
        // Line noise between frames
        stream.extend_from_slice(&[0x00, 0xFF, 0x7E]);
    }

    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    let mut dropped = 0;

    // Feed in uneven chunks the way a serial port delivers bytes
    for chunk in stream.chunks(17) {
        decoder.extend(chunk);
        while let Some(result) = decoder.next_frame() {
            match result {
                Ok(frame) => frames.push(frame),
                Err(_) => dropped += 1,
            }
        }
    }

    assert_eq!(frames.len(), 5);
    assert!(dropped >= 1);

    for (sec, frame) in frames.iter().enumerate() {
        let expected = if sec % 2 == 0 {
            MessageId::HIL_SENSOR
        } else {
            MessageId::HIGHRES_IMU
        };
        assert_eq!(frame.message_id, expected);

        let mapper = if sec % 2 == 0 { &outbound } else { &inbound };
        assert_eq!(mapper.decode(frame).unwrap(), imu_sample(sec as u32));
    }
}

#[test]
fn test_header_only_frame_is_not_mistaken_for_payload() {
    let mut header = FrameHeader::new(MessageId::HIGHRES_IMU, 5, 64);
    header.seal(&[0u8; 64]);

    let mut decoder = FrameDecoder::new();
    decoder.extend(zerocopy::AsBytes::as_bytes(&header));
    assert!(decoder.next_frame().is_none());

    decoder.extend(&[0u8; 64]);
    let frame = decoder.next_frame().unwrap().unwrap();
    assert_eq!(frame.payload.len(), 64);
}

#[test]
fn test_truncated_frame_reports_context() {
    let wire = encode_frame(&SensorMapper::hil_sensor().encode(&imu_sample(1))).unwrap();
    let err = decode_frame(&wire[..wire.len() - 4]).unwrap_err();

    match err {
        ProtocolError::FrameTooSmall { need, got, .. } => {
            assert_eq!(need, FrameHeader::SIZE + SensorPayload::SIZE);
            assert_eq!(got, need - 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}
