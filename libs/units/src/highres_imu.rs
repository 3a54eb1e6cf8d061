//! # HIGHRES_IMU Unit
//!
//! Receive-direction counterpart of `hil_sensor`: decodes HIGHRES_IMU frames
//! from the autopilot and publishes them on a bus topic.

use crate::unit::{Unit, UnitContext, UnitError, UnitResult};
use bridge_bus::LocalBus;
use bridge_codec::{FrameMapper, Scaling, SensorMapper};
use bridge_types::{Frame, MessageId, SensorSample};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

pub const UNIT_NAME: &str = "highres_imu";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighresImuSettings {
    pub topic: String,
    /// Multiplier applied to decoded pressures (e.g. 100.0 for hPa -> Pa)
    pub pressure_scale: f32,
    pub temperature_scale: f32,
}

impl Default for HighresImuSettings {
    fn default() -> Self {
        Self {
            topic: "imu/highres".to_string(),
            pressure_scale: 1.0,
            temperature_scale: 1.0,
        }
    }
}

struct Wired {
    bus: LocalBus,
    topic: String,
    mapper: SensorMapper,
}

/// Link HIGHRES_IMU -> bus `imu/highres`
#[derive(Default)]
pub struct HighresImuUnit {
    wired: Option<Wired>,
    published: AtomicU64,
}

impl HighresImuUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples published since start
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Unit for HighresImuUnit {
    fn name(&self) -> &str {
        UNIT_NAME
    }

    fn initialize(&mut self, ctx: &UnitContext) -> UnitResult<()> {
        let settings: HighresImuSettings = ctx.settings(UNIT_NAME)?;
        if settings.topic.is_empty() {
            return Err(UnitError::init_failed(UNIT_NAME, "topic must not be empty"));
        }

        let mapper = SensorMapper::highres_imu().with_scaling(Scaling {
            pressure: settings.pressure_scale,
            temperature: settings.temperature_scale,
            ..Scaling::IDENTITY
        });

        info!(unit = UNIT_NAME, topic = %settings.topic, "Publishing inbound IMU frames");
        self.wired = Some(Wired {
            bus: ctx.bus.clone(),
            topic: settings.topic,
            mapper,
        });
        Ok(())
    }

    fn subscriptions(&self) -> Vec<MessageId> {
        vec![MessageId::HIGHRES_IMU]
    }

    fn handle_frame(&self, frame: &Frame) -> UnitResult<()> {
        let wired = self
            .wired
            .as_ref()
            .ok_or_else(|| UnitError::NotInitialized(UNIT_NAME.to_string()))?;

        let sample: SensorSample = wired.mapper.decode(frame)?;
        let receivers = wired.bus.publish(&wired.topic, sample)?;
        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(unit = UNIT_NAME, receivers, "Published IMU sample");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_config::UnitSettings;
    use bridge_types::{BusTime, Vector3};
    use link_router::Router;
    use std::sync::Arc;

    fn context(bus: &LocalBus, settings: UnitSettings) -> UnitContext {
        UnitContext::new(Arc::new(Router::new()), bus.clone()).with_settings(settings)
    }

    fn imu_frame() -> Frame {
        let sample = SensorSample {
            stamp: BusTime::new(3, 0),
            accel: Vector3::new(0.0, 0.0, -9.8),
            abs_pressure: 1000.0,
            ..SensorSample::default()
        };
        SensorMapper::highres_imu().encode(&sample)
    }

    #[tokio::test]
    async fn test_frame_is_published_on_topic() {
        let bus = LocalBus::new();
        let mut sub = bus.subscribe::<SensorSample>("imu/highres", 4).unwrap();

        let mut unit = HighresImuUnit::new();
        unit.initialize(&context(&bus, UnitSettings::default())).unwrap();
        unit.handle_frame(&imu_frame()).unwrap();

        let sample = sub.recv().await.unwrap();
        assert_eq!(sample.stamp, BusTime::new(3, 0));
        assert_eq!(sample.accel.z, -9.8);
        assert_eq!(unit.published(), 1);
    }

    #[tokio::test]
    async fn test_pressure_scaling_from_settings() {
        let bus = LocalBus::new();
        let mut sub = bus.subscribe::<SensorSample>("fcu/imu", 4).unwrap();

        let mut unit = HighresImuUnit::new();
        let settings = UnitSettings::default()
            .with("topic", "fcu/imu")
            .with("pressure_scale", 100.0);
        unit.initialize(&context(&bus, settings)).unwrap();
        unit.handle_frame(&imu_frame()).unwrap();

        assert_eq!(sub.recv().await.unwrap().abs_pressure, 100_000.0);
    }

    #[test]
    fn test_malformed_frame_is_an_error_not_a_publish() {
        let bus = LocalBus::new();
        let mut unit = HighresImuUnit::new();
        unit.initialize(&context(&bus, UnitSettings::default())).unwrap();

        let short = Frame::new(MessageId::HIGHRES_IMU, 0, vec![0u8; 10]);
        let err = unit.handle_frame(&short).unwrap_err();
        assert!(matches!(err, UnitError::Protocol(ref e) if e.is_malformed()));
        assert_eq!(unit.published(), 0);
    }

    #[test]
    fn test_handle_before_initialize() {
        let unit = HighresImuUnit::new();
        assert!(matches!(
            unit.handle_frame(&imu_frame()),
            Err(UnitError::NotInitialized(_))
        ));
    }
}
