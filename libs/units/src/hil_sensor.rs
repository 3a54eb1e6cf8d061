//! # HIL Sensor Unit
//!
//! Send-only. Forwards `SensorSample`s from a bus topic to the autopilot as
//! HIL_SENSOR frames, at most once per `min_interval_ms` of arrival time.

use crate::rate::{Clock, LogThrottle, RateGate};
use crate::unit::{Unit, UnitContext, UnitError, UnitResult};
use bridge_bus::Subscription;
use bridge_codec::{FrameMapper, SensorMapper};
use bridge_types::SensorSample;
use link_router::{Router, RouterError};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

pub const UNIT_NAME: &str = "hil_sensor";

/// Warn on the first link failure, then on every Nth consecutive one
const LINK_WARN_EVERY: u64 = 40;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HilSensorSettings {
    pub topic: String,
    pub min_interval_ms: u64,
    /// Overrides `bus.queue_depth`
    pub queue_depth: Option<usize>,
}

impl Default for HilSensorSettings {
    fn default() -> Self {
        Self {
            topic: "imu_ned".to_string(),
            min_interval_ms: 25,
            queue_depth: None,
        }
    }
}

/// What happened to one bus event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    Sent,
    Throttled,
    LinkUnavailable,
    Rejected,
}

/// Per-event path: rate gate, field mapping, router send
///
/// Owned by the unit's subscription task, so it is never run concurrently
/// with itself.
pub struct HilSensorForwarder {
    router: Arc<Router>,
    clock: Arc<dyn Clock>,
    mapper: SensorMapper,
    gate: RateGate,
    link_failures: LogThrottle,
}

impl HilSensorForwarder {
    pub fn new(router: Arc<Router>, clock: Arc<dyn Clock>, min_interval: Duration) -> Self {
        Self {
            router,
            clock,
            mapper: SensorMapper::hil_sensor(),
            gate: RateGate::new(min_interval),
            link_failures: LogThrottle::new(LINK_WARN_EVERY),
        }
    }

    pub async fn forward(&mut self, sample: &SensorSample) -> Forwarded {
        let now = self.clock.now();
        if !self.gate.check(now) {
            self.gate.reject();
            trace!(unit = UNIT_NAME, "Throttled sample");
            return Forwarded::Throttled;
        }

        let frame = self.mapper.encode(sample);
        match self.router.send(&frame).await {
            Ok(()) => {
                self.gate.commit(now);
                let failed = self.link_failures.reset();
                if failed > 0 {
                    info!(unit = UNIT_NAME, failed, "Link available again");
                }
                Forwarded::Sent
            }
            Err(RouterError::LinkUnavailable { reason }) => {
                if self.link_failures.hit() {
                    warn!(
                        unit = UNIT_NAME,
                        reason = %reason,
                        failures = self.link_failures.count(),
                        "Link unavailable, dropping sample"
                    );
                }
                Forwarded::LinkUnavailable
            }
            Err(e) => {
                warn!(unit = UNIT_NAME, error = %e, "Failed to send sample");
                Forwarded::Rejected
            }
        }
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }
}

/// Bus `imu_ned` -> link HIL_SENSOR
#[derive(Default)]
pub struct HilSensorUnit {
    settings: HilSensorSettings,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HilSensorUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &HilSensorSettings {
        &self.settings
    }

    async fn run(mut subscription: Subscription<SensorSample>, mut forwarder: HilSensorForwarder) {
        while let Some(sample) = subscription.recv().await {
            forwarder.forward(&sample).await;
        }
        debug!(
            unit = UNIT_NAME,
            sent = forwarder.gate().accepted(),
            throttled = forwarder.gate().dropped(),
            "Subscription closed"
        );
    }
}

impl Unit for HilSensorUnit {
    fn name(&self) -> &str {
        UNIT_NAME
    }

    fn initialize(&mut self, ctx: &UnitContext) -> UnitResult<()> {
        let settings: HilSensorSettings = ctx.settings(UNIT_NAME)?;
        if settings.topic.is_empty() {
            return Err(UnitError::init_failed(UNIT_NAME, "topic must not be empty"));
        }
        let depth = settings.queue_depth.unwrap_or(ctx.queue_depth);

        let subscription = ctx.bus.subscribe::<SensorSample>(&settings.topic, depth)?;
        let depth = match ctx.bus.topic_depth(&settings.topic) {
            Some(actual) if actual != depth => {
                warn!(
                    unit = UNIT_NAME,
                    topic = %settings.topic,
                    requested = depth,
                    actual,
                    "Topic already exists with a different queue depth, keeping it"
                );
                actual
            }
            _ => depth,
        };
        let forwarder = HilSensorForwarder::new(
            Arc::clone(&ctx.router),
            Arc::clone(&ctx.clock),
            Duration::from_millis(settings.min_interval_ms),
        );

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| UnitError::init_failed(UNIT_NAME, e.to_string()))?;
        *self.task.lock() = Some(handle.spawn(Self::run(subscription, forwarder)));

        info!(
            unit = UNIT_NAME,
            topic = %settings.topic,
            min_interval_ms = settings.min_interval_ms,
            depth,
            "Forwarding sensor samples"
        );
        self.settings = settings;
        Ok(())
    }

    fn shutdown(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::ManualClock;
    use bridge_bus::LocalBus;
    use bridge_codec::decode_frame;
    use bridge_config::UnitSettings;
    use bridge_types::{BusTime, FrameHeader, MessageId, SensorPayload};
    use link_router::Link;
    use tokio::io::{duplex, AsyncReadExt};

    const FRAME_LEN: usize = FrameHeader::SIZE + SensorPayload::SIZE;

    fn sample(us: u64) -> SensorSample {
        SensorSample {
            stamp: BusTime::from_micros(us),
            ..SensorSample::default()
        }
    }

    #[tokio::test]
    async fn test_arrivals_0_10_26_40_51_ms_send_three_frames() {
        let router = Arc::new(Router::new());
        let (local, mut remote) = duplex(4096);
        let _reader = router.attach(Link::new("test", local)).await;

        let clock = Arc::new(ManualClock::new());
        let mut forwarder =
            HilSensorForwarder::new(Arc::clone(&router), clock.clone(), Duration::from_millis(25));

        let mut outcomes = Vec::new();
        for ms in [0u64, 10, 26, 40, 51] {
            clock.set(Duration::from_millis(ms));
            outcomes.push(forwarder.forward(&sample(ms * 1000)).await);
        }
        use Forwarded::*;
        assert_eq!(outcomes, vec![Sent, Throttled, Sent, Throttled, Sent]);

        let mut stamps = Vec::new();

        let mut wire = vec![0u8; FRAME_LEN * 3];
        remote.read_exact(&mut wire).await.unwrap();
        for chunk in wire.chunks(FRAME_LEN) {
            let frame = decode_frame(chunk).unwrap();
            assert_eq!(frame.message_id, MessageId::HIL_SENSOR);
            stamps.push(frame.timestamp_us);
        }
        assert_eq!(stamps, vec![0, 26_000, 51_000]);
    }

    #[tokio::test]
    async fn test_burst_inside_interval_is_throttled() {
        let router = Arc::new(Router::new());
        let (local, _remote) = duplex(4096);
        let _reader = router.attach(Link::new("test", local)).await;

        let clock = Arc::new(ManualClock::new());
        let mut forwarder =
            HilSensorForwarder::new(Arc::clone(&router), clock.clone(), Duration::from_millis(25));

        let mut outcomes = Vec::new();
        for ms in [0u64, 5, 10, 24, 25, 30] {
            clock.set(Duration::from_millis(ms));
            outcomes.push(forwarder.forward(&sample(ms)).await);
        }

        use Forwarded::*;
        assert_eq!(outcomes, vec![Sent, Throttled, Throttled, Throttled, Sent, Throttled]);
        assert_eq!(forwarder.gate().dropped(), 4);
    }

    #[tokio::test]
    async fn test_unsent_event_does_not_advance_gate() {
        let router = Arc::new(Router::new());
        let clock = Arc::new(ManualClock::new());
        let mut forwarder =
            HilSensorForwarder::new(Arc::clone(&router), clock.clone(), Duration::from_millis(25));

        assert_eq!(forwarder.forward(&sample(0)).await, Forwarded::LinkUnavailable);
        assert_eq!(forwarder.gate().last_sent(), None);

        let (local, _remote) = duplex(4096);
        let _reader = router.attach(Link::new("test", local)).await;

        clock.advance(Duration::from_millis(1));
        assert_eq!(forwarder.forward(&sample(1)).await, Forwarded::Sent);
    }

    #[tokio::test]
    async fn test_initialize_reads_settings_and_subscribes() {
        let bus = LocalBus::new();
        let router = Arc::new(Router::new());
        let ctx = UnitContext::new(router, bus.clone()).with_settings(
            UnitSettings::default()
                .with("topic", "sim/imu")
                .with("min_interval_ms", 10i64)
                .with("queue_depth", 4i64),
        );

        let mut unit = HilSensorUnit::new();
        unit.initialize(&ctx).unwrap();

        assert_eq!(unit.settings().min_interval_ms, 10);
        assert_eq!(bus.subscriber_count("sim/imu"), 1);
        assert_eq!(bus.topic_depth("sim/imu"), Some(4));
        assert!(unit.subscriptions().is_empty());

        unit.shutdown();
    }

    #[test_log::test(tokio::test)]
    async fn test_existing_topic_depth_wins_over_setting() {
        let bus = LocalBus::with_queue_depth(3);
        bus.publish("imu_ned", SensorSample::default()).unwrap();

        let ctx = UnitContext::new(Arc::new(Router::new()), bus.clone())
            .with_settings(UnitSettings::default().with("queue_depth", 16i64));
        let mut unit = HilSensorUnit::new();
        unit.initialize(&ctx).unwrap();

        assert_eq!(unit.settings().queue_depth, Some(16));
        assert_eq!(bus.topic_depth("imu_ned"), Some(3));
        assert_eq!(bus.subscriber_count("imu_ned"), 1);

        unit.shutdown();
    }

    #[tokio::test]
    async fn test_initialize_rejects_unknown_setting() {
        let ctx = UnitContext::new(Arc::new(Router::new()), LocalBus::new())
            .with_settings(UnitSettings::default().with("rate_hz", 40i64));

        let err = HilSensorUnit::new().initialize(&ctx).unwrap_err();
        assert!(matches!(err, UnitError::Settings(_)));
    }
}
