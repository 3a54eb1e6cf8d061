//! # Rate Limiter
//!
//! Per unit, per message type minimum-interval gate. Time comes from an
//! injected monotonic [`Clock`] and is the arrival time of the event, never the
//! timestamp carried inside the message.
//!
//! The gate is split into [`RateGate::check`] and [`RateGate::commit`] so the
//! caller can advance it only once the frame has actually reached the link:
//! an event that was allowed but could not be sent does not consume the slot.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Whether an event at `now` may be sent
///
/// `last == None` means nothing was sent yet, which always passes.
pub fn allow(now: Instant, last: Option<Instant>, min_interval: Duration) -> bool {
    match last {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= min_interval,
    }
}

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Process monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for deterministic tests and replays
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Jump to `elapsed` since creation; never moves backwards
    pub fn set(&self, elapsed: Duration) {
        let mut current = self.elapsed.lock();
        *current = (*current).max(elapsed);
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}

/// Minimum-interval gate with accepted/dropped counters
#[derive(Debug, Clone)]
pub struct RateGate {
    min_interval: Duration,
    last: Option<Instant>,
    accepted: u64,
    dropped: u64,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
            accepted: 0,
            dropped: 0,
        }
    }

    /// Would an event at `now` pass? Does not change the gate.
    pub fn check(&self, now: Instant) -> bool {
        allow(now, self.last, self.min_interval)
    }

    /// Record a send at `now`
    pub fn commit(&mut self, now: Instant) {
        self.last = Some(self.last.map_or(now, |last| last.max(now)));
        self.accepted += 1;
    }

    /// Record a throttled event
    pub fn reject(&mut self) {
        self.dropped += 1;
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.last
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Lets through the first occurrence and then every `every`-th one
///
/// Keeps a persistent failure visible in the log without one line per event.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    every: u64,
    count: u64,
}

impl LogThrottle {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            count: 0,
        }
    }

    /// Count one occurrence; true when it should be logged
    pub fn hit(&mut self) -> bool {
        self.count += 1;
        self.count == 1 || self.count % self.every == 0
    }

    /// Occurrences since the last reset
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Start over, e.g. once the failure cleared; returns the previous count
    pub fn reset(&mut self) -> u64 {
        std::mem::take(&mut self.count)
    }
}
