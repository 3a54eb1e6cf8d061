//! Router counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated on the send and receive paths
#[derive(Debug, Default)]
pub struct RouterStats {
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
    send_failures: AtomicU64,
    frames_received: AtomicU64,
    malformed_frames: AtomicU64,
    unhandled_frames: AtomicU64,
    handler_failures: AtomicU64,
    links_attached: AtomicU64,
}

/// Point-in-time copy of [`RouterStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
    pub frames_received: u64,
    pub malformed_frames: u64,
    pub unhandled_frames: u64,
    pub handler_failures: u64,
    pub links_attached: u64,
}

impl RouterStats {
    pub(crate) fn record_sent(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unhandled(&self) {
        self.unhandled_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failures(&self, count: usize) {
        self.handler_failures.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_attach(&self) {
        self.links_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            unhandled_frames: self.unhandled_frames.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            links_attached: self.links_attached.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for RouterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.snapshot().fmt(f)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent={} ({} bytes) send_failures={} received={} malformed={} unhandled={} handler_failures={} links={}",
            self.frames_sent,
            self.bytes_sent,
            self.send_failures,
            self.frames_received,
            self.malformed_frames,
            self.unhandled_frames,
            self.handler_failures,
            self.links_attached
        )
    }
}
