//! Subscription side of the bus

use tokio::sync::broadcast;
use tracing::debug;

/// Receiving end of one topic
///
/// Dropping it unsubscribes.
pub struct Subscription<T> {
    topic: String,
    receiver: broadcast::Receiver<T>,
    depth: usize,
    dropped: u64,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(topic: String, receiver: broadcast::Receiver<T>, depth: usize) -> Self {
        Self {
            topic,
            receiver,
            depth: depth.max(1),
            dropped: 0,
        }
    }

    /// Receive the next message
    ///
    /// Returns `None` once every publisher handle and the bus are gone.
    /// Messages overwritten while this subscriber lagged, or queued beyond
    /// the topic depth, are skipped and counted in [`dropped`](Self::dropped).
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => {
                    if self.within_depth() {
                        return Some(message);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.dropped += count;
                    debug!(topic = %self.topic, lagged = count, "Subscriber lagged, oldest messages dropped");
                }
            }
        }
    }

    /// Non-blocking receive; `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => {
                    if self.within_depth() {
                        return Some(message);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => self.dropped += count,
                Err(_) => return None,
            }
        }
    }

    /// Whether the message just received is among the newest `depth`
    ///
    /// The broadcast ring can hold more than `depth` messages; anything older
    /// than the newest `depth` is counted as dropped.
    fn within_depth(&mut self) -> bool {
        if self.receiver.len() < self.depth {
            return true;
        }
        self.dropped += 1;
        false
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Messages lost to overflow so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("dropped", &self.dropped)
            .finish()
    }
}
