//! # Local Bus
//!
//! In-process publish/subscribe on named, typed topics. Stands in for the
//! robotics middleware so units can be driven and observed without it.
//!
//! ## Semantics
//!
//! - A topic is created by its first publisher or subscriber and is bound to
//!   one Rust type for the life of the bus. Using it with another type is a
//!   [`BusError::TypeMismatch`].
//! - Each topic is a bounded `tokio::sync::broadcast` channel. A subscriber
//!   that falls behind loses the oldest messages, never the newest. The
//!   channel rounds its capacity up to a power of two, so each
//!   [`Subscription`] trims its backlog to the exact topic depth on receive.
//! - Queue depth is fixed by whoever creates the topic.
//! - Publishing to a topic without subscribers is not an error.

mod error;
mod subscription;

pub use error::{BusError, BusResult};
pub use subscription::Subscription;

use dashmap::DashMap;
use std::any::{type_name, Any};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Depth used when a topic is created by `publish`
pub const DEFAULT_QUEUE_DEPTH: usize = 10;

struct Topic {
    type_name: &'static str,
    sender: Box<dyn Any + Send + Sync>,
    receiver_count: Box<dyn Fn() -> usize + Send + Sync>,
    depth: usize,
}

/// Handle to the bus; clones share the same topics
#[derive(Clone)]
pub struct LocalBus {
    topics: Arc<DashMap<String, Topic>>,
    default_depth: usize,
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBus")
            .field("topics", &self.topics.len())
            .field("default_depth", &self.default_depth)
            .finish()
    }
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_queue_depth(DEFAULT_QUEUE_DEPTH)
    }

    pub fn with_queue_depth(depth: usize) -> Self {
        Self {
            topics: Arc::new(DashMap::new()),
            default_depth: depth.max(1),
        }
    }

    /// Subscribe to `topic`, creating it with `depth` if it does not exist
    pub fn subscribe<T>(&self, topic: &str, depth: usize) -> BusResult<Subscription<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let (sender, depth) = self.sender::<T>(topic, depth)?;
        debug!(topic, depth, "Subscribed");
        Ok(Subscription::new(topic.to_string(), sender.subscribe(), depth))
    }

    /// Publish `message` on `topic`
    ///
    /// Returns the number of subscribers that will see it.
    pub fn publish<T>(&self, topic: &str, message: T) -> BusResult<usize>
    where
        T: Clone + Send + Sync + 'static,
    {
        let (sender, _) = self.sender::<T>(topic, self.default_depth)?;
        // Err only means nobody is listening
        Ok(sender.send(message).unwrap_or(0))
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|entry| (entry.receiver_count)())
            .unwrap_or(0)
    }

    /// Queue depth the topic was created with
    pub fn topic_depth(&self, topic: &str) -> Option<usize> {
        self.topics.get(topic).map(|entry| entry.depth)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Sender for `topic` and the depth the topic was created with
    fn sender<T>(&self, topic: &str, depth: usize) -> BusResult<(broadcast::Sender<T>, usize)>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.topics.entry(topic.to_string()).or_insert_with(|| {
            let depth = depth.max(1);
            let (sender, _) = broadcast::channel::<T>(depth);
            debug!(topic, depth, message_type = type_name::<T>(), "Created topic");
            let counted = sender.clone();
            Topic {
                type_name: type_name::<T>(),
                sender: Box::new(sender),
                receiver_count: Box::new(move || counted.receiver_count()),
                depth,
            }
        });

        entry
            .sender
            .downcast_ref::<broadcast::Sender<T>>()
            .cloned()
            .map(|sender| (sender, entry.depth))
            .ok_or_else(|| BusError::TypeMismatch {
                topic: topic.to_string(),
                expected: entry.type_name,
                actual: type_name::<T>(),
            })
    }
}
