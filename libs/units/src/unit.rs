//! # Translation Unit Contract

use crate::rate::{Clock, MonotonicClock};
use bridge_bus::{BusError, LocalBus};
use bridge_codec::ProtocolError;
use bridge_config::{ConfigError, UnitSettings};
use bridge_types::{Frame, MessageId};
use link_router::{FrameHandler, HandlerResult, Router, RouterError};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

/// Unit lifecycle and runtime errors
#[derive(Debug, Error)]
pub enum UnitError {
    /// `initialize` failed; the unit is excluded from the active set
    #[error("Unit '{unit}' failed to initialize: {reason}")]
    InitFailed { unit: String, reason: String },

    #[error(transparent)]
    Settings(#[from] ConfigError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Router(#[from] RouterError),

    /// Unit used before `initialize` succeeded
    #[error("Unit '{0}' is not initialized")]
    NotInitialized(String),
}

impl UnitError {
    pub fn init_failed(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InitFailed {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

pub type UnitResult<T> = std::result::Result<T, UnitError>;

/// Everything a unit is allowed to touch, passed in at `initialize`
#[derive(Clone)]
pub struct UnitContext {
    pub router: Arc<Router>,
    pub bus: LocalBus,
    pub clock: Arc<dyn Clock>,
    /// Default subscription depth for bus topics
    pub queue_depth: usize,
    /// This unit's `[units.settings.<name>]` table
    pub settings: UnitSettings,
}

impl UnitContext {
    pub fn new(router: Arc<Router>, bus: LocalBus) -> Self {
        Self {
            router,
            bus,
            clock: Arc::new(MonotonicClock),
            queue_depth: bridge_bus::DEFAULT_QUEUE_DEPTH,
            settings: UnitSettings::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    pub fn with_settings(mut self, settings: UnitSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Deserialise the settings table into the unit's own type
    pub fn settings<T: DeserializeOwned>(&self, unit: &str) -> UnitResult<T> {
        Ok(self.settings.parse(unit)?)
    }
}

impl std::fmt::Debug for UnitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitContext")
            .field("bus", &self.bus)
            .field("queue_depth", &self.queue_depth)
            .field("settings", &self.settings)
            .finish()
    }
}

/// A loadable translation component between bus topics and link messages
///
/// Lifecycle, driven by the loader: construct via the catalog factory, call
/// [`initialize`](Unit::initialize) exactly once, register
/// [`subscriptions`](Unit::subscriptions) with the router, then receive
/// [`handle_frame`](Unit::handle_frame) calls for process lifetime.
pub trait Unit: Send + Sync {
    fn name(&self) -> &str;

    /// Wire the unit up: read settings, subscribe to bus topics, spawn tasks
    ///
    /// Must not block. Returning an error excludes the unit.
    fn initialize(&mut self, ctx: &UnitContext) -> UnitResult<()>;

    /// Inbound link message types this unit wants; empty for send-only units
    fn subscriptions(&self) -> Vec<MessageId> {
        Vec::new()
    }

    /// One inbound frame of a subscribed type
    fn handle_frame(&self, _frame: &Frame) -> UnitResult<()> {
        Ok(())
    }

    /// Stop background work at process shutdown
    fn shutdown(&self) {}
}

/// Adapts an active unit to the router's handler interface
pub(crate) struct UnitHandler(pub(crate) Arc<dyn Unit>);

impl FrameHandler for UnitHandler {
    fn handle_frame(&self, frame: &Frame) -> HandlerResult {
        self.0.handle_frame(frame).map_err(Into::into)
    }
}
