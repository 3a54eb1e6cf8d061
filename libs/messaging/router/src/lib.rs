//! # Link Router
//!
//! Owns the single autopilot link and shares it between every translation
//! unit in the process.
//!
//! ```text
//!   unit A ──send──┐                         ┌──▶ handler (unit B)
//!   unit B ──send──┼─▶ encode ─▶ [writer] ─▶ link ─▶ [reader] ─▶ dispatch ─┤
//!   unit C ──send──┘    (caller task)  mutex            task     by id     └──▶ handler (unit C)
//! ```
//!
//! ## Outbound
//!
//! [`Router::send`] encodes on the caller's task, then takes the writer lock
//! for exactly one `write_all`. Frames from different units therefore never
//! interleave on the wire. With no link attached the call fails fast with
//! [`RouterError::LinkUnavailable`]. Each write is bounded by the router's
//! write timeout, so a peer that stops reading cannot hold the lock; a failed
//! or timed-out write detaches the link. There are no retries at this layer.
//!
//! ## Inbound
//!
//! [`Router::attach`] spawns one reader task per link. It reassembles frames
//! from the byte stream, drops malformed ones (counted in [`RouterStats`]),
//! and hands valid frames to [`Router::dispatch`], which runs every handler
//! registered for the frame's id in registration order. A handler that
//! fails or panics is logged and counted; the remaining handlers still run.

mod dispatch;
mod error;
mod link;
mod router;
mod stats;

pub use dispatch::{DispatchReport, FrameHandler, HandlerError, HandlerFailure, HandlerResult};
pub use error::{RouterError, RouterResult};
pub use link::Link;
pub use router::{Router, DEFAULT_WRITE_TIMEOUT};
pub use stats::{RouterStats, StatsSnapshot};
