//! # FCU Bridge Service
//!
//! Wires the libraries into a running process:
//!
//! 1. one [`LocalBus`](bridge_bus::LocalBus) and one [`Router`](link_router::Router)
//! 2. the configured units, loaded through the builtin catalog
//! 3. a [`LinkSupervisor`] that keeps the autopilot link attached
//! 4. a periodic router statistics log line
//!
//! Runs until the shutdown future resolves.

pub mod bridge;
pub mod supervisor;

pub use bridge::Bridge;
pub use supervisor::LinkSupervisor;
