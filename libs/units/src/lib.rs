//! # Bridge Units
//!
//! Translation units and the machinery that loads them.
//!
//! - [`unit`]: the [`Unit`] contract and the [`UnitContext`] handed to it
//! - [`registry`]: name -> factory catalog and the startup loader
//! - [`rate`]: per-message-type minimum-interval gate
//! - [`hil_sensor`]: bus `SensorSample` -> HIL_SENSOR (send-only)
//! - [`highres_imu`]: HIGHRES_IMU -> bus `SensorSample` (receive-only)

pub mod highres_imu;
pub mod hil_sensor;
pub mod rate;
pub mod registry;
pub mod unit;

pub use rate::{allow, Clock, LogThrottle, ManualClock, MonotonicClock, RateGate};
pub use registry::{ActiveUnits, UnitCatalog, UnitFactory, UnitLoader, UnitState};
pub use unit::{Unit, UnitContext, UnitError, UnitResult};
