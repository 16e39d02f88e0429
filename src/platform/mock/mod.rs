//! Mock platform implementation for testing
//!
//! This module provides mock implementations of the platform traits that
//! can be used for unit testing without requiring actual hardware. The
//! pulse timer mock records every compare delta and polarity write so
//! tests can verify the exact edge timing a module would emit.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled

#![cfg(any(test, feature = "mock"))]

mod gpio;
mod power;
mod serial;
mod timer;

pub use gpio::MockPin;
pub use power::MockPower;
pub use serial::MockSerial;
pub use timer::{MockClock, SimPulseTimer};
