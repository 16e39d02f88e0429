//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the transmitter's
//! real-time peripherals: the dual-channel capture/compare pulse timer,
//! the auxiliary serial port, module power switches and power management.
//! All hardware-specific code must stay behind these traits.

pub mod error;
pub mod traits;

// Platform implementations (feature-gated)
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{PlatformError, Result};
pub use traits::{
    OutputPin, Polarity, PowerControl, PowerState, PulseTimer, SerialMode, SerialPort,
    SystemClock,
};
