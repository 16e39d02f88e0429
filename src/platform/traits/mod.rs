//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod gpio;
pub mod power;
pub mod serial;
pub mod timer;

// Re-export trait interfaces
pub use gpio::OutputPin;
pub use power::{PowerControl, PowerState};
pub use serial::{SerialMode, SerialPort};
pub use timer::{Polarity, PulseTimer, SystemClock};

#[cfg(feature = "embassy")]
pub use timer::EmbassyClock;
