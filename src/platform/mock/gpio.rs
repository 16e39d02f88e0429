//! Mock output pin implementation for testing

use crate::platform::traits::OutputPin;

/// Mock push-pull output pin
///
/// Tracks the driven level and counts level changes for test verification.
#[derive(Debug, Default)]
pub struct MockPin {
    level: bool,
    transitions: u32,
}

impl MockPin {
    /// Create a pin driven low
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of level changes so far
    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        if !self.level {
            self.transitions += 1;
        }
        self.level = true;
    }

    fn set_low(&mut self) {
        if self.level {
            self.transitions += 1;
        }
        self.level = false;
    }

    fn read(&self) -> bool {
        self.level
    }
}
