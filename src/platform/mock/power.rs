//! Mock power management implementation for testing

use crate::platform::traits::{PowerControl, PowerState};
use core::cell::Cell;

/// Mock power controller
///
/// Scripts the power switch state and the power button, keeps a simulated
/// 10 ms tick counter and counts watchdog resets. With a non-zero tick
/// step the counter advances on every `tmr10ms` query, which lets a test
/// hold the button "for ten seconds" in a tight loop.
#[derive(Debug)]
pub struct MockPower {
    state: PowerState,
    pressed: bool,
    ticks: Cell<u16>,
    tick_step: u16,
    powered_off: bool,
    watchdog_resets: u32,
}

impl MockPower {
    /// Create a powered-on mock with a static tick counter
    pub fn new() -> Self {
        Self {
            state: PowerState::On,
            pressed: false,
            ticks: Cell::new(0),
            tick_step: 0,
            powered_off: false,
            watchdog_resets: 0,
        }
    }

    /// Set the reported power switch state
    pub fn set_state(&mut self, state: PowerState) {
        self.state = state;
    }

    /// Press or release the power-off button
    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    /// Set the simulated 10 ms tick counter
    pub fn set_ticks(&mut self, ticks: u16) {
        self.ticks.set(ticks);
    }

    /// Advance the tick counter by `step` on every `tmr10ms` query
    pub fn set_tick_step(&mut self, step: u16) {
        self.tick_step = step;
    }

    /// Whether `power_off` has been called
    pub fn powered_off(&self) -> bool {
        self.powered_off
    }

    /// Number of watchdog resets issued
    pub fn watchdog_resets(&self) -> u32 {
        self.watchdog_resets
    }
}

impl Default for MockPower {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerControl for MockPower {
    fn state(&mut self) -> PowerState {
        self.state
    }

    fn off_pressed(&mut self) -> bool {
        self.pressed
    }

    fn power_off(&mut self) {
        self.powered_off = true;
        self.state = PowerState::Off;
    }

    fn watchdog_reset(&mut self) {
        self.watchdog_resets += 1;
    }

    fn tmr10ms(&self) -> u16 {
        let ticks = self.ticks.get().wrapping_add(self.tick_step);
        self.ticks.set(ticks);
        ticks
    }
}
