//! Force-power-off latch
//!
//! Normal shutdown is negotiated by the UI. When the menu task is wedged,
//! holding the power button must still turn the radio off: the mixer task
//! feeds the button state into this latch every cycle and powers off once
//! the hold exceeds the threshold. Each healthy menu task pass releases the
//! latch, so it can only mature while the UI is stuck.

use core::sync::atomic::{AtomicU16, Ordering};

/// Hold threshold in 10 ms ticks (10 seconds)
pub const FORCE_POWER_OFF_TICKS: u16 = 1000;

/// Tick value meaning "button not held"
const RELEASED: u16 = 0;

/// Button-hold latch, updated from the mixer task
pub struct ForcePowerOffLatch {
    /// 10 ms tick at which the current hold started; `RELEASED` when idle
    pressed_since: AtomicU16,
}

impl ForcePowerOffLatch {
    pub const fn new() -> Self {
        Self {
            pressed_since: AtomicU16::new(RELEASED),
        }
    }

    /// Feed the current button state
    ///
    /// Returns `true` once the button has been held for
    /// [`FORCE_POWER_OFF_TICKS`]. `now_tick` is the wrapping 10 ms counter;
    /// hold time is measured with `wrapping_sub`.
    pub fn update(&self, pressed: bool, now_tick: u16) -> bool {
        if !pressed {
            self.pressed_since.store(RELEASED, Ordering::SeqCst);
            return false;
        }

        let since = self.pressed_since.load(Ordering::SeqCst);
        if since == RELEASED {
            // A press starting exactly at tick 0 would collide with the
            // released sentinel; nudge it back one tick.
            let start = if now_tick == RELEASED { u16::MAX } else { now_tick };
            self.pressed_since.store(start, Ordering::SeqCst);
            return false;
        }

        now_tick.wrapping_sub(since) >= FORCE_POWER_OFF_TICKS
    }

    /// Release the latch; called by the menu task on every healthy pass
    pub fn release(&self) {
        self.pressed_since.store(RELEASED, Ordering::SeqCst);
    }
}

impl Default for ForcePowerOffLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matures_after_full_hold() {
        let latch = ForcePowerOffLatch::new();

        // Button held from tick 5, fed once per 10 ms tick.
        assert!(!latch.update(true, 5));
        for tick in 6..5 + FORCE_POWER_OFF_TICKS {
            assert!(!latch.update(true, tick));
        }
        assert!(latch.update(true, 5 + FORCE_POWER_OFF_TICKS));
    }

    #[test]
    fn releasing_button_resets_hold() {
        let latch = ForcePowerOffLatch::new();

        assert!(!latch.update(true, 100));
        assert!(!latch.update(false, 600));
        // Hold starts over.
        assert!(!latch.update(true, 700));
        assert!(!latch.update(true, 700 + FORCE_POWER_OFF_TICKS - 1));
        assert!(latch.update(true, 700 + FORCE_POWER_OFF_TICKS));
    }

    #[test]
    fn healthy_ui_pass_releases_latch() {
        let latch = ForcePowerOffLatch::new();

        assert!(!latch.update(true, 100));
        latch.release();
        // The earlier hold no longer counts.
        assert!(!latch.update(true, 100 + FORCE_POWER_OFF_TICKS));
    }

    #[test]
    fn hold_survives_tick_counter_wrap() {
        let latch = ForcePowerOffLatch::new();

        assert!(!latch.update(true, u16::MAX - 100));
        assert!(!latch.update(true, 100));
        assert!(latch.update(true, FORCE_POWER_OFF_TICKS.wrapping_sub(101)));
    }

    #[test]
    fn press_at_tick_zero_still_measures() {
        let latch = ForcePowerOffLatch::new();

        assert!(!latch.update(true, 0));
        // Start was nudged to u16::MAX; one extra tick of slack at most.
        assert!(latch.update(true, FORCE_POWER_OFF_TICKS));
    }
}
