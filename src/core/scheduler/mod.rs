//! Mixer trigger scheduler
//!
//! Paces the mixer task. The pacing source (a periodic hardware timer, or a
//! protocol driver that knows its own cadence) calls [`MixerScheduler::trigger`]
//! from interrupt context; the mixer task blocks in
//! [`MixerScheduler::wait_for_trigger`] until the trigger fires or a bounded
//! timeout elapses. A two-phase re-arm (`clear_trigger` then `enable_trigger`)
//! guarantees a trigger raised while the mixer is still computing is held for
//! the next cycle instead of being lost or double-counted.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::platform::SystemClock;

/// Period of the frequent-action slices while waiting for a trigger (ms)
pub const MIXER_FREQUENT_ACTIONS_PERIOD_MS: u32 = 5;

/// Upper bound on one wait for the mixer trigger (ms)
///
/// Matches the slowest legal protocol refresh rate; a missed trigger can
/// stall the mixer by at most this long.
pub const MIXER_MAX_PERIOD_MS: u32 = 30;

/// Slowest protocol-selectable mixer period (µs)
pub const MAX_REFRESH_RATE_US: u32 = 30_000;

/// Fastest protocol-selectable mixer period (µs)
pub const MIN_REFRESH_RATE_US: u32 = 1_000;

/// Default mixer period when no protocol imposes a cadence (µs)
pub const DEFAULT_MIXER_PERIOD_US: u32 = 10_000;

/// Poll granularity inside `wait_for_trigger` (µs)
const TRIGGER_POLL_US: u32 = 500;

/// Trigger state shared between the pacing interrupt and the mixer task
///
/// All fields are atomics so the pacing source may run in interrupt context
/// without taking a lock.
pub struct MixerScheduler {
    running: AtomicBool,
    armed: AtomicBool,
    fired: AtomicBool,
    period_us: AtomicU32,
}

impl MixerScheduler {
    /// Create a stopped scheduler with the default period
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            armed: AtomicBool::new(false),
            fired: AtomicBool::new(false),
            period_us: AtomicU32::new(DEFAULT_MIXER_PERIOD_US),
        }
    }

    /// Start accepting triggers
    ///
    /// The trigger starts cleared and disarmed; the mixer task arms it on
    /// its first re-arm pass.
    pub fn start(&self) {
        self.fired.store(false, Ordering::SeqCst);
        self.armed.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
    }

    /// Stop accepting triggers
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.fired.store(false, Ordering::SeqCst);
    }

    /// Whether the scheduler is started
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear any pending trigger and disarm
    ///
    /// First half of the two-phase re-arm. Between this call and
    /// `enable_trigger` a pacing-source `trigger` is ignored, so a stale
    /// fire can never be mistaken for a fresh one.
    pub fn clear_trigger(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.fired.store(false, Ordering::SeqCst);
    }

    /// Arm the trigger for the next cycle
    ///
    /// Second half of the two-phase re-arm. Must be called before the
    /// compute phase starts so a trigger raised during computation is
    /// observed by the next wait.
    pub fn enable_trigger(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Fire the trigger from the pacing source
    ///
    /// Interrupt-safe. Ignored while the scheduler is stopped or the
    /// trigger is disarmed.
    pub fn trigger(&self) {
        if self.running.load(Ordering::SeqCst) && self.armed.load(Ordering::SeqCst) {
            self.fired.store(true, Ordering::SeqCst);
        }
    }

    /// Set the mixer period requested by the active protocol
    ///
    /// Clamped to the protocol-legal range
    /// [`MIN_REFRESH_RATE_US`, `MAX_REFRESH_RATE_US`].
    pub fn set_period_us(&self, period_us: u32) {
        let clamped = period_us.clamp(MIN_REFRESH_RATE_US, MAX_REFRESH_RATE_US);
        self.period_us.store(clamped, Ordering::SeqCst);
    }

    /// Current mixer period in microseconds
    pub fn period_us(&self) -> u32 {
        self.period_us.load(Ordering::SeqCst)
    }

    /// Block until the trigger fires or `timeout_ms` elapses
    ///
    /// Returns `true` when the trigger fired, `false` on timeout. This is
    /// the only suspension point of the mixer task and is always bounded.
    pub fn wait_for_trigger(&self, timeout_ms: u32, clock: &mut impl SystemClock) -> bool {
        let mut waited_us = 0u32;
        let timeout_us = timeout_ms.saturating_mul(1000);
        loop {
            if self.fired.swap(false, Ordering::SeqCst) {
                return true;
            }
            if waited_us >= timeout_us {
                return false;
            }
            clock.delay_us(TRIGGER_POLL_US);
            waited_us += TRIGGER_POLL_US;
        }
    }
}

impl Default for MixerScheduler {
    fn default() -> Self {
        Self::new()
    }
}
