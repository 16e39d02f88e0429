//! Pulse timer and system clock interfaces
//!
//! The pulse timer models one hardware timer with two independent channels:
//! an output-compare channel that times outgoing pulse edges and an
//! input-capture channel that samples trainer input edges. It owns raw
//! counter state and carries no protocol policy; the module output state
//! machine in [`crate::pulses::driver`] decides what each compare match
//! means.

use crate::platform::Result;

/// Output line polarity for the compare channel
///
/// `Positive` produces idle-low framing with high pulses, `Negative` the
/// inverse. Reapplied by the state machine at every frame restart because
/// configuration may change between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Dual-channel capture/compare pulse timer
///
/// # Timing contract
///
/// The counter is free-running and 16 bits wide, ticking at 2 MHz (0.5 µs
/// per tick). Compare targets are always produced by modular arithmetic on
/// the previous target (`compare().wrapping_add(delta)`), never by reading
/// the counter back, so counter wraparound is harmless.
///
/// # Interrupt contract
///
/// `pending_compare` and `pending_capture` check **and clear** the
/// respective interrupt flag; implementations must make the clear
/// idempotent so a stop racing an in-flight interrupt stays safe.
/// The capture channel samples the falling edge (inverted capture) to
/// match standard PPM framing.
pub trait PulseTimer {
    /// Start the counter with an initial compare target
    ///
    /// Arms both the capture and compare interrupts and begins counting.
    /// The initial target is the PPM pre-delay in 0.5 µs ticks.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Timer(TimerError::AlreadyRunning)` if the
    /// counter was already started.
    fn start(&mut self, initial_compare: u16) -> Result<()>;

    /// Disable the output-compare channel only
    ///
    /// Leaves the counter and the capture channel running so trainer input
    /// is not disturbed. Must be an idempotent, interrupt-safe register
    /// write: a stop racing an in-flight compare match only clears the
    /// enable bit.
    fn stop_output(&mut self);

    /// Current compare target of the output channel
    fn compare(&self) -> u16;

    /// Program the next compare target
    fn set_compare(&mut self, target: u16);

    /// Set the output line polarity
    fn set_polarity(&mut self, polarity: Polarity);

    /// Enable the output-compare channel
    fn enable_output(&mut self);

    /// Re-enable the compare interrupt
    ///
    /// Used by asynchronous frame protocols that refill from the mixer
    /// cycle instead of stepping pulses from the interrupt.
    fn enable_compare_irq(&mut self);

    /// Check and clear the compare-match interrupt flag
    fn pending_compare(&mut self) -> bool;

    /// Check and clear the capture interrupt flag
    ///
    /// Returns the captured counter value when an edge was captured.
    fn pending_capture(&mut self) -> Option<u16>;
}

/// Monotonic system clock and bounded delays
///
/// The only suspension primitive available to the real-time tasks. Delays
/// are always bounded; there is no indefinite blocking in the core.
pub trait SystemClock {
    /// Current time in microseconds since startup
    fn now_us(&self) -> u64;

    /// Block the calling task for the given number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Block the calling task for the given number of milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Free-running 2 MHz tick counter (0.5 µs ticks), wrapping at 16 bits
    ///
    /// Duration measurements must use `wrapping_sub` on two samples.
    fn tmr_2mhz(&self) -> u16 {
        (self.now_us().wrapping_mul(2) & 0xffff) as u16
    }
}

/// Embassy-backed system clock for embedded targets
#[cfg(feature = "embassy")]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl SystemClock for EmbassyClock {
    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }

    fn delay_us(&mut self, us: u32) {
        embassy_time::block_for(embassy_time::Duration::from_micros(us as u64));
    }
}
