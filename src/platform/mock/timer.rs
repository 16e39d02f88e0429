//! Mock pulse timer and clock implementations for testing

use crate::platform::error::{PlatformError, TimerError};
use crate::platform::traits::{Polarity, PulseTimer, SystemClock};
use crate::platform::Result;
use heapless::Vec;

/// Maximum number of compare deltas the simulated timer records
const MAX_RECORDED_DELTAS: usize = 128;

/// Simulated dual-channel capture/compare timer
///
/// Records every compare-target delta and every polarity write so tests
/// can read back the exact pulse train a module driver would emit.
/// Interrupts are raised explicitly with [`SimPulseTimer::fire_compare`]
/// and [`SimPulseTimer::inject_capture`]; the test then runs the driver's
/// interrupt entry point.
#[derive(Debug, Default)]
pub struct SimPulseTimer {
    compare: u16,
    running: bool,
    output_enabled: bool,
    compare_irq_enabled: bool,
    pending_compare: bool,
    pending_capture: Option<u16>,
    deltas: Vec<u16, MAX_RECORDED_DELTAS>,
    polarity_writes: Vec<Polarity, 16>,
}

impl SimPulseTimer {
    /// Create a stopped simulated timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the compare-match interrupt flag
    pub fn fire_compare(&mut self) {
        self.pending_compare = true;
    }

    /// Raise the capture interrupt flag with a captured counter value
    pub fn inject_capture(&mut self, captured: u16) {
        self.pending_capture = Some(captured);
    }

    /// All compare-target deltas programmed so far, in order
    pub fn deltas(&self) -> &[u16] {
        &self.deltas
    }

    /// All polarity writes so far, in order
    pub fn polarity_writes(&self) -> &[Polarity] {
        &self.polarity_writes
    }

    /// Whether the output-compare channel is enabled
    pub fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    /// Whether the compare interrupt is enabled
    pub fn compare_irq_enabled(&self) -> bool {
        self.compare_irq_enabled
    }

    /// Whether the counter is running
    pub fn running(&self) -> bool {
        self.running
    }

    fn record_compare(&mut self, target: u16) {
        let delta = target.wrapping_sub(self.compare);
        // A full recording buffer only truncates the test trace.
        let _ = self.deltas.push(delta);
        self.compare = target;
    }
}

impl PulseTimer for SimPulseTimer {
    fn start(&mut self, initial_compare: u16) -> Result<()> {
        if self.running {
            return Err(PlatformError::Timer(TimerError::AlreadyRunning));
        }
        self.running = true;
        self.compare_irq_enabled = true;
        self.record_compare(initial_compare);
        Ok(())
    }

    fn stop_output(&mut self) {
        self.output_enabled = false;
    }

    fn compare(&self) -> u16 {
        self.compare
    }

    fn set_compare(&mut self, target: u16) {
        self.record_compare(target);
    }

    fn set_polarity(&mut self, polarity: Polarity) {
        let _ = self.polarity_writes.push(polarity);
    }

    fn enable_output(&mut self) {
        self.output_enabled = true;
    }

    fn enable_compare_irq(&mut self) {
        self.compare_irq_enabled = true;
    }

    fn pending_compare(&mut self) -> bool {
        core::mem::take(&mut self.pending_compare)
    }

    fn pending_capture(&mut self) -> Option<u16> {
        self.pending_capture.take()
    }
}

/// Mock system clock
///
/// Uses simulated time: delays advance the clock instantly, so tests of
/// bounded waits run in no wall-clock time at all.
#[derive(Debug, Default)]
pub struct MockClock {
    now_us: u64,
}

impl MockClock {
    /// Create a mock clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance simulated time without a task delay
    pub fn advance_us(&mut self, us: u64) {
        self.now_us = self.now_us.wrapping_add(us);
    }
}

impl SystemClock for MockClock {
    fn now_us(&self) -> u64 {
        self.now_us
    }

    fn delay_us(&mut self, us: u32) {
        self.now_us = self.now_us.wrapping_add(us as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_timer_records_deltas() {
        let mut timer = SimPulseTimer::new();
        timer.start(600).unwrap();
        timer.set_compare(timer.compare().wrapping_add(2000));
        timer.set_compare(timer.compare().wrapping_add(3000));
        assert_eq!(timer.deltas(), &[600, 2000, 3000]);
    }

    #[test]
    fn sim_timer_deltas_survive_counter_wrap() {
        let mut timer = SimPulseTimer::new();
        timer.start(0xfff0).unwrap();
        timer.set_compare(timer.compare().wrapping_add(0x20));
        assert_eq!(timer.deltas(), &[0xfff0, 0x20]);
        assert_eq!(timer.compare(), 0x0010);
    }

    #[test]
    fn sim_timer_double_start_fails() {
        let mut timer = SimPulseTimer::new();
        timer.start(100).unwrap();
        assert_eq!(
            timer.start(100),
            Err(PlatformError::Timer(TimerError::AlreadyRunning))
        );
    }

    #[test]
    fn sim_timer_flags_clear_on_read() {
        let mut timer = SimPulseTimer::new();
        timer.fire_compare();
        assert!(timer.pending_compare());
        assert!(!timer.pending_compare());

        timer.inject_capture(1234);
        assert_eq!(timer.pending_capture(), Some(1234));
        assert_eq!(timer.pending_capture(), None);
    }

    #[test]
    fn mock_clock_delay_advances_time() {
        let mut clock = MockClock::new();
        clock.delay_us(1000);
        assert_eq!(clock.now_us(), 1000);
        clock.delay_ms(5);
        assert_eq!(clock.now_us(), 6000);
    }

    #[test]
    fn mock_clock_half_us_ticks_wrap() {
        let mut clock = MockClock::new();
        clock.advance_us(500);
        assert_eq!(clock.tmr_2mhz(), 1000);
        clock.advance_us(40_000);
        let t0 = clock.tmr_2mhz();
        clock.advance_us(650);
        assert_eq!(clock.tmr_2mhz().wrapping_sub(t0), 1300);
    }
}
