//! Power management and watchdog interface

/// Power switch state as seen by the tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Power switch on, normal operation
    On,
    /// Power button currently pressed (shutdown being negotiated by UI)
    Press,
    /// Power is off / shutdown requested
    Off,
}

/// Power, button and watchdog access
///
/// `tmr10ms` is the shared 10 ms tick counter used for the force-power-off
/// threshold; it wraps at 16 bits and must only be compared with
/// `wrapping_sub`.
pub trait PowerControl {
    /// Query the power switch state
    fn state(&mut self) -> PowerState;

    /// Whether the power-off button is physically held right now
    fn off_pressed(&mut self) -> bool;

    /// Unconditionally power the board off
    fn power_off(&mut self);

    /// Reset the hardware watchdog
    fn watchdog_reset(&mut self);

    /// Free-running 10 ms tick counter, wrapping at 16 bits
    fn tmr10ms(&self) -> u16;
}
