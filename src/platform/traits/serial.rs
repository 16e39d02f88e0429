//! Auxiliary serial port interface
//!
//! Byte-queue transport used for synchronous-protocol frame transmission
//! and for the selectable auxiliary functions (telemetry mirror, debug
//! console, SBUS trainer input, Lua scripting). The queue never blocks a
//! real-time task: pushes drop on a full queue rather than stall on a slow
//! consumer.

/// Auxiliary serial port mode
///
/// Exactly one mode is active at a time per physical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialMode {
    /// Port unused
    Off,
    /// Mirror telemetry bytes to the port
    TelemetryMirror,
    /// Debug console / CLI
    Debug,
    /// SBUS trainer input
    SbusTrainer,
    /// Telemetry link
    Telemetry,
    /// Lua scripting access
    Lua,
}

/// Byte-oriented serial transport
///
/// # Backpressure contract
///
/// `push` and `write` are non-blocking and drop data when the transmit
/// queue is full. The interrupt-driven drain on real hardware empties the
/// queue independently of the tasks.
pub trait SerialPort {
    /// Select the active port mode
    fn set_mode(&mut self, mode: SerialMode);

    /// Currently active port mode
    fn mode(&self) -> SerialMode;

    /// Queue one byte for transmission
    ///
    /// Returns `false` when the byte was dropped because the queue is full.
    fn push(&mut self, byte: u8) -> bool;

    /// Take one received byte, if any
    fn pop(&mut self) -> Option<u8>;

    /// Queue a buffer for transmission
    ///
    /// Returns the number of bytes actually queued; the remainder is
    /// silently dropped.
    fn write(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        for &byte in data {
            if !self.push(byte) {
                break;
            }
            written += 1;
        }
        written
    }
}
