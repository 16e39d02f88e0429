//! Mock serial port implementation for testing

use crate::platform::traits::{SerialMode, SerialPort};
use heapless::Deque;

/// Transmit/receive queue depth of the mock port
const QUEUE_DEPTH: usize = 64;

/// Mock serial port
///
/// Provides in-memory transmit and receive queues with the same
/// drop-on-full backpressure behavior as the hardware driver, plus
/// accounting of dropped bytes for test verification.
#[derive(Debug)]
pub struct MockSerial {
    mode: SerialMode,
    tx: Deque<u8, QUEUE_DEPTH>,
    rx: Deque<u8, QUEUE_DEPTH>,
    dropped: usize,
}

impl MockSerial {
    /// Create a mock port with the port unused
    pub fn new() -> Self {
        Self {
            mode: SerialMode::Off,
            tx: Deque::new(),
            rx: Deque::new(),
            dropped: 0,
        }
    }

    /// Drain and return everything queued for transmission
    pub fn take_tx(&mut self) -> heapless::Vec<u8, QUEUE_DEPTH> {
        let mut out = heapless::Vec::new();
        while let Some(byte) = self.tx.pop_front() {
            let _ = out.push(byte);
        }
        out
    }

    /// Inject received bytes (for test setup)
    pub fn inject_rx(&mut self, data: &[u8]) {
        for &byte in data {
            let _ = self.rx.push_back(byte);
        }
    }

    /// Number of bytes dropped because the transmit queue was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort for MockSerial {
    fn set_mode(&mut self, mode: SerialMode) {
        self.mode = mode;
    }

    fn mode(&self) -> SerialMode {
        self.mode
    }

    fn push(&mut self, byte: u8) -> bool {
        if self.tx.push_back(byte).is_err() {
            self.dropped += 1;
            return false;
        }
        true
    }

    fn pop(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_take_roundtrip() {
        let mut serial = MockSerial::new();
        assert!(serial.push(0xAA));
        assert!(serial.push(0x55));
        assert_eq!(serial.take_tx().as_slice(), &[0xAA, 0x55]);
        assert!(serial.take_tx().is_empty());
    }

    #[test]
    fn push_drops_when_full() {
        let mut serial = MockSerial::new();
        for i in 0..QUEUE_DEPTH {
            assert!(serial.push(i as u8));
        }
        assert!(!serial.push(0xFF));
        assert_eq!(serial.dropped(), 1);
    }

    #[test]
    fn write_reports_queued_count() {
        let mut serial = MockSerial::new();
        for _ in 0..QUEUE_DEPTH - 2 {
            serial.push(0);
        }
        // Only two slots left; the rest of the frame is dropped silently.
        assert_eq!(serial.write(&[1, 2, 3, 4]), 2);
    }

    #[test]
    fn one_mode_active_at_a_time() {
        let mut serial = MockSerial::new();
        serial.set_mode(SerialMode::SbusTrainer);
        assert_eq!(serial.mode(), SerialMode::SbusTrainer);
        serial.set_mode(SerialMode::Telemetry);
        assert_eq!(serial.mode(), SerialMode::Telemetry);
    }

    #[test]
    fn rx_injection_pops_in_order() {
        let mut serial = MockSerial::new();
        serial.inject_rx(&[0x0F, 0x71]);
        assert_eq!(serial.pop(), Some(0x0F));
        assert_eq!(serial.pop(), Some(0x71));
        assert_eq!(serial.pop(), None);
    }
}
