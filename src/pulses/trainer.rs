//! Trainer input decoding
//!
//! Turns the raw 2 MHz capture samples forwarded by the module driver into
//! trainer channel values. Edges arrive as free-running counter snapshots;
//! successive differences give the PPM-in pulse widths. A long gap
//! resynchronizes the channel index, out-of-range widths drop the rest of
//! the frame.

use crate::pulses::driver::TrainerPulseSink;

/// Maximum decoded trainer channels
pub const MAX_TRAINER_CHANNELS: usize = 16;

/// Shortest valid sync gap (µs)
const SYNC_GAP_MIN_US: u16 = 4_000;

/// Longest valid sync gap (µs)
const SYNC_GAP_MAX_US: u16 = 19_000;

/// Valid channel pulse width window (µs)
const PULSE_MIN_US: u16 = 800;
const PULSE_MAX_US: u16 = 2_200;

/// Channel width subtracted to center values on zero (µs)
const PULSE_CENTER_US: u16 = 1_500;

/// Input considered lost after this many 10 ms ticks without a valid pulse
const VALIDITY_TIMEOUT_TICKS: u8 = 100;

/// PPM trainer input decoder
///
/// Fed one raw capture per falling edge; widths are the wrapping difference
/// of consecutive captures, halved from 0.5 µs ticks to microseconds.
pub struct TrainerDecoder {
    last_capture: u16,
    /// 1-based channel being filled; 0 means waiting for a sync gap
    channel: usize,
    channels: [i16; MAX_TRAINER_CHANNELS],
    validity_ticks: u8,
}

impl TrainerDecoder {
    pub const fn new() -> Self {
        Self {
            last_capture: 0,
            channel: 0,
            channels: [0; MAX_TRAINER_CHANNELS],
            validity_ticks: 0,
        }
    }

    /// Decoded channel values, centered on zero in microseconds
    pub fn channels(&self) -> &[i16; MAX_TRAINER_CHANNELS] {
        &self.channels
    }

    /// Whether a valid trainer frame arrived recently
    pub fn is_valid(&self) -> bool {
        self.validity_ticks > 0
    }

    /// Age the validity window; called once per 10 ms tick
    pub fn tick_10ms(&mut self) {
        self.validity_ticks = self.validity_ticks.saturating_sub(1);
    }
}

impl Default for TrainerDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerPulseSink for TrainerDecoder {
    fn capture(&mut self, captured: u16) {
        let width_us = captured.wrapping_sub(self.last_capture) / 2;
        self.last_capture = captured;

        if width_us > SYNC_GAP_MIN_US && width_us < SYNC_GAP_MAX_US {
            self.channel = 1;
        } else if self.channel != 0 {
            if width_us > PULSE_MIN_US && width_us < PULSE_MAX_US {
                self.channels[self.channel - 1] = width_us as i16 - PULSE_CENTER_US as i16;
                self.validity_ticks = VALIDITY_TIMEOUT_TICKS;
                self.channel += 1;
                if self.channel > MAX_TRAINER_CHANNELS {
                    self.channel = 0;
                }
            } else {
                // Glitch: drop the rest of the frame, wait for the next sync.
                self.channel = 0;
            }
        }
    }
}
