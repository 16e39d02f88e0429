//! Module output state machine
//!
//! One [`ModuleDriver`] per module slot owns that slot's pulse timer, power
//! rail and pulse buffers. Everything in [`ModuleDriver::on_timer_irq`] runs
//! in interrupt context: it steps PPM edges by modular compare arithmetic,
//! re-validates pulses when configuration disagrees with the live protocol,
//! and forwards trainer capture edges. Frame transmission for synchronous
//! protocols happens from the mixer cycle instead, through the object-safe
//! [`ModuleOutput`] view.

use crate::platform::{OutputPin, PulseTimer, Result, SerialPort};
use crate::pulses::{ModuleConfig, ModulePulsesData, ModuleState, Protocol, PulseProducer};

/// Trainer input role of the slot's capture channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerRole {
    /// Capture edges are ignored
    Disabled,
    /// Radio is the master on the trainer jack; captures feed the decoder
    MasterJack,
}

/// Consumer of raw trainer capture values
pub trait TrainerPulseSink {
    /// One raw 2 MHz counter sample per captured edge
    fn capture(&mut self, captured: u16);
}

/// Mixer-side view of a module slot
///
/// Object-safe so the mixer task can drive a heterogeneous set of slots.
pub trait ModuleOutput {
    /// Slot index
    fn index(&self) -> usize;

    /// Active protocol
    fn protocol(&self) -> Protocol;

    /// Switch the active protocol
    ///
    /// Takes effect at the next interrupt; the mismatch guard re-validates
    /// the pulse data before the new protocol consumes it.
    fn set_protocol(&mut self, protocol: Protocol);

    /// Produce and immediately transmit one synchronous frame
    ///
    /// No-op unless the active protocol is synchronous. The transmit is
    /// gated on the producer reporting the frame ready. Returns `true` when
    /// a frame went out.
    fn send_synchronous_frame(
        &mut self,
        producer: &mut dyn PulseProducer,
        serial: &mut dyn SerialPort,
    ) -> bool;

    /// Refill the frame buffer of a frame-based protocol
    ///
    /// Returns `true` when the producer reported the data ready.
    fn refill(&mut self, producer: &mut dyn PulseProducer) -> bool;
}

/// Per-slot pulse output state machine
pub struct ModuleDriver<T: PulseTimer, P: OutputPin> {
    index: usize,
    timer: T,
    power_pin: P,
    config: ModuleConfig,
    state: ModuleState,
    pulses: ModulePulsesData,
    cursor: usize,
    /// PPM phase flag: separator half-period next, channel remainder after
    in_gap: bool,
    /// Cached separator width; reloaded from config at each frame restart
    gap_halfus: u16,
    trainer_role: TrainerRole,
}

impl<T: PulseTimer, P: OutputPin> ModuleDriver<T, P> {
    pub fn new(index: usize, timer: T, power_pin: P, config: ModuleConfig) -> Self {
        Self {
            index,
            timer,
            power_pin,
            config,
            state: ModuleState::new(),
            pulses: ModulePulsesData::default(),
            cursor: 0,
            in_gap: true,
            gap_halfus: config.ppm.pre_delay_halfus,
            trainer_role: TrainerRole::Disabled,
        }
    }

    /// Produce fresh pulse data for this slot
    ///
    /// Called by configuration logic when a protocol is enabled, before the
    /// interrupt stream starts consuming the buffers.
    pub fn setup_pulses(&mut self, producer: &mut dyn PulseProducer) -> bool {
        self.cursor = 0;
        producer.setup_pulses(self.index, &mut self.pulses)
    }

    /// Power the module on and start the pulse timer
    ///
    /// The initial compare target is the PPM separator width, so the first
    /// interrupt lands one separator after start.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is already running.
    pub fn start(&mut self) -> Result<()> {
        self.cursor = 0;
        self.in_gap = true;
        self.gap_halfus = self.config.ppm.pre_delay_halfus;
        self.power_pin.set_high();
        self.timer.start(self.gap_halfus)?;
        self.timer.enable_output();
        Ok(())
    }

    /// Stop pulse output and power the module off
    ///
    /// Only the output channel is disabled; the counter and the capture
    /// channel keep running so trainer input is not disturbed.
    pub fn stop(&mut self) {
        self.timer.stop_output();
        self.power_pin.set_low();
    }

    pub fn set_trainer_role(&mut self, role: TrainerRole) {
        self.trainer_role = role;
    }

    pub fn trainer_role(&self) -> TrainerRole {
        self.trainer_role
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Service the slot's timer interrupt
    ///
    /// Checks and clears both channels. Returns `true` when a compare match
    /// was serviced, which the caller uses as the pulse heartbeat.
    pub fn on_timer_irq(
        &mut self,
        producer: &mut dyn PulseProducer,
        trainer: &mut dyn TrainerPulseSink,
    ) -> bool {
        let mut serviced = false;

        if self.timer.pending_compare() {
            serviced = true;
            self.on_compare_match(producer);
        }

        if let Some(captured) = self.timer.pending_capture() {
            if self.trainer_role == TrainerRole::MasterJack {
                trainer.capture(captured);
            }
        }

        serviced
    }

    fn on_compare_match(&mut self, producer: &mut dyn PulseProducer) {
        // Configuration changed under a live interrupt stream, or the slot
        // was never set up: re-validate the pulse data before consuming it.
        if !self.state.protocol.matches_module_type(self.config.module_type) {
            let _ = producer.setup_pulses(self.index, &mut self.pulses);
            self.cursor = 0;
        }

        match self.state.protocol {
            Protocol::Ppm => self.advance_ppm(producer),
            // Transmitted from the mixer cycle, nothing to step here.
            Protocol::Synchronous(_) => {}
            Protocol::None | Protocol::Uninitialized => {}
            // Frame protocols drain on their own cadence; keep the compare
            // interrupt armed so the guard above stays live.
            _ => self.timer.enable_compare_irq(),
        }
    }

    /// Step one PPM edge
    ///
    /// Each channel is a fixed-width separator followed by the channel
    /// remainder; the zero sentinel restarts the frame, re-applies the
    /// configured polarity and refills from the producer. Compare targets
    /// advance by modular addition only.
    fn advance_ppm(&mut self, producer: &mut dyn PulseProducer) {
        let width = self.pulses.ppm.width_at(self.cursor);
        if width != 0 {
            if self.in_gap {
                let next = self.timer.compare().wrapping_add(self.gap_halfus);
                self.timer.set_compare(next);
            } else {
                let next = self
                    .timer
                    .compare()
                    .wrapping_add(width.wrapping_sub(self.gap_halfus));
                self.timer.set_compare(next);
                self.cursor += 1;
            }
        } else {
            self.cursor = 0;
            self.timer.set_polarity(self.config.ppm.polarity);
            self.timer.enable_output();
            let next = self.timer.compare().wrapping_add(self.gap_halfus);
            self.timer.set_compare(next);
            self.gap_halfus = self.config.ppm.pre_delay_halfus;
            let _ = producer.setup_pulses(self.index, &mut self.pulses);
        }
        self.in_gap = !self.in_gap;
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn pulses(&self) -> &ModulePulsesData {
        &self.pulses
    }
}

impl<T: PulseTimer, P: OutputPin> ModuleOutput for ModuleDriver<T, P> {
    fn index(&self) -> usize {
        self.index
    }

    fn protocol(&self) -> Protocol {
        self.state.protocol
    }

    fn set_protocol(&mut self, protocol: Protocol) {
        self.state.protocol = protocol;
    }

    fn send_synchronous_frame(
        &mut self,
        producer: &mut dyn PulseProducer,
        serial: &mut dyn SerialPort,
    ) -> bool {
        if !self.state.protocol.is_synchronous() {
            return false;
        }
        let ready = producer.setup_pulses(self.index, &mut self.pulses);
        if ready && !self.pulses.frame.is_empty() {
            serial.write(&self.pulses.frame);
            return true;
        }
        false
    }

    fn refill(&mut self, producer: &mut dyn PulseProducer) -> bool {
        if !self.state.protocol.is_frame_based() {
            return false;
        }
        producer.setup_pulses(self.index, &mut self.pulses)
    }
}
