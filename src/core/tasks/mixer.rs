//! Mixer task body
//!
//! One [`MixerTask::run_cycle`] per trigger: wait for the scheduler in
//! 5 ms frequent-action slices up to the 30 ms period bound, re-arm the
//! trigger before computing, check power, then run the compute phase under
//! the mixer mutex and account its duration. The surrounding executor or
//! RTOS thread just loops `run_cycle` until it reports power-off.

use crate::core::scheduler::{MIXER_FREQUENT_ACTIONS_PERIOD_MS, MIXER_MAX_PERIOD_MS};
use crate::core::tasks::{stats, CoreContext};
use crate::core::traits::SharedState;
use crate::log_warn;
use crate::platform::{PowerControl, PowerState, SerialMode, SerialPort, SystemClock};
use crate::pulses::driver::ModuleOutput;
use crate::pulses::{ChannelOutputs, PulseProducer, EXTERNAL_MODULE};

/// Period bound of one compute phase in 0.5 µs ticks
pub const MIXER_MAX_PERIOD_TICKS: u16 = (MIXER_MAX_PERIOD_MS * 2000) as u16;

/// Result of one task step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    PowerOff,
}

/// Mixing computation behind the mixer mutex
pub trait Mixer {
    /// Recompute channel outputs from current inputs
    fn compute(&mut self, outputs: &mut ChannelOutputs);

    /// Slower periodic work still needing the mutex (timers, failsafe aging)
    fn periodic_updates(&mut self, _outputs: &mut ChannelOutputs) {}
}

/// Frequent actions run between trigger waits
///
/// All default to no-ops; a build wires in what its hardware has.
pub trait MixerHooks {
    /// Poll the telemetry receive path
    fn telemetry_wakeup(&mut self) {}

    /// Drain SBUS trainer bytes from the aux serial port
    fn process_sbus_trainer(&mut self, _serial: &mut dyn SerialPort) {}

    /// Keep radio links alive (bluetooth and the like)
    fn link_keepalive(&mut self) {}
}

impl MixerHooks for () {}

/// Transmit one frame for every synchronous module selected by `run_mask`
///
/// Must be called inside the mixer-mutex-held window so the frame is built
/// from a consistent channel snapshot.
pub fn send_synchronous_pulses(
    run_mask: u8,
    modules: &mut [&mut dyn ModuleOutput],
    producer: &mut dyn PulseProducer,
    serial: &mut dyn SerialPort,
) {
    for module in modules.iter_mut() {
        if run_mask & (1 << module.index()) != 0 {
            module.send_synchronous_frame(producer, serial);
        }
    }
}

/// The mixer task
pub struct MixerTask<'a, S, C, P, M, H>
where
    S: SharedState<ChannelOutputs>,
    C: SystemClock,
    P: PowerControl,
    M: Mixer,
    H: MixerHooks,
{
    ctx: &'a CoreContext<S>,
    clock: C,
    power: P,
    mixer: M,
    hooks: H,
    /// Heartbeat mask that must be complete before a watchdog reset
    heartbeat_expected: u8,
}

impl<'a, S, C, P, M, H> MixerTask<'a, S, C, P, M, H>
where
    S: SharedState<ChannelOutputs>,
    C: SystemClock,
    P: PowerControl,
    M: Mixer,
    H: MixerHooks,
{
    pub fn new(
        ctx: &'a CoreContext<S>,
        clock: C,
        power: P,
        mixer: M,
        hooks: H,
        heartbeat_expected: u8,
    ) -> Self {
        Self {
            ctx,
            clock,
            power,
            mixer,
            hooks,
            heartbeat_expected,
        }
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut M {
        &mut self.mixer
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub fn power_mut(&mut self) -> &mut P {
        &mut self.power
    }

    /// Run one mixer cycle
    pub fn run_cycle(
        &mut self,
        modules: &mut [&mut dyn ModuleOutput],
        producer: &mut dyn PulseProducer,
        serial: &mut dyn SerialPort,
    ) -> CycleOutcome {
        let mut waited_ms = 0;
        while waited_ms < MIXER_MAX_PERIOD_MS {
            self.run_frequent_actions(serial);
            if self
                .ctx
                .scheduler
                .wait_for_trigger(MIXER_FREQUENT_ACTIONS_PERIOD_MS, &mut self.clock)
            {
                break;
            }
            waited_ms += MIXER_FREQUENT_ACTIONS_PERIOD_MS;
        }

        // Re-arm before any computation: a trigger raised while this cycle
        // computes must be held for the next wait.
        self.ctx.scheduler.clear_trigger();
        self.ctx.scheduler.enable_trigger();

        if self.power.state() == PowerState::Off {
            return CycleOutcome::PowerOff;
        }
        let pressed = self.power.off_pressed();
        let now_tick = self.power.tmr10ms();
        if self.ctx.force_off.update(pressed, now_tick) {
            log_warn!("menu task unresponsive, forcing power off");
            self.power.power_off();
            return CycleOutcome::PowerOff;
        }

        if !self.ctx.pulses_paused() {
            let t0 = self.clock.tmr_2mhz();
            {
                let Self { ctx, mixer, .. } = self;
                ctx.channels.with_mut(|outputs| {
                    mixer.compute(outputs);
                    send_synchronous_pulses(1 << EXTERNAL_MODULE, modules, producer, serial);
                    for module in modules.iter_mut() {
                        module.refill(producer);
                    }
                    mixer.periodic_updates(outputs);
                });
            }

            if self.ctx.heartbeat.check_and_clear(self.heartbeat_expected) {
                self.power.watchdog_reset();
            }

            let duration = self.clock.tmr_2mhz().wrapping_sub(t0);
            if duration > MIXER_MAX_PERIOD_TICKS {
                log_warn!("mixer cycle overran: {} half-us ticks", duration);
            }
            stats::update_mixer_duration(duration, MIXER_MAX_PERIOD_TICKS);
        }

        CycleOutcome::Continue
    }

    fn run_frequent_actions(&mut self, serial: &mut dyn SerialPort) {
        if !self.ctx.pulses_paused() {
            self.hooks.telemetry_wakeup();
        }
        if serial.mode() == SerialMode::SbusTrainer {
            self.hooks.process_sbus_trainer(serial);
        }
        self.hooks.link_keepalive();
    }
}
