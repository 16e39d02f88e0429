//! Menu task body
//!
//! Runs the UI handler once per 50 ms tick, deducting the handler's own
//! runtime from the sleep so the period stays steady. Every completed pass
//! releases the force-power-off latch: only a wedged UI lets the latch
//! mature in the mixer task.

use crate::core::tasks::mixer::CycleOutcome;
use crate::core::tasks::{stats, CoreContext};
use crate::core::traits::SharedState;
use crate::platform::{PowerControl, PowerState, SystemClock};
use crate::pulses::ChannelOutputs;

/// Menu task period in milliseconds
pub const MENU_TASK_PERIOD_MS: u32 = 50;

/// One pass of UI and model logic
pub trait MenuHandler {
    fn per_main(&mut self);
}

/// The menu task
pub struct MenuTask<'a, S, C, P, H>
where
    S: SharedState<ChannelOutputs>,
    C: SystemClock,
    P: PowerControl,
    H: MenuHandler,
{
    ctx: &'a CoreContext<S>,
    clock: C,
    power: P,
    handler: H,
    /// Registry index for duration diagnostics
    task_id: usize,
}

impl<'a, S, C, P, H> MenuTask<'a, S, C, P, H>
where
    S: SharedState<ChannelOutputs>,
    C: SystemClock,
    P: PowerControl,
    H: MenuHandler,
{
    pub fn new(ctx: &'a CoreContext<S>, clock: C, power: P, handler: H, task_id: usize) -> Self {
        Self {
            ctx,
            clock,
            power,
            handler,
            task_id,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run one menu task step
    pub fn run_step(&mut self) -> CycleOutcome {
        match self.power.state() {
            PowerState::Off => return CycleOutcome::PowerOff,
            // Shutdown being negotiated: idle a period without running UI.
            PowerState::Press => {
                self.clock.delay_ms(MENU_TASK_PERIOD_MS);
                return CycleOutcome::Continue;
            }
            PowerState::On => {}
        }

        let t0 = self.clock.now_us();
        self.handler.per_main();

        // The UI ran to completion, so a held power button is being seen by
        // the normal shutdown path; disarm the emergency latch.
        self.ctx.force_off.release();

        let runtime_us = self.clock.now_us().wrapping_sub(t0);
        stats::update_task_duration(self.task_id, runtime_us as u32);

        let runtime_ms = (runtime_us / 1000) as u32;
        if runtime_ms < MENU_TASK_PERIOD_MS {
            self.clock.delay_ms(MENU_TASK_PERIOD_MS - runtime_ms);
        }
        CycleOutcome::Continue
    }
}
