//! End-to-end pipeline tests on the mock platform
//!
//! Wires the mixer task, scheduler, module driver and trainer decoder
//! together the way a firmware build would, and checks the cross-module
//! contracts: pulse trains, heartbeat-gated watchdog resets, the force-off
//! latch interplay between the two tasks, and mutual exclusion on the
//! channel outputs.

use std::sync::{Arc, Mutex};

use serial_test::serial;
use txpulse::core::scheduler::MixerScheduler;
use txpulse::core::tasks::menus::{MenuHandler, MenuTask};
use txpulse::core::tasks::mixer::{CycleOutcome, Mixer, MixerTask};
use txpulse::core::tasks::{heart_pulses, CoreContext, TaskSupervisor, HEART_TIMER_10MS};
use txpulse::core::traits::SharedState;
use txpulse::platform::mock::{MockClock, MockPin, MockPower, MockSerial, SimPulseTimer};
use txpulse::platform::Polarity;
use txpulse::pulses::driver::{ModuleDriver, ModuleOutput, TrainerRole};
use txpulse::pulses::trainer::TrainerDecoder;
use txpulse::pulses::{
    ChannelOutputs, ModuleConfig, ModulePulsesData, ModuleType, PpmSettings, Protocol,
    PulseProducer, EXTERNAL_MODULE,
};

/// Thread-safe shared state for the host, mirroring the embedded mutex
struct StdState<T>(Mutex<T>);

impl<T> StdState<T> {
    fn new(value: T) -> Self {
        Self(Mutex::new(value))
    }
}

impl<T> SharedState<T> for StdState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.0.lock().unwrap())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.0.lock().unwrap())
    }
}

struct FixedPpmProducer {
    widths: &'static [u16],
}

impl PulseProducer for FixedPpmProducer {
    fn setup_pulses(&mut self, _module: usize, pulses: &mut ModulePulsesData) -> bool {
        pulses.ppm.clear();
        for &w in self.widths {
            pulses.ppm.push(w);
        }
        true
    }
}

struct NullMixer;
impl Mixer for NullMixer {
    fn compute(&mut self, outputs: &mut ChannelOutputs) {
        outputs.channels[0] = 256;
    }
}

struct NullHandler;
impl MenuHandler for NullHandler {
    fn per_main(&mut self) {}
}

fn ppm_driver() -> ModuleDriver<SimPulseTimer, MockPin> {
    let config = ModuleConfig {
        module_type: ModuleType::Ppm,
        ppm: PpmSettings {
            pre_delay_halfus: 300,
            polarity: Polarity::Positive,
        },
    };
    let mut driver = ModuleDriver::new(
        EXTERNAL_MODULE,
        SimPulseTimer::new(),
        MockPin::new(),
        config,
    );
    driver.set_protocol(Protocol::Ppm);
    driver
}

#[test]
#[serial]
fn ppm_pipeline_end_to_end() {
    txpulse::core::tasks::reset_registry();
    let _supervisor = TaskSupervisor::new();

    let ctx = CoreContext::new(StdState::new(ChannelOutputs::new()));
    ctx.scheduler.start();
    ctx.scheduler.clear_trigger();
    ctx.scheduler.enable_trigger();
    ctx.resume_pulses();

    let mut producer = FixedPpmProducer {
        widths: &[1000, 1500],
    };
    let mut driver = ppm_driver();
    driver.setup_pulses(&mut producer);
    driver.start().unwrap();

    let expected = HEART_TIMER_10MS | heart_pulses(EXTERNAL_MODULE);
    let mut task = MixerTask::new(
        &ctx,
        MockClock::new(),
        MockPower::new(),
        NullMixer,
        (),
        expected,
    );
    let mut serial = MockSerial::new();
    let mut decoder = TrainerDecoder::new();

    // One paced mixer cycle updates the shared outputs.
    ctx.scheduler.trigger();
    let mut modules: [&mut dyn ModuleOutput; 1] = [&mut driver];
    assert_eq!(
        task.run_cycle(&mut modules, &mut producer, &mut serial),
        CycleOutcome::Continue
    );
    assert_eq!(ctx.channels.with(|o| o.channels[0]), 256);

    // The interrupt stream walks the PPM frame and feeds the heartbeat.
    for _ in 0..5 {
        driver.timer_mut().fire_compare();
        if driver.on_timer_irq(&mut producer, &mut decoder) {
            ctx.heartbeat.mark(heart_pulses(EXTERNAL_MODULE));
        }
    }
    assert_eq!(
        driver.timer().deltas(),
        &[300, 300, 700, 300, 1200, 300]
    );

    // A complete heartbeat mask earns exactly one watchdog reset.
    ctx.heartbeat.mark(HEART_TIMER_10MS);
    ctx.scheduler.trigger();
    let mut modules: [&mut dyn ModuleOutput; 1] = [&mut driver];
    task.run_cycle(&mut modules, &mut producer, &mut serial);
    assert_eq!(task.power().watchdog_resets(), 1);

    ctx.scheduler.trigger();
    let mut modules: [&mut dyn ModuleOutput; 1] = [&mut driver];
    task.run_cycle(&mut modules, &mut producer, &mut serial);
    assert_eq!(task.power().watchdog_resets(), 1);
}

#[test]
fn trainer_capture_reaches_decoder_through_driver() {
    let mut producer = FixedPpmProducer { widths: &[1000] };
    let mut driver = ppm_driver();
    driver.set_trainer_role(TrainerRole::MasterJack);
    driver.start().unwrap();

    let mut decoder = TrainerDecoder::new();

    // Sync gap then two channels, as raw 2 MHz counter snapshots.
    let mut t = 0u16;
    for width_us in [10_000u16, 1_600, 1_400] {
        t = t.wrapping_add(width_us * 2);
        driver.timer_mut().inject_capture(t);
        driver.on_timer_irq(&mut producer, &mut decoder);
    }

    assert!(decoder.is_valid());
    assert_eq!(decoder.channels()[0], 100);
    assert_eq!(decoder.channels()[1], -100);
}

#[test]
fn healthy_menu_task_keeps_force_off_disarmed() {
    let ctx = CoreContext::new(StdState::new(ChannelOutputs::new()));
    ctx.scheduler.start();
    ctx.scheduler.clear_trigger();
    ctx.scheduler.enable_trigger();

    let mut mixer_power = MockPower::new();
    mixer_power.set_pressed(true);
    mixer_power.set_tick_step(600);
    let mut mixer_task = MixerTask::new(&ctx, MockClock::new(), mixer_power, NullMixer, (), 0xFF);
    let mut menu_task = MenuTask::new(&ctx, MockClock::new(), MockPower::new(), NullHandler, 1);

    let mut producer = FixedPpmProducer { widths: &[1000] };
    let mut serial = MockSerial::new();

    // While the UI keeps passing, the held button never matures the latch.
    for _ in 0..6 {
        ctx.scheduler.trigger();
        assert_eq!(
            mixer_task.run_cycle(&mut [], &mut producer, &mut serial),
            CycleOutcome::Continue
        );
        assert_eq!(menu_task.run_step(), CycleOutcome::Continue);
    }

    // UI wedged: the third unreleased cycle crosses the 10 s threshold.
    for _ in 0..2 {
        ctx.scheduler.trigger();
        assert_eq!(
            mixer_task.run_cycle(&mut [], &mut producer, &mut serial),
            CycleOutcome::Continue
        );
    }
    ctx.scheduler.trigger();
    assert_eq!(
        mixer_task.run_cycle(&mut [], &mut producer, &mut serial),
        CycleOutcome::PowerOff
    );
    assert!(mixer_task.power().powered_off());
}

#[test]
fn channel_snapshots_are_never_torn() {
    let state = Arc::new(StdState::new(ChannelOutputs::new()));

    let writer = {
        let state = Arc::clone(&state);
        std::thread::spawn(move || {
            for i in 0..20_000i16 {
                state.with_mut(|outputs| {
                    let v = i % 1024;
                    for channel in outputs.channels.iter_mut() {
                        *channel = v;
                    }
                });
            }
        })
    };

    let reader = {
        let state = Arc::clone(&state);
        std::thread::spawn(move || {
            for _ in 0..20_000 {
                let snapshot = state.with(|outputs| *outputs);
                let first = snapshot.channels[0];
                assert!(
                    snapshot.channels.iter().all(|&c| c == first),
                    "torn channel snapshot: {:?}",
                    snapshot.channels
                );
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

#[test]
fn protocol_cadence_reprograms_scheduler_period() {
    let scheduler = MixerScheduler::new();

    // CRSF at 250 Hz.
    scheduler.set_period_us(4_000);
    assert_eq!(scheduler.period_us(), 4_000);

    // Out-of-range requests clamp to the legal window.
    scheduler.set_period_us(50);
    assert_eq!(scheduler.period_us(), 1_000);
    scheduler.set_period_us(120_000);
    assert_eq!(scheduler.period_us(), 30_000);
}
