//! Cooperative task structure
//!
//! The radio runs a small fixed set of tasks: the mixer task (hard
//! real-time, paced by [`crate::core::scheduler::MixerScheduler`]), the menu
//! task (UI, 50 ms period) and the audio task. Task metadata lives in a
//! static registry created once at startup; [`CoreContext`] carries the
//! state the task bodies share so core logic never reaches for globals.

pub mod menus;
pub mod mixer;
pub mod power;
pub mod stats;

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::core::scheduler::MixerScheduler;
use crate::core::tasks::power::ForcePowerOffLatch;
use crate::core::traits::SharedState;
use crate::pulses::ChannelOutputs;

/// Maximum number of tasks that can be registered
pub const MAX_TASKS: usize = 8;

/// Static task metadata
#[derive(Debug, Clone, Copy)]
pub struct TaskMetadata {
    pub name: &'static str,
    pub priority: u8,
    /// Stack budget in 32-bit words
    pub stack_words: u32,
}

/// Mixer task: hard real-time pulse pacing
pub const MIXER_TASK: TaskMetadata = TaskMetadata {
    name: "mixer",
    priority: 4,
    stack_words: 400,
};

/// Menu task: UI and model logic
pub const MENUS_TASK: TaskMetadata = TaskMetadata {
    name: "menus",
    priority: 5,
    stack_words: 2000,
};

/// Audio task: tone and speech queue
pub const AUDIO_TASK: TaskMetadata = TaskMetadata {
    name: "audio",
    priority: 7,
    stack_words: 500,
};

/// Global task registry
///
/// # Safety
///
/// Written only during single-threaded startup, read-only afterwards.
static mut TASK_REGISTRY: [Option<TaskMetadata>; MAX_TASKS] = [None; MAX_TASKS];
static mut TASK_COUNT: usize = 0;

/// Register a task during startup
///
/// Returns the task's index, used for diagnostics lookups.
///
/// # Panics
///
/// Panics if the registry is full.
pub fn register_task(metadata: TaskMetadata) -> usize {
    unsafe {
        if TASK_COUNT >= MAX_TASKS {
            panic!(
                "Task registry full: cannot register more than {} tasks",
                MAX_TASKS
            );
        }
        let index = TASK_COUNT;
        TASK_REGISTRY[index] = Some(metadata);
        TASK_COUNT += 1;
        index
    }
}

/// Get task metadata by index
pub fn get_task(index: usize) -> Option<TaskMetadata> {
    unsafe {
        if index < TASK_COUNT {
            TASK_REGISTRY[index]
        } else {
            None
        }
    }
}

/// Number of registered tasks
pub fn task_count() -> usize {
    unsafe { TASK_COUNT }
}

/// Iterate over all registered tasks
pub fn iter_tasks() -> impl Iterator<Item = (usize, TaskMetadata)> {
    let count = task_count();
    (0..count).filter_map(|i| get_task(i).map(|m| (i, m)))
}

/// Reset the registry (for testing only)
#[cfg(any(test, feature = "mock"))]
pub fn reset_registry() {
    unsafe {
        TASK_REGISTRY = [None; MAX_TASKS];
        TASK_COUNT = 0;
    }
}

/// Fixed task set of the radio, registered once
pub struct TaskSupervisor {
    pub mixer_id: usize,
    pub menus_id: usize,
    pub audio_id: usize,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self {
            mixer_id: register_task(MIXER_TASK),
            menus_id: register_task(MENUS_TASK),
            audio_id: register_task(AUDIO_TASK),
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Heartbeat bit for the 10 ms tick interrupt
pub const HEART_TIMER_10MS: u8 = 1 << 0;

/// Heartbeat bit for a module's pulse interrupt
pub const fn heart_pulses(module: usize) -> u8 {
    1 << (1 + module)
}

/// Pulse-path liveness mask
///
/// Interrupt handlers set their bit after servicing; the mixer task resets
/// the hardware watchdog only when the expected mask is complete, so a dead
/// pulse interrupt starves the watchdog instead of being papered over.
pub struct Heartbeat(AtomicU8);

impl Heartbeat {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Set a liveness bit from interrupt context
    pub fn mark(&self, bit: u8) {
        self.0.fetch_or(bit, Ordering::Relaxed);
    }

    /// Consume the mask if it exactly matches `expected`
    pub fn check_and_clear(&self, expected: u8) -> bool {
        if self.0.load(Ordering::Relaxed) == expected {
            self.0.store(0, Ordering::Relaxed);
            true
        } else {
            false
        }
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by the task bodies
///
/// Owns the mixer scheduler, the mixer-guarded channel outputs, the
/// pulse pause flag, the pulse heartbeat and the force-power-off latch.
pub struct CoreContext<S: SharedState<ChannelOutputs>> {
    pub scheduler: MixerScheduler,
    pub channels: S,
    pulses_paused: AtomicBool,
    pub heartbeat: Heartbeat,
    pub force_off: ForcePowerOffLatch,
}

impl<S: SharedState<ChannelOutputs>> CoreContext<S> {
    /// Pulses start paused; startup resumes them once the modules run
    pub fn new(channels: S) -> Self {
        Self {
            scheduler: MixerScheduler::new(),
            channels,
            pulses_paused: AtomicBool::new(true),
            heartbeat: Heartbeat::new(),
            force_off: ForcePowerOffLatch::new(),
        }
    }

    pub fn pulses_paused(&self) -> bool {
        self.pulses_paused.load(Ordering::SeqCst)
    }

    /// Suspend the mixer compute phase (bind, range check, storage writes)
    pub fn pause_pulses(&self) {
        self.pulses_paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_pulses(&self) {
        self.pulses_paused.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn supervisor_registers_fixed_task_set() {
        reset_registry();
        let sup = TaskSupervisor::new();

        assert_eq!(task_count(), 3);
        assert_eq!(get_task(sup.mixer_id).unwrap().name, "mixer");
        assert_eq!(get_task(sup.menus_id).unwrap().name, "menus");
        assert_eq!(get_task(sup.audio_id).unwrap().name, "audio");
        assert!(get_task(99).is_none());
    }

    #[test]
    #[serial]
    fn registry_iteration_in_order() {
        reset_registry();
        let _ = TaskSupervisor::new();

        let names: Vec<&str> = iter_tasks().map(|(_, m)| m.name).collect();
        assert_eq!(names, vec!["mixer", "menus", "audio"]);
    }

    #[test]
    fn heartbeat_requires_exact_mask() {
        let hb = Heartbeat::new();
        let expected = HEART_TIMER_10MS | heart_pulses(1);

        hb.mark(HEART_TIMER_10MS);
        assert!(!hb.check_and_clear(expected));

        hb.mark(heart_pulses(1));
        assert!(hb.check_and_clear(expected));
        // Consumed.
        assert!(!hb.check_and_clear(expected));
    }

    #[test]
    fn pulses_start_paused() {
        use crate::core::traits::sync::MockState;

        let ctx = CoreContext::new(MockState::new(ChannelOutputs::new()));
        assert!(ctx.pulses_paused());
        ctx.resume_pulses();
        assert!(!ctx.pulses_paused());
        ctx.pause_pulses();
        assert!(ctx.pulses_paused());
    }
}
