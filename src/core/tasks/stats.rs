//! Task and mixer diagnostics
//!
//! Rolling execution statistics kept in statics guarded by critical
//! sections, so they may be updated from any task and read from the UI.
//! Mixer duration is tracked separately in 0.5 µs ticks for the
//! worst-cycle display.

use crate::core::tasks::MAX_TASKS;

/// Per-task execution diagnostics
#[derive(Debug, Clone, Copy)]
pub struct TaskDiagnostics {
    /// Lowest observed free stack in 32-bit words
    pub stack_high_water: u32,
    pub last_duration_us: u32,
    pub max_duration_us: u32,
    pub execution_count: u32,
}

impl Default for TaskDiagnostics {
    fn default() -> Self {
        Self {
            stack_high_water: u32::MAX,
            last_duration_us: 0,
            max_duration_us: 0,
            execution_count: 0,
        }
    }
}

/// Mixer compute-phase diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct MixerDiagnostics {
    /// Worst compute phase in 0.5 µs ticks
    pub max_duration_ticks: u16,
    /// Compute phases that overran the period bound
    pub overruns: u32,
}

static mut TASK_DIAGNOSTICS: [TaskDiagnostics; MAX_TASKS] = [TaskDiagnostics {
    stack_high_water: u32::MAX,
    last_duration_us: 0,
    max_duration_us: 0,
    execution_count: 0,
}; MAX_TASKS];

static mut MIXER_DIAGNOSTICS: MixerDiagnostics = MixerDiagnostics {
    max_duration_ticks: 0,
    overruns: 0,
};

/// Record one task pass
pub fn update_task_duration(task_id: usize, duration_us: u32) {
    critical_section::with(|_cs| unsafe {
        if task_id < MAX_TASKS {
            let diag = &mut TASK_DIAGNOSTICS[task_id];
            diag.last_duration_us = duration_us;
            diag.max_duration_us = diag.max_duration_us.max(duration_us);
            diag.execution_count += 1;
        }
    });
}

/// Record a task's free stack, keeping the low-water mark
///
/// Called by the platform glue that can actually inspect the stack.
pub fn update_stack_high_water(task_id: usize, free_words: u32) {
    critical_section::with(|_cs| unsafe {
        if task_id < MAX_TASKS {
            let diag = &mut TASK_DIAGNOSTICS[task_id];
            diag.stack_high_water = diag.stack_high_water.min(free_words);
        }
    });
}

/// Get a task's diagnostics by registry index
pub fn get_task_diagnostics(task_id: usize) -> TaskDiagnostics {
    critical_section::with(|_cs| unsafe {
        if task_id < MAX_TASKS {
            TASK_DIAGNOSTICS[task_id]
        } else {
            TaskDiagnostics::default()
        }
    })
}

/// Record one mixer compute phase
///
/// Keeps the rolling maximum and counts phases that exceeded `bound_ticks`.
pub fn update_mixer_duration(duration_ticks: u16, bound_ticks: u16) {
    critical_section::with(|_cs| unsafe {
        if duration_ticks > MIXER_DIAGNOSTICS.max_duration_ticks {
            MIXER_DIAGNOSTICS.max_duration_ticks = duration_ticks;
        }
        if duration_ticks > bound_ticks {
            MIXER_DIAGNOSTICS.overruns += 1;
        }
    });
}

/// Get the mixer diagnostics
pub fn get_mixer_diagnostics() -> MixerDiagnostics {
    critical_section::with(|_cs| unsafe { MIXER_DIAGNOSTICS })
}

/// Reset all diagnostics (for testing only)
#[cfg(any(test, feature = "mock"))]
pub fn reset_diagnostics() {
    critical_section::with(|_cs| unsafe {
        TASK_DIAGNOSTICS = [TaskDiagnostics {
            stack_high_water: u32::MAX,
            last_duration_us: 0,
            max_duration_us: 0,
            execution_count: 0,
        }; MAX_TASKS];
        MIXER_DIAGNOSTICS = MixerDiagnostics {
            max_duration_ticks: 0,
            overruns: 0,
        };
    });
}
