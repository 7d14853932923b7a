// src/adapter/profile.rs

//! Resource profiles for the abstract job classes.

use crate::types::JobClass;

/// Memory and wall-time budget of a job class, and whether it spreads over
/// the parallel core count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProfile {
    pub memory_gib: u64,
    pub wall_hours: u32,
    pub multicore: bool,
}

impl JobProfile {
    pub const fn for_class(class: JobClass) -> Self {
        match class {
            JobClass::SingleRun => Self {
                memory_gib: 4,
                wall_hours: 1,
                multicore: false,
            },
            JobClass::OptimalSearch => Self {
                memory_gib: 8,
                wall_hours: 8,
                multicore: true,
            },
            JobClass::ExhaustiveSweep => Self {
                memory_gib: 32,
                wall_hours: 8,
                multicore: true,
            },
            JobClass::MiscProcess => Self {
                memory_gib: 16,
                wall_hours: 1,
                multicore: false,
            },
        }
    }

    /// Slots to request given the backend's parallel core count.
    pub fn slots(&self, parallel_cores: u32) -> u32 {
        if self.multicore { parallel_cores.max(1) } else { 1 }
    }
}
