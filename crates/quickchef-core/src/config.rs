//! Planner tuning shared by the CLI config file and the coordinator.
//!
//! The CLI reads these values from the `[planner]` table; the core crate only
//! sees the deserialized [`PlannerConfig`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::schedule::DEFAULT_COOK_START_HOUR;

/// Tuning for the plan coordinator.
///
/// Appears as the `[planner]` section of the config file; every field may be
/// omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Upper bound on a single generation, in seconds.
    pub generation_timeout_secs: u64,
    /// Hour (0-23) at which cook tasks are scheduled.
    pub cook_start_hour: u32,
    /// Maximum number of cached plans.
    pub cache_capacity: usize,
}

impl PlannerConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }

    /// Cook start hour, clamped into a valid hour of day.
    pub fn cook_start_hour(&self) -> u32 {
        self.cook_start_hour.min(23)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            cook_start_hour: DEFAULT_COOK_START_HOUR,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}
