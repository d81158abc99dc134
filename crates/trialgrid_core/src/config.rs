//! Run configuration
//!
//! `SimulationConfig` is validated on construction (and on deserialization,
//! which goes through the same constructor), so an existing value is always
//! runnable. Validation failures are `ConfigError`s and surface before any
//! trial is scheduled.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scheduler::Scheduler;

/// Parameters shared by every unit of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSimulationConfig")]
pub struct SimulationConfig {
    iterations_per_unit: usize,
    trial_horizon: u32,
    base_seed: u64,
}

#[derive(Deserialize)]
struct RawSimulationConfig {
    iterations_per_unit: usize,
    #[serde(default)]
    trial_horizon: u32,
    #[serde(default)]
    base_seed: u64,
}

impl TryFrom<RawSimulationConfig> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSimulationConfig) -> Result<Self, Self::Error> {
        SimulationConfig::new(raw.iterations_per_unit, raw.trial_horizon, raw.base_seed)
    }
}

impl SimulationConfig {
    pub fn new(
        iterations_per_unit: usize,
        trial_horizon: u32,
        base_seed: u64,
    ) -> Result<Self, ConfigError> {
        if iterations_per_unit == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(Self {
            iterations_per_unit,
            trial_horizon,
            base_seed,
        })
    }

    /// Trials per unit (risk) or evaluations per grid point (grid search)
    pub fn iterations_per_unit(&self) -> usize {
        self.iterations_per_unit
    }

    /// Number of steps (days) simulated per risk trial
    pub fn trial_horizon(&self) -> u32 {
        self.trial_horizon
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Same config with a different base seed
    #[must_use]
    pub fn with_seed(self, base_seed: u64) -> Self {
        Self { base_seed, ..self }
    }
}

/// Simulation parameters plus how to schedule them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub simulation: SimulationConfig,
    /// Maximum units in flight; all available cores when absent
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl RunConfig {
    pub fn new(simulation: SimulationConfig) -> Self {
        Self {
            simulation,
            parallelism: None,
        }
    }

    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Build the scheduler described by `parallelism`
    pub fn scheduler(&self) -> Result<Scheduler, ConfigError> {
        Scheduler::new(self.parallelism)
    }
}
