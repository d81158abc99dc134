//! Command-line front end for trialgrid_core
//!
//! Loads a YAML scenario, runs its stockout risk and grid search sections,
//! and renders the results as plain-text tables.

pub mod logging;
pub mod report;
pub mod scenario;

pub use logging::init_logging;
pub use scenario::{Scenario, ScenarioError, ScenarioOutcome, run_scenario};
