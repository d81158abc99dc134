//! Reproducible parallel stochastic simulation
//!
//! This crate runs many independent randomized trials per simulation unit,
//! fans the units out over a bounded worker pool, and aggregates the trial
//! outcomes into per-unit statistics. Two families are supported:
//! - Stockout risk: per-item probability that stock runs out within a horizon
//! - Grid search: objective evaluation over the cartesian product of
//!   parameter ranges, with ranking and two-dimensional pivots
//!
//! Every unit draws from its own random stream derived from the run's base
//! seed and the unit's identity, so a run is reproducible regardless of
//! worker count or completion order.
//!
//! ```ignore
//! use trialgrid_core::{RunConfig, SimulationConfig, StockItem, simulate_stockout_risk};
//!
//! let run = RunConfig::new(SimulationConfig::new(1000, 30, 42)?).with_parallelism(8);
//! let items = vec![StockItem::new("SKU-1", 500.0, 12.5, 3.0)?];
//! let report = simulate_stockout_risk(items, &run.simulation, &run.scheduler()?, None)?;
//! for estimate in report.above(0.05) {
//!     println!("{}: {:.3}", estimate.item.id(), estimate.probability);
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod grid;
pub mod scheduler;
pub mod seed;
pub mod trial;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use aggregate::Goal;
pub use config::{RunConfig, SimulationConfig};
pub use engine::{grid_search, grid_search_points, simulate_risk_with, simulate_stockout_risk};
pub use error::{AggregationError, ConfigError, TrialError, UnitError};
pub use grid::{DimensionSpec, GridSpec, ParameterGrid};
pub use model::{
    GridSearchReport, ParameterPoint, PivotTable, PointEstimate, RiskEstimate, RiskReport,
    StockItem, UnitId,
};
pub use scheduler::{Progress, Scheduler};
pub use trial::{ObjectiveTrial, PeakObjective, StockoutTrial, Trial, TrialState};
