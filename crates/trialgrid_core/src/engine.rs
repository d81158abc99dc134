//! End-to-end pipelines
//!
//! Both families follow the same shape: validate, derive one seed per unit,
//! fan the units out over the scheduler, then join and aggregate. A unit's
//! trials all run on one worker with the unit's private stream, so results
//! are identical for any degree of parallelism.

use std::collections::HashSet;

use crate::aggregate::{self, Goal};
use crate::config::SimulationConfig;
use crate::error::{ConfigError, TrialError, UnitError};
use crate::grid::{GridSpec, ParameterGrid};
use crate::model::{
    FailedUnit, GridSearchReport, ParameterPoint, RiskReport, SimulationUnit, StockItem,
    UnitOutcome,
};
use crate::scheduler::{Progress, Scheduler};
use crate::seed::{assign_seeds, unit_rng};
use crate::trial::{StockoutTrial, Trial, TrialState};

/// Run `iterations` trials of one unit on a single private stream.
/// The first failing trial fails the unit.
fn run_trials<U, T>(
    trial: &T,
    unit: &U,
    seed: u64,
    iterations: usize,
) -> Result<Vec<T::Outcome>, TrialError>
where
    T: Trial<U>,
{
    let mut rng = unit_rng(seed);
    (0..iterations).map(|_| trial.run(unit, &mut rng)).collect()
}

/// Reject units sharing an identity; they would share a random stream and
/// collide in the results.
fn ensure_unique<U: SimulationUnit>(units: &[U]) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(units.len());
    for unit in units {
        let id = unit.unit_id();
        if !seen.insert(id.clone()) {
            return Err(ConfigError::DuplicateUnit(id));
        }
    }
    Ok(())
}

fn record_failure(
    failed: &mut Vec<FailedUnit>,
    unit: &impl SimulationUnit,
    seed: u64,
    error: UnitError,
) {
    let unit_id = unit.unit_id();
    tracing::warn!(unit = %unit_id, error = %error, "Unit failed");
    failed.push(FailedUnit {
        unit_id,
        seed,
        error,
    });
}

/// Estimate the stockout probability of every item over the configured
/// horizon.
pub fn simulate_stockout_risk(
    items: Vec<StockItem>,
    config: &SimulationConfig,
    scheduler: &Scheduler,
    progress: Option<&Progress>,
) -> Result<RiskReport, ConfigError> {
    let trial = StockoutTrial::new(config.trial_horizon());
    simulate_risk_with(items, &trial, config, scheduler, progress)
}

/// Stockout risk with a caller-supplied trial executor
pub fn simulate_risk_with<T>(
    items: Vec<StockItem>,
    trial: &T,
    config: &SimulationConfig,
    scheduler: &Scheduler,
    progress: Option<&Progress>,
) -> Result<RiskReport, ConfigError>
where
    T: Trial<StockItem, Outcome = TrialState>,
{
    ensure_unique(&items)?;

    let iterations = config.iterations_per_unit();
    tracing::info!(
        units = items.len(),
        iterations = iterations,
        horizon = config.trial_horizon(),
        seed = config.base_seed(),
        workers = scheduler.effective_parallelism(),
        "Starting stockout risk simulation"
    );

    let work = assign_seeds(config.base_seed(), items);
    let outcomes = scheduler.run(
        work,
        |item, seed| run_trials(trial, item, seed, iterations),
        progress,
    );

    let mut report = RiskReport::default();
    for UnitOutcome { unit, seed, result } in outcomes {
        let states = match result {
            Ok(states) => states,
            Err(e) => {
                record_failure(&mut report.failed, &unit, seed, e.into());
                continue;
            }
        };
        match aggregate::stockout_estimate(unit.clone(), &states) {
            Ok(estimate) => report.estimates.push(estimate),
            Err(e) => record_failure(&mut report.failed, &unit, seed, e.into()),
        }
    }
    aggregate::rank_by_risk(&mut report.estimates);

    tracing::info!(
        estimated = report.estimates.len(),
        failed = report.failed.len(),
        "Stockout risk simulation finished"
    );
    Ok(report)
}

/// Evaluate `trial` at every point of the grid described by `spec`.
pub fn grid_search<T>(
    spec: &GridSpec,
    trial: &T,
    goal: Goal,
    config: &SimulationConfig,
    scheduler: &Scheduler,
    progress: Option<&Progress>,
) -> Result<GridSearchReport, ConfigError>
where
    T: Trial<ParameterPoint, Outcome = f64>,
{
    let grid = ParameterGrid::new(spec)?;
    tracing::info!(
        dimensions = ?grid.dimensions(),
        shape = ?grid.shape(),
        points = grid.len(),
        "Generated parameter grid"
    );
    let mut report = grid_search_points(
        grid.points().collect(),
        trial,
        goal,
        config,
        scheduler,
        progress,
    )?;
    report.dimensions = grid.dimensions().to_vec();
    Ok(report)
}

/// Evaluate `trial` at an explicit list of points. An empty list yields an
/// empty report.
pub fn grid_search_points<T>(
    points: Vec<ParameterPoint>,
    trial: &T,
    goal: Goal,
    config: &SimulationConfig,
    scheduler: &Scheduler,
    progress: Option<&Progress>,
) -> Result<GridSearchReport, ConfigError>
where
    T: Trial<ParameterPoint, Outcome = f64>,
{
    ensure_unique(&points)?;

    let dimensions = points
        .first()
        .map(|p| p.dimensions().to_vec())
        .unwrap_or_default();
    let iterations = config.iterations_per_unit();
    tracing::info!(
        points = points.len(),
        evaluations_per_point = iterations,
        seed = config.base_seed(),
        workers = scheduler.effective_parallelism(),
        "Starting grid search"
    );

    let work = assign_seeds(config.base_seed(), points);
    let outcomes = scheduler.run(
        work,
        |point, seed| run_trials(trial, point, seed, iterations),
        progress,
    );

    let mut report = GridSearchReport {
        dimensions,
        goal,
        estimates: Vec::with_capacity(outcomes.len()),
        failed: Vec::new(),
    };
    for UnitOutcome { unit, seed, result } in outcomes {
        let values = match result {
            Ok(values) => values,
            Err(e) => {
                record_failure(&mut report.failed, &unit, seed, e.into());
                continue;
            }
        };
        match aggregate::point_estimate(unit.clone(), &values) {
            Ok(estimate) => report.estimates.push(estimate),
            Err(e) => record_failure(&mut report.failed, &unit, seed, e.into()),
        }
    }

    if let Some(best) = report.best() {
        tracing::info!(
            best_mean = best.mean,
            best_point = ?best.point.values(),
            failed = report.failed.len(),
            "Grid search finished"
        );
    } else {
        tracing::info!(failed = report.failed.len(), "Grid search finished without results");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_items_rejected_before_running() {
        let items = vec![
            StockItem::new("a", 10.0, 1.0, 1.0).unwrap(),
            StockItem::new("a", 20.0, 1.0, 1.0).unwrap(),
        ];
        let config = SimulationConfig::new(10, 5, 1).unwrap();
        let err = simulate_stockout_risk(items, &config, &Scheduler::sequential(), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateUnit(_)));
    }

    #[test]
    fn test_points_differing_only_in_names_are_distinct_units() {
        use crate::trial::ObjectiveTrial;

        let points = vec![
            ParameterPoint::new([("x", 1.0)]),
            ParameterPoint::new([("y", 1.0)]),
        ];
        let trial = ObjectiveTrial::new(
            |p: &ParameterPoint, _: &mut crate::seed::UnitRng| -> Result<f64, TrialError> {
                Ok(p.values()[0])
            },
        );
        let config = SimulationConfig::new(2, 0, 1).unwrap();
        let report = grid_search_points(
            points,
            &trial,
            Goal::Maximize,
            &config,
            &Scheduler::sequential(),
            None,
        )
        .unwrap();
        assert_eq!(report.estimates.len(), 2);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_run_trials_stops_at_first_error() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct FailThird {
            calls: AtomicUsize,
        }
        impl Trial<u32> for FailThird {
            type Outcome = u32;
            fn run(&self, unit: &u32, _: &mut crate::seed::UnitRng) -> Result<u32, TrialError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
                    return Err(TrialError::Objective("third call".into()));
                }
                Ok(*unit)
            }
        }

        let trial = FailThird {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(run_trials(&trial, &7u32, 1, 2).unwrap(), vec![7, 7]);
        assert_eq!(
            run_trials(&trial, &7u32, 1, 10).unwrap_err(),
            TrialError::Objective("third call".into())
        );
        // Collection short-circuits: the failing call is the last one made
        assert_eq!(trial.calls.load(Ordering::SeqCst), 3);
    }
}
