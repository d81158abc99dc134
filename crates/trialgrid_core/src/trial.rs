//! Trial executors
//!
//! A trial is a self-contained computation over one unit and the unit's
//! private random stream. Trials never touch shared mutable state, which is
//! what lets the scheduler run them on any worker in any order.

use std::time::Duration;

use rand::distr::Distribution;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::TrialError;
use crate::model::{ParameterPoint, StockItem};
use crate::seed::UnitRng;

/// One trial over a unit of type `U`
pub trait Trial<U>: Sync {
    type Outcome: Send;

    fn run(&self, unit: &U, rng: &mut UnitRng) -> Result<Self::Outcome, TrialError>;
}

/// Terminal state of a stockout trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialState {
    /// Stock lasted the whole horizon
    Alive,
    /// Stock first reached zero or below on `day` (1-based)
    Stockout { day: u32 },
}

impl TrialState {
    pub fn is_stockout(&self) -> bool {
        matches!(self, TrialState::Stockout { .. })
    }
}

/// Day-by-day depletion of an item's stock over a fixed horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockoutTrial {
    pub horizon: u32,
}

impl StockoutTrial {
    pub fn new(horizon: u32) -> Self {
        Self { horizon }
    }
}

impl Trial<StockItem> for StockoutTrial {
    type Outcome = TrialState;

    fn run(&self, item: &StockItem, rng: &mut UnitRng) -> Result<TrialState, TrialError> {
        let demand = Normal::new(item.mean_demand(), item.std_dev_demand()).map_err(|_| {
            TrialError::InvalidDistribution {
                mean: item.mean_demand(),
                std_dev: item.std_dev_demand(),
            }
        })?;

        let mut stock = item.current_level();
        let mut state = TrialState::Alive;

        for day in 1..=self.horizon {
            // Negative draws mean no demand that day
            let drawn = demand.sample(rng).max(0.0);
            stock -= drawn;
            if stock <= 0.0 {
                state = TrialState::Stockout { day };
                break;
            }
        }

        Ok(state)
    }
}

/// A scalar objective evaluated at a grid point
///
/// Implemented for any `Fn(&ParameterPoint, &mut UnitRng) -> Result<f64, TrialError>`.
/// Deterministic objectives simply ignore the generator.
pub trait Objective: Sync {
    fn evaluate(&self, point: &ParameterPoint, rng: &mut UnitRng) -> Result<f64, TrialError>;
}

impl<F> Objective for F
where
    F: Fn(&ParameterPoint, &mut UnitRng) -> Result<f64, TrialError> + Sync,
{
    fn evaluate(&self, point: &ParameterPoint, rng: &mut UnitRng) -> Result<f64, TrialError> {
        self(point, rng)
    }
}

/// Evaluates an objective, optionally paying a simulated call latency first
///
/// The latency sleeps only the worker running this trial; no lock or shared
/// resource is held while waiting.
#[derive(Debug, Clone)]
pub struct ObjectiveTrial<O> {
    pub objective: O,
    pub latency: Option<Duration>,
}

impl<O: Objective> ObjectiveTrial<O> {
    pub fn new(objective: O) -> Self {
        Self {
            objective,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl<O: Objective> Trial<ParameterPoint> for ObjectiveTrial<O> {
    type Outcome = f64;

    fn run(&self, point: &ParameterPoint, rng: &mut UnitRng) -> Result<f64, TrialError> {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        let value = self.objective.evaluate(point, rng)?;
        if !value.is_finite() {
            return Err(TrialError::NonFinite(value));
        }
        Ok(value)
    }
}

/// Gaussian bump objective: `height * exp(-|x - center|^2 / (2 * width^2))`,
/// plus optional Normal noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakObjective {
    /// Peak location, one coordinate per grid dimension in declaration order
    pub center: Vec<f64>,
    pub height: f64,
    pub width: f64,
    #[serde(default)]
    pub noise_std_dev: f64,
}

impl Objective for PeakObjective {
    fn evaluate(&self, point: &ParameterPoint, rng: &mut UnitRng) -> Result<f64, TrialError> {
        if point.ndim() != self.center.len() {
            return Err(TrialError::Objective(format!(
                "peak has {} coordinates but point has {}",
                self.center.len(),
                point.ndim()
            )));
        }
        if self.width <= 0.0 {
            return Err(TrialError::Objective("peak width must be positive".into()));
        }

        let dist_sq: f64 = point
            .values()
            .iter()
            .zip(&self.center)
            .map(|(x, c)| (x - c).powi(2))
            .sum();
        let value = self.height * (-dist_sq / (2.0 * self.width * self.width)).exp();

        if self.noise_std_dev > 0.0 {
            let noise = Normal::new(0.0, self.noise_std_dev).map_err(|_| {
                TrialError::InvalidDistribution {
                    mean: 0.0,
                    std_dev: self.noise_std_dev,
                }
            })?;
            return Ok(value + noise.sample(rng));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::unit_rng;

    #[test]
    fn test_zero_horizon_is_alive() {
        let item = StockItem::new("a", 0.0, 10.0, 0.0).unwrap();
        let mut rng = unit_rng(1);
        assert_eq!(
            StockoutTrial::new(0).run(&item, &mut rng).unwrap(),
            TrialState::Alive
        );
    }

    #[test]
    fn test_deterministic_demand_stocks_out_on_expected_day() {
        // 100 units, 30 per day: 70, 40, 10, -20 -> stockout on day 4
        let item = StockItem::new("a", 100.0, 30.0, 0.0).unwrap();
        let mut rng = unit_rng(1);
        assert_eq!(
            StockoutTrial::new(10).run(&item, &mut rng).unwrap(),
            TrialState::Stockout { day: 4 }
        );
    }

    #[test]
    fn test_exactly_zero_stock_counts_as_stockout() {
        let item = StockItem::new("a", 60.0, 30.0, 0.0).unwrap();
        let mut rng = unit_rng(1);
        assert_eq!(
            StockoutTrial::new(2).run(&item, &mut rng).unwrap(),
            TrialState::Stockout { day: 2 }
        );
    }

    #[test]
    fn test_horizon_elapses_before_stockout() {
        let item = StockItem::new("a", 100.0, 30.0, 0.0).unwrap();
        let mut rng = unit_rng(1);
        assert_eq!(
            StockoutTrial::new(3).run(&item, &mut rng).unwrap(),
            TrialState::Alive
        );
    }

    #[test]
    fn test_zero_demand_never_stocks_out() {
        let item = StockItem::new("a", 1.0, 0.0, 0.0).unwrap();
        let mut rng = unit_rng(1);
        let state = StockoutTrial::new(10_000).run(&item, &mut rng).unwrap();
        assert!(!state.is_stockout());
    }

    #[test]
    fn test_objective_rejects_non_finite() {
        let trial = ObjectiveTrial::new(
            |_: &ParameterPoint, _: &mut UnitRng| -> Result<f64, TrialError> { Ok(f64::NAN) },
        );
        let point = ParameterPoint::new([("x", 0.0)]);
        let mut rng = unit_rng(1);
        assert!(matches!(
            trial.run(&point, &mut rng),
            Err(TrialError::NonFinite(_))
        ));
    }

    #[test]
    fn test_peak_objective_maximum_at_center() {
        let peak = PeakObjective {
            center: vec![5.0, 5.0],
            height: 100.0,
            width: 2.0,
            noise_std_dev: 0.0,
        };
        let mut rng = unit_rng(1);
        let at_center = peak
            .evaluate(&ParameterPoint::new([("p", 5.0), ("t", 5.0)]), &mut rng)
            .unwrap();
        let off_center = peak
            .evaluate(&ParameterPoint::new([("p", 4.0), ("t", 6.0)]), &mut rng)
            .unwrap();
        assert!((at_center - 100.0).abs() < 1e-12);
        assert!(off_center < at_center);
    }

    #[test]
    fn test_peak_objective_dimension_mismatch() {
        let peak = PeakObjective {
            center: vec![5.0],
            height: 1.0,
            width: 1.0,
            noise_std_dev: 0.0,
        };
        let mut rng = unit_rng(1);
        let point = ParameterPoint::new([("p", 5.0), ("t", 5.0)]);
        assert!(matches!(
            peak.evaluate(&point, &mut rng),
            Err(TrialError::Objective(_))
        ));
    }
}
