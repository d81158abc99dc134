//! Reduction of trial outcomes into summary statistics
//!
//! Every function here is pure and works on already-joined data, so the
//! results do not depend on how the trials were scheduled.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::AggregationError;
use crate::model::{
    ParameterPoint, PivotTable, PointEstimate, RiskEstimate, SimulationUnit, StockItem,
};
use crate::trial::TrialState;

/// Direction of an extremum search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    #[default]
    Maximize,
    Minimize,
}

impl Goal {
    /// Whether `candidate` is strictly better than `incumbent`
    #[must_use]
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Goal::Maximize => candidate > incumbent,
            Goal::Minimize => candidate < incumbent,
        }
    }
}

/// Estimate the stockout probability of one item from its trial outcomes
pub fn stockout_estimate(
    item: StockItem,
    outcomes: &[TrialState],
) -> Result<RiskEstimate, AggregationError> {
    if outcomes.is_empty() {
        return Err(AggregationError::NoSuccessfulTrials);
    }

    let trials = outcomes.len();
    let mut stockouts = 0usize;
    let mut day_sum = 0u64;
    for state in outcomes {
        if let TrialState::Stockout { day } = state {
            stockouts += 1;
            day_sum += u64::from(*day);
        }
    }

    let probability = stockouts as f64 / trials as f64;
    let standard_error = (probability * (1.0 - probability) / trials as f64).sqrt();
    let mean_stockout_day = (stockouts > 0).then(|| day_sum as f64 / stockouts as f64);

    Ok(RiskEstimate {
        item,
        trials,
        stockouts,
        probability,
        standard_error,
        mean_stockout_day,
    })
}

/// Mean, population standard deviation, min and max of a point's evaluations
pub fn point_estimate(
    point: ParameterPoint,
    values: &[f64],
) -> Result<PointEstimate, AggregationError> {
    if values.is_empty() {
        return Err(AggregationError::NoSuccessfulTrials);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(PointEstimate {
        point,
        evaluations: values.len(),
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
    })
}

/// Sort by descending probability; equal probabilities fall back to item
/// identity so the order is fully deterministic.
pub fn rank_by_risk(estimates: &mut [RiskEstimate]) {
    estimates.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| a.item.unit_id().cmp(&b.item.unit_id()))
    });
}

/// Best estimate by mean. Ties go to the earliest estimate.
pub fn best(estimates: &[PointEstimate], goal: Goal) -> Option<&PointEstimate> {
    let mut best: Option<&PointEstimate> = None;
    for estimate in estimates {
        let replace = best.is_none_or(|current| goal.improves(estimate.mean, current.mean));
        if replace {
            best = Some(estimate);
        }
    }
    best
}

/// The `n` best estimates, best first. Stable with respect to input order.
pub fn top(estimates: &[PointEstimate], goal: Goal, n: usize) -> Vec<&PointEstimate> {
    let mut ranked: Vec<&PointEstimate> = estimates.iter().collect();
    ranked.sort_by(|a, b| match goal {
        Goal::Maximize => b.mean.total_cmp(&a.mean),
        Goal::Minimize => a.mean.total_cmp(&b.mean),
    });
    ranked.truncate(n);
    ranked
}

/// Distinct values in ascending order
fn sorted_labels(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut labels: Vec<f64> = values.collect();
    labels.sort_by(f64::total_cmp);
    labels.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
    labels
}

fn label_index(labels: &[f64], value: f64) -> Option<usize> {
    labels.binary_search_by(|l| l.total_cmp(&value)).ok()
}

/// Pivot point means into a matrix with `rows` and `columns` as axes.
///
/// Row and column labels are the distinct sorted coordinates seen in the
/// estimates. Cells with no estimate are `None`. When the grid has more than
/// two dimensions several points land in the same cell; the cell keeps the
/// best of them according to `goal`.
pub fn pivot(
    estimates: &[PointEstimate],
    rows: &str,
    columns: &str,
    goal: Goal,
) -> Result<PivotTable, AggregationError> {
    if rows == columns {
        return Err(AggregationError::SameDimension(rows.to_string()));
    }

    let mut coords = Vec::with_capacity(estimates.len());
    for estimate in estimates {
        let r = estimate
            .point
            .get(rows)
            .ok_or_else(|| AggregationError::UnknownDimension(rows.to_string()))?;
        let c = estimate
            .point
            .get(columns)
            .ok_or_else(|| AggregationError::UnknownDimension(columns.to_string()))?;
        coords.push((r, c, estimate.mean));
    }

    let row_values = sorted_labels(coords.iter().map(|(r, _, _)| *r));
    let column_values = sorted_labels(coords.iter().map(|(_, c, _)| *c));
    let width = column_values.len();
    let mut cells: Vec<Option<f64>> = vec![None; row_values.len() * width];

    for (r, c, value) in coords {
        let (Some(ri), Some(ci)) = (label_index(&row_values, r), label_index(&column_values, c))
        else {
            continue;
        };
        let cell = &mut cells[ri * width + ci];
        if cell.is_none_or(|current| goal.improves(value, current)) {
            *cell = Some(value);
        }
    }

    Ok(PivotTable {
        row_dimension: rows.to_string(),
        column_dimension: columns.to_string(),
        row_values,
        column_values,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> StockItem {
        StockItem::new(id, 100.0, 1.0, 1.0).unwrap()
    }

    fn estimate(coords: &[(&str, f64)], mean: f64) -> PointEstimate {
        PointEstimate {
            point: ParameterPoint::new(coords.iter().copied()),
            evaluations: 1,
            mean,
            std_dev: 0.0,
            min: mean,
            max: mean,
        }
    }

    #[test]
    fn test_stockout_probability() {
        let outcomes = [
            TrialState::Alive,
            TrialState::Stockout { day: 3 },
            TrialState::Alive,
            TrialState::Stockout { day: 5 },
        ];
        let est = stockout_estimate(item("a"), &outcomes).unwrap();
        assert_eq!(est.trials, 4);
        assert_eq!(est.stockouts, 2);
        assert_eq!(est.probability, 0.5);
        assert_eq!(est.mean_stockout_day, Some(4.0));
        assert!((est.standard_error - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_no_stockouts() {
        let est = stockout_estimate(item("a"), &[TrialState::Alive; 10]).unwrap();
        assert_eq!(est.probability, 0.0);
        assert_eq!(est.standard_error, 0.0);
        assert_eq!(est.mean_stockout_day, None);
    }

    #[test]
    fn test_empty_outcomes_are_undefined_not_zero() {
        assert_eq!(
            stockout_estimate(item("a"), &[]).unwrap_err(),
            AggregationError::NoSuccessfulTrials
        );
        assert_eq!(
            point_estimate(ParameterPoint::new([("x", 0.0)]), &[]).unwrap_err(),
            AggregationError::NoSuccessfulTrials
        );
    }

    #[test]
    fn test_point_summary() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let est = point_estimate(ParameterPoint::new([("x", 1.0)]), &values).unwrap();
        assert_eq!(est.mean, 5.0);
        assert_eq!(est.std_dev, 2.0);
        assert_eq!(est.min, 2.0);
        assert_eq!(est.max, 9.0);
    }

    #[test]
    fn test_rank_breaks_ties_by_identity() {
        let mut estimates: Vec<RiskEstimate> = [("c", 0.5), ("a", 0.5), ("b", 0.9)]
            .iter()
            .map(|(id, p)| RiskEstimate {
                item: item(id),
                trials: 10,
                stockouts: (p * 10.0) as usize,
                probability: *p,
                standard_error: 0.0,
                mean_stockout_day: None,
            })
            .collect();
        rank_by_risk(&mut estimates);
        let order: Vec<&str> = estimates.iter().map(|e| e.item.id()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_best_prefers_earliest_on_tie() {
        let estimates = vec![
            estimate(&[("x", 0.0)], 1.0),
            estimate(&[("x", 1.0)], 3.0),
            estimate(&[("x", 2.0)], 3.0),
        ];
        let max = best(&estimates, Goal::Maximize).unwrap();
        assert_eq!(max.point.get("x"), Some(1.0));
        let min = best(&estimates, Goal::Minimize).unwrap();
        assert_eq!(min.point.get("x"), Some(0.0));
        assert!(best(&[], Goal::Maximize).is_none());
    }

    #[test]
    fn test_top_n() {
        let estimates = vec![
            estimate(&[("x", 0.0)], 1.0),
            estimate(&[("x", 1.0)], 5.0),
            estimate(&[("x", 2.0)], 3.0),
        ];
        let top2: Vec<f64> = top(&estimates, Goal::Maximize, 2)
            .iter()
            .map(|e| e.mean)
            .collect();
        assert_eq!(top2, vec![5.0, 3.0]);
        assert_eq!(top(&estimates, Goal::Minimize, 10).len(), 3);
    }

    #[test]
    fn test_pivot_fills_missing_cells_with_none() {
        // (1, 1) is absent
        let estimates = vec![
            estimate(&[("p", 0.0), ("t", 0.0)], 1.0),
            estimate(&[("p", 0.0), ("t", 1.0)], 2.0),
            estimate(&[("p", 1.0), ("t", 0.0)], 3.0),
        ];
        let table = pivot(&estimates, "p", "t", Goal::Maximize).unwrap();
        assert_eq!(table.row_values, vec![0.0, 1.0]);
        assert_eq!(table.column_values, vec![0.0, 1.0]);
        assert_eq!(table.get(0, 0), Some(1.0));
        assert_eq!(table.get(0, 1), Some(2.0));
        assert_eq!(table.get(1, 0), Some(3.0));
        assert_eq!(table.get(1, 1), None);
        assert_eq!(table.missing_count(), 1);
    }

    #[test]
    fn test_pivot_transposed_axes() {
        let estimates = vec![
            estimate(&[("p", 0.0), ("t", 5.0)], 1.0),
            estimate(&[("p", 1.0), ("t", 5.0)], 2.0),
        ];
        let table = pivot(&estimates, "t", "p", Goal::Maximize).unwrap();
        assert_eq!(table.rows(), 1);
        assert_eq!(table.columns(), 2);
        assert_eq!(table.row(0).unwrap(), &[Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_pivot_collapses_extra_dimensions_by_goal() {
        let estimates = vec![
            estimate(&[("p", 0.0), ("t", 0.0), ("v", 0.0)], 1.0),
            estimate(&[("p", 0.0), ("t", 0.0), ("v", 1.0)], 4.0),
        ];
        let max = pivot(&estimates, "p", "t", Goal::Maximize).unwrap();
        assert_eq!(max.get(0, 0), Some(4.0));
        let min = pivot(&estimates, "p", "t", Goal::Minimize).unwrap();
        assert_eq!(min.get(0, 0), Some(1.0));
    }

    #[test]
    fn test_pivot_rejects_bad_dimensions() {
        let estimates = vec![estimate(&[("p", 0.0), ("t", 0.0)], 1.0)];
        assert_eq!(
            pivot(&estimates, "p", "p", Goal::Maximize).unwrap_err(),
            AggregationError::SameDimension("p".to_string())
        );
        assert_eq!(
            pivot(&estimates, "p", "x", Goal::Maximize).unwrap_err(),
            AggregationError::UnknownDimension("x".to_string())
        );
    }

    #[test]
    fn test_pivot_of_nothing_is_empty() {
        let table = pivot(&[], "p", "t", Goal::Maximize).unwrap();
        assert_eq!(table.rows(), 0);
        assert_eq!(table.columns(), 0);
        assert!(table.cells.is_empty());
    }
}
