//! Aggregated results and reports
//!
//! These are the typed outputs handed to whatever renders them. Intermediate
//! trial outcomes never appear here.

use serde::{Deserialize, Serialize};

use crate::aggregate::{self, Goal};
use crate::error::{AggregationError, UnitError};

use super::ids::{SimulationUnit, UnitId};
use super::item::StockItem;
use super::point::ParameterPoint;

/// One summary statistic per simulation unit
pub trait AggregateResult {
    type Unit: SimulationUnit;

    fn unit(&self) -> &Self::Unit;

    /// The headline statistic (stockout probability, mean yield, ...)
    fn statistic(&self) -> f64;
}

/// Estimated stockout risk for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEstimate {
    pub item: StockItem,
    pub trials: usize,
    pub stockouts: usize,
    /// Fraction of trials ending in a stockout (0.0 to 1.0)
    pub probability: f64,
    /// Binomial standard error of `probability`
    pub standard_error: f64,
    /// Mean day of stockout over the trials that stocked out
    pub mean_stockout_day: Option<f64>,
}

impl AggregateResult for RiskEstimate {
    type Unit = StockItem;

    fn unit(&self) -> &StockItem {
        &self.item
    }

    fn statistic(&self) -> f64 {
        self.probability
    }
}

/// Summary of the objective evaluations at one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEstimate {
    pub point: ParameterPoint,
    pub evaluations: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl AggregateResult for PointEstimate {
    type Unit = ParameterPoint;

    fn unit(&self) -> &ParameterPoint {
        &self.point
    }

    fn statistic(&self) -> f64 {
        self.mean
    }
}

/// A unit excluded from the aggregated results
#[derive(Debug, Clone, PartialEq)]
pub struct FailedUnit {
    pub unit_id: UnitId,
    pub seed: u64,
    pub error: UnitError,
}

/// Output of a stockout risk run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskReport {
    /// Sorted by descending probability, ties by unit identity
    pub estimates: Vec<RiskEstimate>,
    pub failed: Vec<FailedUnit>,
}

impl RiskReport {
    /// Items whose stockout probability is at least `threshold`
    pub fn above(&self, threshold: f64) -> impl Iterator<Item = &RiskEstimate> {
        self.estimates
            .iter()
            .filter(move |e| e.probability >= threshold)
    }

    /// Look up the estimate for an item id
    pub fn get(&self, id: &str) -> Option<&RiskEstimate> {
        self.estimates.iter().find(|e| e.item.id() == id)
    }

    /// Total number of units the run was given
    pub fn total_units(&self) -> usize {
        self.estimates.len() + self.failed.len()
    }
}

/// Output of a grid search run
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchReport {
    pub dimensions: Vec<String>,
    pub goal: Goal,
    /// In grid order
    pub estimates: Vec<PointEstimate>,
    pub failed: Vec<FailedUnit>,
}

impl GridSearchReport {
    /// The best point by mean objective value
    pub fn best(&self) -> Option<&PointEstimate> {
        aggregate::best(&self.estimates, self.goal)
    }

    /// The `n` best points, best first
    pub fn top(&self, n: usize) -> Vec<&PointEstimate> {
        aggregate::top(&self.estimates, self.goal, n)
    }

    /// Pivot mean values into a matrix keyed by two dimensions
    pub fn pivot(&self, rows: &str, columns: &str) -> Result<PivotTable, AggregationError> {
        aggregate::pivot(&self.estimates, rows, columns, self.goal)
    }

    pub fn total_units(&self) -> usize {
        self.estimates.len() + self.failed.len()
    }
}

/// Dense row/column matrix of scalars labeled by two grid dimensions
///
/// Cells with no matching result are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub row_dimension: String,
    pub column_dimension: String,
    pub row_values: Vec<f64>,
    pub column_values: Vec<f64>,
    /// Row-major, `row_values.len() * column_values.len()` cells
    pub cells: Vec<Option<f64>>,
}

impl PivotTable {
    pub fn rows(&self) -> usize {
        self.row_values.len()
    }

    pub fn columns(&self) -> usize {
        self.column_values.len()
    }

    /// Cell at (`row`, `col`); `None` if out of bounds or missing
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.columns() {
            return None;
        }
        self.cells[row * self.columns() + col]
    }

    /// One row of cells
    pub fn row(&self, row: usize) -> Option<&[Option<f64>]> {
        if row >= self.rows() {
            return None;
        }
        let cols = self.columns();
        Some(&self.cells[row * cols..(row + 1) * cols])
    }

    /// Number of cells with no result
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}
