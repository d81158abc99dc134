//! Parameter grid generation
//!
//! A grid is the cartesian product of per-dimension `(start, stop, step)`
//! ranges. Points come out in row-major order: the first declared dimension
//! varies slowest, the last varies fastest.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::ParameterPoint;

/// Relative slack when deciding whether the last step still lands on `stop`
const STOP_TOLERANCE: f64 = 1e-9;

/// Largest number of points a grid may enumerate, per dimension and in total
pub const MAX_GRID_POINTS: usize = 100_000_000;

/// Range specification for one grid dimension (inclusive of `stop`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>, start: f64, stop: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            step,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidRange {
            dimension: self.name.clone(),
            start: self.start,
            stop: self.stop,
            step: self.step,
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidDimensionName);
        }
        if !self.start.is_finite() || !self.stop.is_finite() || !self.step.is_finite() {
            return Err(invalid("bounds and step must be finite"));
        }
        if self.step <= 0.0 {
            return Err(invalid("step must be positive"));
        }
        if self.start > self.stop {
            return Err(invalid("start must not exceed stop"));
        }
        if self.count().is_none() {
            return Err(ConfigError::GridTooLarge {
                limit: MAX_GRID_POINTS,
            });
        }
        Ok(())
    }

    /// Number of values in the range, `None` past `MAX_GRID_POINTS`
    fn count(&self) -> Option<usize> {
        let span = ((self.stop - self.start) / self.step + STOP_TOLERANCE).floor();
        if !span.is_finite() || span >= MAX_GRID_POINTS as f64 {
            return None;
        }
        (span.max(0.0) as usize).checked_add(1)
    }

    /// All values of the range. Each is computed as `start + i * step` so
    /// rounding error does not accumulate. Empty for a range too large to
    /// enumerate.
    pub fn values(&self) -> Vec<f64> {
        (0..self.count().unwrap_or(0))
            .map(|i| self.start + self.step * i as f64)
            .collect()
    }
}

/// The set of dimensions making up a grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub dimensions: Vec<DimensionSpec>,
}

impl GridSpec {
    pub fn new(dimensions: Vec<DimensionSpec>) -> Self {
        Self { dimensions }
    }

    /// Add a dimension (builder style)
    pub fn dimension(mut self, name: impl Into<String>, start: f64, stop: f64, step: f64) -> Self {
        self.dimensions
            .push(DimensionSpec::new(name, start, stop, step));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimensions.is_empty() {
            return Err(ConfigError::EmptyGrid);
        }
        let mut seen = HashSet::new();
        for dim in &self.dimensions {
            dim.validate()?;
            if !seen.insert(dim.name.as_str()) {
                return Err(ConfigError::DuplicateDimension(dim.name.clone()));
            }
        }
        Ok(())
    }
}

/// A validated grid with its axis values precomputed
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    names: Vec<String>,
    axes: Vec<Vec<f64>>,
    len: usize,
}

impl ParameterGrid {
    pub fn new(spec: &GridSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        let axes: Vec<Vec<f64>> = spec.dimensions.iter().map(DimensionSpec::values).collect();
        let len = axes
            .iter()
            .try_fold(1usize, |total, axis| total.checked_mul(axis.len()))
            .filter(|&total| total <= MAX_GRID_POINTS)
            .ok_or(ConfigError::GridTooLarge {
                limit: MAX_GRID_POINTS,
            })?;
        Ok(Self {
            names: spec.dimensions.iter().map(|d| d.name.clone()).collect(),
            axes,
            len,
        })
    }

    pub fn dimensions(&self) -> &[String] {
        &self.names
    }

    /// Number of values along each dimension
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(Vec::len).collect()
    }

    /// Total number of points
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values along the named dimension
    pub fn axis_values(&self, dimension: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == dimension)
            .map(|i| self.axes[i].as_slice())
    }

    /// The point at a row-major flat index
    pub fn point_at(&self, flat: usize) -> Option<ParameterPoint> {
        if flat >= self.len() {
            return None;
        }
        let mut values = vec![0.0; self.axes.len()];
        let mut remaining = flat;
        for (dim, axis) in self.axes.iter().enumerate().rev() {
            values[dim] = axis[remaining % axis.len()];
            remaining /= axis.len();
        }
        Some(ParameterPoint::from_parts(self.names.clone(), values))
    }

    /// Iterate over all points in row-major order. Every call starts over.
    pub fn points(&self) -> GridPoints<'_> {
        GridPoints {
            grid: self,
            indices: vec![0; self.axes.len()],
            done: self.is_empty(),
        }
    }
}

/// Row-major iterator over the points of a [`ParameterGrid`]
#[derive(Debug, Clone)]
pub struct GridPoints<'a> {
    grid: &'a ParameterGrid,
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for GridPoints<'_> {
    type Item = ParameterPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let values = self
            .indices
            .iter()
            .zip(&self.grid.axes)
            .map(|(&idx, axis)| axis[idx])
            .collect();
        let point = ParameterPoint::from_parts(self.grid.names.clone(), values);

        // Odometer increment, last dimension fastest
        let mut carry = true;
        for (index, axis) in self.indices.iter_mut().zip(&self.grid.axes).rev() {
            *index += 1;
            if *index >= axis.len() {
                *index = 0;
            } else {
                carry = false;
                break;
            }
        }
        if carry {
            self.done = true;
        }

        Some(point)
    }
}
