use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::ids::{SimulationUnit, UnitId};

/// One configuration in a parameter grid: named coordinates in declaration
/// order.
///
/// Equality and hashing compare the dimension names and the exact bit
/// pattern of every coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawParameterPoint")]
pub struct ParameterPoint {
    dimensions: Vec<String>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawParameterPoint {
    dimensions: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<RawParameterPoint> for ParameterPoint {
    type Error = ConfigError;

    fn try_from(raw: RawParameterPoint) -> Result<Self, Self::Error> {
        if raw.dimensions.len() != raw.values.len() {
            return Err(ConfigError::MismatchedPoint {
                dimensions: raw.dimensions.len(),
                values: raw.values.len(),
            });
        }
        Ok(Self::from_parts(raw.dimensions, raw.values))
    }
}

impl ParameterPoint {
    /// Build a point from `(name, value)` pairs
    pub fn new<S: Into<String>>(coords: impl IntoIterator<Item = (S, f64)>) -> Self {
        let (dimensions, values) = coords.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self { dimensions, values }
    }

    pub(crate) fn from_parts(dimensions: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dimensions.len(), values.len());
        Self { dimensions, values }
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.values.len()
    }

    /// Coordinate along the named dimension
    pub fn get(&self, dimension: &str) -> Option<f64> {
        self.dimensions
            .iter()
            .position(|d| d == dimension)
            .map(|i| self.values[i])
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.dimensions
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl PartialEq for ParameterPoint {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for ParameterPoint {}

impl Hash for ParameterPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dimensions.hash(state);
        for v in &self.values {
            v.to_bits().hash(state);
        }
    }
}

impl SimulationUnit for ParameterPoint {
    fn unit_id(&self) -> UnitId {
        UnitId::Point {
            dimensions: self.dimensions.clone(),
            bits: self.values.iter().map(|v| v.to_bits()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let p = ParameterPoint::new([("pressure", 2.0), ("temperature", 7.5)]);
        assert_eq!(p.get("temperature"), Some(7.5));
        assert_eq!(p.get("volume"), None);
        assert_eq!(p.ndim(), 2);
    }

    #[test]
    fn test_equality_is_by_value() {
        let a = ParameterPoint::new([("x", 1.0), ("y", 2.0)]);
        let b = ParameterPoint::new([("x", 1.0), ("y", 2.0)]);
        let c = ParameterPoint::new([("x", 1.0), ("y", 2.5)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.unit_id(), b.unit_id());
        assert_ne!(a.unit_id(), c.unit_id());
    }

    #[test]
    fn test_identity_includes_dimension_names() {
        let x = ParameterPoint::new([("x", 1.0)]);
        let y = ParameterPoint::new([("y", 1.0)]);
        assert_ne!(x, y);
        assert_ne!(x.unit_id(), y.unit_id());
        assert_eq!(x.unit_id().to_string(), "point (x=1)");
    }

    #[test]
    fn test_raw_point_lengths_must_match() {
        let raw = RawParameterPoint {
            dimensions: vec!["x".into(), "y".into()],
            values: vec![1.0],
        };
        assert_eq!(
            ParameterPoint::try_from(raw).unwrap_err(),
            ConfigError::MismatchedPoint {
                dimensions: 2,
                values: 1
            }
        );

        let raw = RawParameterPoint {
            dimensions: vec!["x".into()],
            values: vec![4.0],
        };
        let point = ParameterPoint::try_from(raw).unwrap();
        assert_eq!(point.get("x"), Some(4.0));
    }
}
