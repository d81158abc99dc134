//! Stable identities for simulation units
//!
//! A unit's identity is what its random stream is derived from, and what
//! scattered results are joined back on. It must not depend on the order in
//! which units were generated or scheduled.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a simulation unit
///
/// Grid points are identified by their dimension names and the bit patterns
/// of their coordinates so that identity is exact and hashable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitId {
    Item(String),
    Point {
        dimensions: Vec<String>,
        bits: Vec<u64>,
    },
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Item(id) => write!(f, "item '{id}'"),
            UnitId::Point { dimensions, bits } => {
                write!(f, "point (")?;
                for (i, (name, b)) in dimensions.iter().zip(bits).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={}", f64::from_bits(*b))?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Anything independent trials can be run for
pub trait SimulationUnit: Clone + Send + Sync {
    fn unit_id(&self) -> UnitId;
}
