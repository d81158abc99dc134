use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::ids::{SimulationUnit, UnitId};

/// An inventory item whose stockout risk is simulated
///
/// Only constructible through [`StockItem::new`], which is also what
/// deserialization goes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStockItem")]
pub struct StockItem {
    id: String,
    current_level: f64,
    mean_demand: f64,
    std_dev_demand: f64,
}

#[derive(Deserialize)]
struct RawStockItem {
    id: String,
    current_level: f64,
    mean_demand: f64,
    std_dev_demand: f64,
}

impl TryFrom<RawStockItem> for StockItem {
    type Error = ConfigError;

    fn try_from(raw: RawStockItem) -> Result<Self, Self::Error> {
        StockItem::new(
            raw.id,
            raw.current_level,
            raw.mean_demand,
            raw.std_dev_demand,
        )
    }
}

impl StockItem {
    pub fn new(
        id: impl Into<String>,
        current_level: f64,
        mean_demand: f64,
        std_dev_demand: f64,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        let invalid = |reason| ConfigError::InvalidItem {
            id: id.clone(),
            reason,
        };

        if id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if !current_level.is_finite() || current_level < 0.0 {
            return Err(invalid("current level must be finite and non-negative"));
        }
        if !mean_demand.is_finite() || mean_demand < 0.0 {
            return Err(invalid("mean demand must be finite and non-negative"));
        }
        if !std_dev_demand.is_finite() || std_dev_demand < 0.0 {
            return Err(invalid("demand std dev must be finite and non-negative"));
        }

        Ok(Self {
            id,
            current_level,
            mean_demand,
            std_dev_demand,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn current_level(&self) -> f64 {
        self.current_level
    }

    pub fn mean_demand(&self) -> f64 {
        self.mean_demand
    }

    pub fn std_dev_demand(&self) -> f64 {
        self.std_dev_demand
    }
}

impl SimulationUnit for StockItem {
    fn unit_id(&self) -> UnitId {
        UnitId::Item(self.id.clone())
    }
}
