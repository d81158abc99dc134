mod ids;
mod item;
mod point;
mod results;
mod work;

pub use ids::{SimulationUnit, UnitId};
pub use item::StockItem;
pub use point::ParameterPoint;
pub use results::{
    AggregateResult, FailedUnit, GridSearchReport, PivotTable, PointEstimate, RiskEstimate,
    RiskReport,
};
pub use work::{UnitOutcome, WorkItem};
