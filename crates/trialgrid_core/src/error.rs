use std::fmt;

use crate::model::UnitId;

/// Errors raised while validating a run before any trial executes.
///
/// These are the only errors that abort a whole run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A grid dimension range that produces no points
    InvalidRange {
        dimension: String,
        start: f64,
        stop: f64,
        step: f64,
        reason: &'static str,
    },
    /// A grid with no dimensions at all
    EmptyGrid,
    /// A grid with more points than can be enumerated
    GridTooLarge { limit: usize },
    /// A dimension with an empty name
    InvalidDimensionName,
    /// A point whose dimension names and values differ in length
    MismatchedPoint { dimensions: usize, values: usize },
    DuplicateDimension(String),
    /// `iterations_per_unit` must be positive
    ZeroIterations,
    /// An explicit degree of parallelism must be positive
    ZeroParallelism,
    InvalidItem {
        id: String,
        reason: &'static str,
    },
    /// Two units share an identity and would share a random stream
    DuplicateUnit(UnitId),
    /// The worker pool could not be created
    ThreadPool(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRange {
                dimension,
                start,
                stop,
                step,
                reason,
            } => write!(
                f,
                "invalid range for dimension '{dimension}' (start={start}, stop={stop}, step={step}): {reason}"
            ),
            ConfigError::EmptyGrid => write!(f, "grid has no dimensions"),
            ConfigError::GridTooLarge { limit } => {
                write!(f, "grid has more than {limit} points")
            }
            ConfigError::InvalidDimensionName => write!(f, "dimension name must not be empty"),
            ConfigError::MismatchedPoint { dimensions, values } => write!(
                f,
                "point has {dimensions} dimension names but {values} values"
            ),
            ConfigError::DuplicateDimension(name) => {
                write!(f, "dimension '{name}' is declared more than once")
            }
            ConfigError::ZeroIterations => write!(f, "iterations_per_unit must be greater than 0"),
            ConfigError::ZeroParallelism => {
                write!(f, "degree of parallelism must be greater than 0")
            }
            ConfigError::InvalidItem { id, reason } => write!(f, "invalid item '{id}': {reason}"),
            ConfigError::DuplicateUnit(id) => write!(f, "unit {id} appears more than once"),
            ConfigError::ThreadPool(msg) => write!(f, "failed to build worker pool: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised inside a single trial. Recorded against the unit, never
/// propagated to sibling units.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialError {
    InvalidDistribution {
        mean: f64,
        std_dev: f64,
    },
    /// The trial produced NaN or an infinity
    NonFinite(f64),
    /// The objective callback reported a failure
    Objective(String),
    /// The trial panicked; carries the panic message when it was a string
    Panicked(String),
}

impl fmt::Display for TrialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialError::InvalidDistribution { mean, std_dev } => write!(
                f,
                "invalid demand distribution (mean={mean}, std_dev={std_dev})"
            ),
            TrialError::NonFinite(value) => write!(f, "trial produced non-finite value {value}"),
            TrialError::Objective(msg) => write!(f, "objective failed: {msg}"),
            TrialError::Panicked(msg) => write!(f, "trial panicked: {msg}"),
        }
    }
}

impl std::error::Error for TrialError {}

/// Errors raised while reducing trial outcomes into statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// No successful trial to compute a statistic from
    NoSuccessfulTrials,
    UnknownDimension(String),
    /// Pivot rows and columns were given the same dimension
    SameDimension(String),
}

impl fmt::Display for AggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationError::NoSuccessfulTrials => {
                write!(f, "statistic undefined: no successful trials")
            }
            AggregationError::UnknownDimension(name) => write!(f, "unknown dimension '{name}'"),
            AggregationError::SameDimension(name) => {
                write!(f, "cannot pivot dimension '{name}' against itself")
            }
        }
    }
}

impl std::error::Error for AggregationError {}

/// Why a unit was excluded from the aggregated results
#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    Trial(TrialError),
    Aggregation(AggregationError),
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitError::Trial(e) => write!(f, "{e}"),
            UnitError::Aggregation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for UnitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UnitError::Trial(e) => Some(e),
            UnitError::Aggregation(e) => Some(e),
        }
    }
}

impl From<TrialError> for UnitError {
    fn from(err: TrialError) -> Self {
        UnitError::Trial(err)
    }
}

impl From<AggregationError> for UnitError {
    fn from(err: AggregationError) -> Self {
        UnitError::Aggregation(err)
    }
}
