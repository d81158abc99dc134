//! Scenario files
//!
//! A scenario is a YAML document holding a run configuration plus one or both
//! simulation families:
//!
//! ```yaml
//! run:
//!   simulation: { iterations_per_unit: 1000, trial_horizon: 30, base_seed: 42 }
//!   parallelism: 8
//! risk:
//!   threshold: 0.05
//!   items:
//!     - { id: SKU-1, current_level: 500.0, mean_demand: 12.5, std_dev_demand: 3.0 }
//! grid:
//!   goal: maximize
//!   dimensions:
//!     - { name: pressure, start: 0.0, stop: 10.0, step: 1.0 }
//!     - { name: temperature, start: 0.0, stop: 10.0, step: 1.0 }
//!   objective: { center: [5.0, 5.0], height: 100.0, width: 2.0 }
//!   pivot: { rows: pressure, columns: temperature }
//! ```

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Deserialize;
use trialgrid_core::{
    DimensionSpec, Goal, GridSearchReport, GridSpec, ObjectiveTrial, PeakObjective, PivotTable,
    Progress, RiskReport, RunConfig, StockItem, grid_search, simulate_stockout_risk,
};

/// How often the progress reporter logs while a phase is running
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

fn default_threshold() -> f64 {
    0.05
}

fn default_top() -> usize {
    5
}

/// Stockout risk section
#[derive(Debug, Clone, Deserialize)]
pub struct RiskSection {
    pub items: Vec<StockItem>,
    /// Items at or above this probability are flagged in the report
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Row/column dimensions of the pivot matrix
#[derive(Debug, Clone, Deserialize)]
pub struct PivotSection {
    pub rows: String,
    pub columns: String,
}

/// Grid search section
#[derive(Debug, Clone, Deserialize)]
pub struct GridSection {
    pub dimensions: Vec<DimensionSpec>,
    pub objective: PeakObjective,
    #[serde(default)]
    pub goal: Goal,
    /// Simulated cost of each objective call
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub pivot: Option<PivotSection>,
    /// Number of ranked points to report
    #[serde(default = "default_top")]
    pub top: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub run: RunConfig,
    #[serde(default)]
    pub risk: Option<RiskSection>,
    #[serde(default)]
    pub grid: Option<GridSection>,
}

/// Error types for scenario loading
#[derive(Debug)]
pub enum ScenarioError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(msg) => write!(f, "IO error: {}", msg),
            ScenarioError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ScenarioError::Invalid(msg) => write!(f, "Invalid scenario: {}", msg),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_saphyr::from_str(yaml)
            .map_err(|e| ScenarioError::Parse(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScenarioError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.risk.is_none() && self.grid.is_none() {
            return Err(ScenarioError::Invalid(
                "at least one of `risk` or `grid` is required".into(),
            ));
        }
        if let Some(risk) = &self.risk
            && !(0.0..=1.0).contains(&risk.threshold)
        {
            return Err(ScenarioError::Invalid(format!(
                "risk threshold {} is outside [0, 1]",
                risk.threshold
            )));
        }
        if let Some(grid) = &self.grid
            && grid.objective.center.len() != grid.dimensions.len()
        {
            return Err(ScenarioError::Invalid(format!(
                "objective center has {} coordinates for {} dimensions",
                grid.objective.center.len(),
                grid.dimensions.len()
            )));
        }
        Ok(())
    }
}

/// Grid search results plus the requested pivot
#[derive(Debug, Clone)]
pub struct GridOutcome {
    pub report: GridSearchReport,
    pub pivot: Option<PivotTable>,
    pub top: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioOutcome {
    pub risk: Option<RiskReport>,
    pub threshold: f64,
    pub grid: Option<GridOutcome>,
}

/// Run `f` while a background thread logs the progress it reports
fn with_progress<T>(phase: &str, f: impl FnOnce(&Progress) -> T) -> T {
    let progress = Progress::default();
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        let reporter = s.spawn(|| {
            loop {
                std::thread::park_timeout(PROGRESS_INTERVAL);
                if done.load(Ordering::Acquire) {
                    break;
                }
                tracing::debug!(
                    phase,
                    completed = progress.completed(),
                    total = progress.total(),
                    "Progress {:.0}%",
                    progress.fraction() * 100.0
                );
            }
        });
        let result = f(&progress);
        done.store(true, Ordering::Release);
        reporter.thread().unpark();
        result
    })
}

/// Run every section of the scenario
pub fn run_scenario(scenario: &Scenario) -> color_eyre::Result<ScenarioOutcome> {
    let scheduler = scenario.run.scheduler()?;
    let config = &scenario.run.simulation;
    let mut outcome = ScenarioOutcome::default();

    if let Some(risk) = &scenario.risk {
        let report = with_progress("risk", |progress| {
            simulate_stockout_risk(risk.items.clone(), config, &scheduler, Some(progress))
        })?;
        outcome.risk = Some(report);
        outcome.threshold = risk.threshold;
    }

    if let Some(grid) = &scenario.grid {
        let spec = GridSpec::new(grid.dimensions.clone());
        let mut trial = ObjectiveTrial::new(grid.objective.clone());
        if let Some(ms) = grid.latency_ms {
            trial = trial.with_latency(Duration::from_millis(ms));
        }
        let report = with_progress("grid", |progress| {
            grid_search(&spec, &trial, grid.goal, config, &scheduler, Some(progress))
        })?;
        let pivot = grid
            .pivot
            .as_ref()
            .map(|p| report.pivot(&p.rows, &p.columns))
            .transpose()?;
        outcome.grid = Some(GridOutcome {
            report,
            pivot,
            top: grid.top,
        });
    }

    Ok(outcome)
}
