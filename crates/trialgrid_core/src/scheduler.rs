//! Fan-out/fan-in over a bounded worker pool
//!
//! The scheduler takes an ordered batch of work items, runs them with at most
//! `parallelism` in flight, and blocks until every one has completed or
//! failed. Each outcome carries the unit it was produced for, and outcomes
//! come back in input order regardless of completion order.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ConfigError, TrialError};
use crate::model::{UnitOutcome, WorkItem};

/// Progress tracking shared between the scheduler and an observer
#[derive(Debug, Clone)]
pub struct Progress {
    /// Completed units counter
    completed: Arc<AtomicUsize>,
    /// Total units
    total: Arc<AtomicUsize>,
}

impl Progress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in [0, 1]; 1.0 for an empty batch
    #[must_use]
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        (self.completed() as f64 / total as f64).min(1.0)
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Bounded-parallelism batch executor
#[derive(Debug)]
pub struct Scheduler {
    parallelism: Option<NonZeroUsize>,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Scheduler {
    /// `None` uses every available compute unit; `Some(p)` caps the number
    /// of units in flight at `p`.
    pub fn new(parallelism: Option<usize>) -> Result<Self, ConfigError> {
        let parallelism = match parallelism {
            Some(p) => Some(NonZeroUsize::new(p).ok_or(ConfigError::ZeroParallelism)?),
            None => None,
        };

        // A cap of one runs on the calling thread and needs no pool
        #[cfg(feature = "parallel")]
        let pool = match parallelism {
            Some(p) if p.get() > 1 => {
                tracing::debug!(threads = p.get(), "Building worker pool");
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(p.get())
                    .thread_name(|i| format!("trialgrid-worker-{i}"))
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
                Some(pool)
            }
            _ => None,
        };

        Ok(Self {
            parallelism,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Scheduler that runs one unit at a time
    pub fn sequential() -> Self {
        Self {
            parallelism: NonZeroUsize::new(1),
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Configured cap, if any
    pub fn parallelism(&self) -> Option<usize> {
        self.parallelism.map(NonZeroUsize::get)
    }

    /// Number of units that can actually be in flight at once
    pub fn effective_parallelism(&self) -> usize {
        if !cfg!(feature = "parallel") {
            return 1;
        }
        self.parallelism().unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Run `work` for every item and wait for all of them.
    ///
    /// `work` receives the unit and its derived seed. An `Err` or a panic
    /// inside `work` is recorded on that unit's outcome and does not affect
    /// any other unit.
    pub fn run<U, O, F>(
        &self,
        items: Vec<WorkItem<U>>,
        work: F,
        progress: Option<&Progress>,
    ) -> Vec<UnitOutcome<U, O>>
    where
        U: Send,
        O: Send,
        F: Fn(&U, u64) -> Result<O, TrialError> + Sync,
    {
        if let Some(p) = progress {
            p.reset(items.len());
        }

        #[cfg(feature = "parallel")]
        let outcomes = if self.parallelism() == Some(1) {
            run_sequential(items, &work, progress)
        } else {
            let fan_out = || {
                items
                    .into_par_iter()
                    .map(|item| execute(item, &work, progress))
                    .collect::<Vec<_>>()
            };
            match &self.pool {
                Some(pool) => pool.install(fan_out),
                None => fan_out(),
            }
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes = run_sequential(items, &work, progress);

        outcomes
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            parallelism: None,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }
}

fn run_sequential<U, O, F>(
    items: Vec<WorkItem<U>>,
    work: &F,
    progress: Option<&Progress>,
) -> Vec<UnitOutcome<U, O>>
where
    F: Fn(&U, u64) -> Result<O, TrialError>,
{
    items
        .into_iter()
        .map(|item| execute(item, work, progress))
        .collect()
}

/// Run one work item with its failure contained
fn execute<U, O, F>(item: WorkItem<U>, work: &F, progress: Option<&Progress>) -> UnitOutcome<U, O>
where
    F: Fn(&U, u64) -> Result<O, TrialError>,
{
    let WorkItem { unit, seed } = item;
    let result = panic::catch_unwind(AssertUnwindSafe(|| work(&unit, seed)))
        .unwrap_or_else(|payload| Err(TrialError::Panicked(panic_message(payload.as_ref()))));

    if let Some(p) = progress {
        p.increment();
    }

    UnitOutcome { unit, seed, result }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
