use crate::error::TrialError;

/// A unit paired with the seed of its private random stream
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem<U> {
    pub unit: U,
    pub seed: u64,
}

/// What came back from the scheduler for one work item
#[derive(Debug, Clone)]
pub struct UnitOutcome<U, O> {
    pub unit: U,
    pub seed: u64,
    pub result: Result<O, TrialError>,
}
