//! Integration tests for the simulation engine
//!
//! Tests are organized by topic:
//! - `determinism` - Identical results across repeat runs and worker counts
//! - `risk` - Stockout risk estimation end to end
//! - `grid_search` - Grid evaluation, ranking and pivots
//! - `failure_isolation` - Failing units never contaminate healthy ones

mod risk;
