//! Structured result reporting.
//!
//! Instead of a process-wide logger the measurement records are plain data:
//! the run loop owns a `RunLog`, hands each case's `CaseReport` down into the
//! penalty engine, and serializes the whole thing to JSON once at the end.

use crate::datastr::graph::{NodeId, Weight};
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Serialize)]
pub struct RunLog {
    pub tests: TestLog,
}

#[derive(Debug, Default, Serialize)]
pub struct TestLog {
    pub cases: Vec<CaseReport>,
}

/// Everything measured for one source/target pair. Times are milliseconds.
#[derive(Debug, Default, Serialize)]
pub struct CaseReport {
    pub source: NodeId,
    pub target: NodeId,
    pub rank: u32,
    pub shortest_length: Weight,
    pub alt_paths: Vec<AltPathReport>,
    pub first_astar_time: f64,
    pub path_extraction_time: f64,
    pub total_time: f64,
    pub iterations: Vec<IterationReport>,
}

/// Quality figures for one emitted alternative. The three ratio fields stay
/// zero unless quality evaluation is requested, it is far more expensive than
/// the query itself.
#[derive(Debug, Default, Serialize)]
pub struct AltPathReport {
    pub length: Weight,
    pub stretch: f64,
    pub sharing: f64,
    pub local_optimality: f64,
    pub uniformly_bounded_stretch: f64,
}

/// One round of the penalty loop. `is_feasible` is the time spent inside the
/// feasibility check.
#[derive(Debug, Default, Serialize)]
pub struct IterationReport {
    pub apply_penalties: f64,
    pub astar_time: f64,
    pub astar_search_space: usize,
    pub is_feasible: f64,
    pub alt_path_length: Weight,
    pub total: f64,
}

/// Measure how long the lambda takes, return its result and the duration.
pub fn measure<Out, F: FnOnce() -> Out>(f: F) -> (Out, Duration) {
    let start = Instant::now();
    let res = f();
    (res, start.elapsed())
}

/// A struct to repeatedly measure the time passed since the timer was started
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer { start: Instant::now() }
    }

    pub fn restart(&mut self) {
        self.start = Instant::now();
    }

    /// Milliseconds passed since the timer was started.
    pub fn passed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
