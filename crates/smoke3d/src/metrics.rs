//! Per-step performance accounting.

use std::fmt::Write as _;
use std::time::Duration;

use crate::solver::SolveStats;

/// Rolling average over the most recent samples.
#[derive(Clone, Debug)]
pub struct RollingAverage {
    values: Vec<f64>,
    capacity: usize,
}

impl RollingAverage {
    /// Create an average over up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, evicting the oldest when full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.capacity {
            self.values.remove(0);
        }
        self.values.push(value);
    }

    /// Mean of the retained samples, 0 when empty.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.values.iter().sum::<f64>() / self.values.len() as f64
        }
    }
}

/// Stage timings and solver stats for the most recent `update()`.
pub struct SimMetrics {
    stages: Vec<(&'static str, Duration)>,
    total: Duration,
    step_ms_avg: RollingAverage,
    solver: SolveStats,
    steps: u64,
}

impl SimMetrics {
    /// Empty metrics; stages appear after the first recorded step.
    pub fn new() -> Self {
        Self {
            stages: Vec::with_capacity(10),
            total: Duration::ZERO,
            step_ms_avg: RollingAverage::new(60),
            solver: SolveStats::default(),
            steps: 0,
        }
    }

    /// Start a new step: forget the previous stage list.
    pub fn begin_step(&mut self) {
        self.stages.clear();
        self.total = Duration::ZERO;
    }

    /// Record one stage's duration.
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        self.stages.push((name, elapsed));
        self.total += elapsed;
    }

    /// Close out the step.
    pub fn end_step(&mut self) {
        self.steps += 1;
        self.step_ms_avg.push(self.total.as_secs_f64() * 1e3);
    }

    /// Record the most recent pressure solve.
    pub fn set_solver_stats(&mut self, stats: SolveStats) {
        self.solver = stats;
    }

    /// Stats of the most recent pressure solve.
    pub fn solver_stats(&self) -> SolveStats {
        self.solver
    }

    /// Number of completed steps since construction or reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.stages.clear();
        self.total = Duration::ZERO;
        self.step_ms_avg = RollingAverage::new(60);
        self.solver = SolveStats::default();
        self.steps = 0;
    }

    /// Free-form text report: per-stage timings of the last step plus the
    /// last solver iteration count and residual.
    pub fn format_report(&self) -> String {
        let mut out = String::from("Step timings:\n");
        for (name, elapsed) in &self.stages {
            let _ = writeln!(
                out,
                "  {name}: {:.3} ms",
                elapsed.as_secs_f64() * 1e3
            );
        }
        let _ = writeln!(
            out,
            "  total: {:.3} ms (avg {:.3} ms over {} steps)",
            self.total.as_secs_f64() * 1e3,
            self.step_ms_avg.average(),
            self.steps
        );
        let _ = writeln!(
            out,
            "Solver iterations: {} | Solver residual: {:.6e}",
            self.solver.iterations, self.solver.residual
        );
        out
    }
}

impl Default for SimMetrics {
    fn default() -> Self {
        Self::new()
    }
}
