// src/solver/traits.rs

use std::fmt::{self, Debug};
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::model::lp::LinearModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Ask the backend for reduced costs alongside primal values.
    pub reduced_costs: bool,
    /// Wall-clock budget for the call.
    pub timeout: Option<Duration>,
}

impl SolveOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            reduced_costs: false,
            timeout,
        }
    }

    pub fn reduced_costs(mut self) -> Self {
        self.reduced_costs = true;
        self
    }
}

/// What the solve primitive reports back.
///
/// `values` and `objective` are only meaningful for `Optimal`; the other
/// statuses carry empty values.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    /// Objective value including the objective's constant term.
    pub objective: f64,
    pub values: Vec<f64>,
    /// Reduced costs in minimisation form, one per variable.
    pub reduced_costs: Option<Vec<f64>>,
}

impl Solution {
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            objective: f64::NAN,
            values: Vec::new(),
            reduced_costs: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// An external LP solve primitive.
///
/// `Send + Sync` so independent runs can share one backend across the
/// rayon pool.
pub trait LpSolver: Debug + Send + Sync {
    /// Solves `model` once.
    ///
    /// Infeasible, unbounded and failed solves are reported through the
    /// returned status; `Err` is reserved for timeouts and adapter faults.
    fn solve(&self, model: &LinearModel, options: &SolveOptions) -> Result<Solution>;

    fn name(&self) -> &str;
}
