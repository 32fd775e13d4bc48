// src/error.rs

use std::time::Duration;

use thiserror::Error;

use crate::solver::traits::SolveStatus;

/// Errors raised while building, solving or analysing a planning model.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// The dataset or configuration is malformed. Raised before any solve.
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    /// A scalarization phase did not reach an optimum.
    #[error("{strategy} phase {phase} ended with status {status}")]
    PhaseInfeasible {
        strategy: String,
        phase: u8,
        status: SolveStatus,
    },

    /// The external solve exceeded the caller-supplied budget.
    #[error("solve of '{model}' exceeded {limit:?}")]
    SolveTimeout { model: String, limit: Duration },

    /// A directional re-solve inside the degeneracy analyzer failed for one axis.
    #[error("degenerate analysis inconclusive for axis '{axis}': {reason}")]
    DegenerateAnalysisInconclusive { axis: String, reason: String },

    #[error("solver '{0}' did not report reduced costs")]
    ReducedCostsUnavailable(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PlanningError {
    pub fn data(message: impl Into<String>) -> Self {
        Self::DataInconsistency(message.into())
    }

    /// True when the failure only affects the strategy that raised it.
    ///
    /// Data errors invalidate the whole run; solve-time failures do not.
    pub fn is_solve_time(&self) -> bool {
        matches!(
            self,
            Self::PhaseInfeasible { .. } | Self::SolveTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlanningError>;
