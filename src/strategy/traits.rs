// src/strategy/traits.rs

use std::fmt::Debug;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PlanningError, Result};
use crate::model::constraints::{BuildNotice, ConstraintBuilder, PlanningFormulation};
use crate::model::dataset::PlanningDataset;
use crate::model::lp::{LinearModel, SolvedModel};
use crate::model::plan::ProductionPlan;
use crate::planning::config::PlanningConfig;
use crate::solver::traits::{LpSolver, SolveOptions};

/// Everything a scalarizer needs for one run. Shared read-only across
/// parallel runs; each run builds its own models from it.
#[derive(Debug, Clone, Copy)]
pub struct PlanningContext<'a> {
    pub dataset: &'a PlanningDataset,
    pub config: &'a PlanningConfig,
    pub solver: &'a dyn LpSolver,
    /// Request reduced costs on every phase solve.
    pub reduced_costs: bool,
}

impl<'a> PlanningContext<'a> {
    pub fn new(
        dataset: &'a PlanningDataset,
        config: &'a PlanningConfig,
        solver: &'a dyn LpSolver,
    ) -> Self {
        Self {
            dataset,
            config,
            solver,
            reduced_costs: false,
        }
    }

    pub fn with_reduced_costs(mut self) -> Self {
        self.reduced_costs = true;
        self
    }

    /// A fresh constraint base named `name`.
    pub fn build(&self, name: &str) -> Result<PlanningFormulation> {
        self.config.validate()?;
        ConstraintBuilder::new(self.dataset)
            .with_domain(self.config.domain())
            .build(name)
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            reduced_costs: self.reduced_costs,
            timeout: self.config.solve_timeout(),
        }
    }

    /// Solves one phase; anything but an optimum becomes `PhaseInfeasible`.
    pub fn solve_phase(&self, strategy: &str, phase: u8, model: LinearModel) -> Result<SolvedModel> {
        debug!(strategy, phase, model = %model, solver = self.solver.name(), "solving phase");
        let solution = self.solver.solve(&model, &self.solve_options())?;
        if !solution.is_optimal() {
            warn!(strategy, phase, status = %solution.status, "phase has no optimum");
            return Err(PlanningError::PhaseInfeasible {
                strategy: strategy.to_string(),
                phase,
                status: solution.status,
            });
        }
        Ok(SolvedModel { model, solution })
    }
}

/// The plain result every strategy reports.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    pub cost: f64,
    pub shortfall: f64,
    pub service_level: f64,
    pub production_plan: ProductionPlan,
}

/// Goal-programming deviation pairs (`under` = d⁻, `over` = d⁺).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalDeviations {
    pub coverage_under: f64,
    pub coverage_over: f64,
    pub cost_under: f64,
    pub cost_over: f64,
    pub cost_target: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeDetail {
    Lexicographic { phase1_cost: f64 },
    WeightedSum { cost_weight: f64, shortfall_weight: f64 },
    GoalProgramming(GoalDeviations),
}

#[derive(Debug, Clone)]
pub struct ScalarizationOutcome {
    pub strategy: &'static str,
    /// Optimal value of the final phase's scalarized objective.
    pub objective_value: f64,
    pub record: PlanRecord,
    pub detail: OutcomeDetail,
    /// The last phase's model and solution, for post-optimality analysis.
    pub solved: SolvedModel,
    pub notices: Vec<BuildNotice>,
}

/// One way of turning the cost and coverage objectives into a single LP.
///
/// Implementations only add objective-specific variables and rows on top of
/// the shared constraint base.
pub trait Scalarizer: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// The swept parameter, if any, for frontier rows.
    fn parameter(&self) -> Option<f64> {
        None
    }

    fn scalarize(&self, ctx: &PlanningContext<'_>) -> Result<ScalarizationOutcome>;
}
