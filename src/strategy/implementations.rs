// src/strategy/implementations.rs

use tracing::info;

use crate::error::Result;
use crate::model::lp::{Comparison, Domain, LinearExpr, Sense, SolvedModel};
use crate::planning::config::{FrontierConfig, GoalSettings};
use crate::strategy::metrics::{
    goal_cost_target, realised_goal_cost, realised_goal_service, service_level,
};
use crate::strategy::traits::{
    GoalDeviations, OutcomeDetail, PlanRecord, PlanningContext, ScalarizationOutcome, Scalarizer,
};

// =========================================================================
// 1. Lexicographic (cost first, then coverage)
// =========================================================================

/// Strict priority: minimise cost, then minimise the coverage shortfall
/// without letting cost exceed the phase-1 optimum.
///
/// Phase 2 runs on a fresh variable set with the bound
/// `cost <= z1* + lexicographic_tolerance`.
#[derive(Debug, Clone, Default)]
pub struct Lexicographic;

impl Lexicographic {
    pub const NAME: &'static str = "lexicographic";

    pub fn new() -> Self {
        Self
    }

    /// Phase 1 alone: the cost-minimal model, whose objective is `z1*`.
    pub fn cost_minimum(&self, ctx: &PlanningContext<'_>) -> Result<SolvedModel> {
        let mut phase1 = ctx.build("CostMin")?;
        let cost = phase1.cost_expr(&ctx.config.costs, true)?;
        phase1.model.set_objective(Sense::Minimize, cost);
        ctx.solve_phase(Self::NAME, 1, phase1.model)
    }
}

impl Scalarizer for Lexicographic {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn scalarize(&self, ctx: &PlanningContext<'_>) -> Result<ScalarizationOutcome> {
        let z1 = self.cost_minimum(ctx)?.solution.objective;
        info!(cost = z1, "lexicographic phase 1 optimum");

        let mut phase2 = ctx.build("Lexico")?;
        let cost = phase2.cost_expr(&ctx.config.costs, true)?;
        let shortfall = phase2.model.add_nonneg("shortfall", Domain::Continuous);

        phase2.model.add_constraint(
            "cost_cap",
            cost.clone(),
            Comparison::Le,
            z1 + ctx.config.lexicographic_tolerance,
        );
        let total_demand = phase2.total_demand();
        let mut coverage = phase2.total_production_expr();
        coverage.add_term(shortfall, 1.0);
        phase2.model.add_constraint(
            "coverage",
            coverage,
            Comparison::Ge,
            ctx.config.alpha * total_demand,
        );
        phase2
            .model
            .set_objective(Sense::Minimize, LinearExpr::term(shortfall, 1.0));

        let model = std::mem::take(&mut phase2.model);
        let solved = ctx.solve_phase(Self::NAME, 2, model)?;

        let values = &solved.solution.values;
        let record = PlanRecord {
            cost: cost.evaluate(values),
            shortfall: solved.value(shortfall),
            service_level: service_level(
                phase2.total_production_expr().evaluate(values),
                total_demand,
            ),
            production_plan: phase2.production_plan(values),
        };
        info!(
            cost = record.cost,
            shortfall = record.shortfall,
            "lexicographic phase 2 optimum"
        );

        Ok(ScalarizationOutcome {
            strategy: Self::NAME,
            objective_value: solved.solution.objective,
            record,
            detail: OutcomeDetail::Lexicographic { phase1_cost: z1 },
            notices: phase2.notices().to_vec(),
            solved,
        })
    }
}

// =========================================================================
// 2. Weighted Sum
// =========================================================================

/// Single model minimising `w_c·cost + w_s·s` with `s >= alpha·D − Σx`.
///
/// Raising `w_s` relative to `w_c` biases the plan toward coverage.
#[derive(Debug, Clone)]
pub struct WeightedSum {
    cost_weight: f64,
    shortfall_weight: f64,
}

impl WeightedSum {
    pub const NAME: &'static str = "weighted-sum";

    pub fn new(cost_weight: f64, shortfall_weight: f64) -> Self {
        Self {
            cost_weight,
            shortfall_weight,
        }
    }

    /// One scalarizer per configured shortfall weight.
    pub fn sweep(config: &FrontierConfig) -> Vec<Self> {
        config
            .shortfall_weights
            .iter()
            .map(|&w_s| Self::new(config.cost_weight, w_s))
            .collect()
    }
}

impl Scalarizer for WeightedSum {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parameter(&self) -> Option<f64> {
        Some(self.shortfall_weight)
    }

    fn scalarize(&self, ctx: &PlanningContext<'_>) -> Result<ScalarizationOutcome> {
        let mut f = ctx.build("Weighted_Sum")?;
        let cost = f.cost_expr(&ctx.config.costs, true)?;
        let shortfall = f.model.add_nonneg("shortfall", Domain::Continuous);

        // s >= alpha·D − Σx, kept as s + Σx >= alpha·D
        let total_demand = f.total_demand();
        let mut coverage = f.total_production_expr();
        coverage.add_term(shortfall, 1.0);
        f.model.add_constraint(
            "shortfall",
            coverage,
            Comparison::Ge,
            ctx.config.alpha * total_demand,
        );

        let mut objective = cost.scaled(self.cost_weight);
        objective.add_term(shortfall, self.shortfall_weight);
        f.model.set_objective(Sense::Minimize, objective);

        let model = std::mem::take(&mut f.model);
        let solved = ctx.solve_phase(Self::NAME, 1, model)?;

        let values = &solved.solution.values;
        let record = PlanRecord {
            cost: cost.evaluate(values),
            shortfall: solved.value(shortfall),
            service_level: service_level(f.total_production_expr().evaluate(values), total_demand),
            production_plan: f.production_plan(values),
        };
        info!(
            w_s = self.shortfall_weight,
            cost = record.cost,
            service = record.service_level,
            "weighted-sum optimum"
        );

        Ok(ScalarizationOutcome {
            strategy: Self::NAME,
            objective_value: solved.solution.objective,
            record,
            detail: OutcomeDetail::WeightedSum {
                cost_weight: self.cost_weight,
                shortfall_weight: self.shortfall_weight,
            },
            notices: f.notices().to_vec(),
            solved,
        })
    }
}

// =========================================================================
// 3. Goal Programming
// =========================================================================

/// Coverage and cost as equality goals with penalised deviations:
///
/// - `Σx + d_cov⁻ − d_cov⁺ = alpha·D`
/// - `Σ(c_prod·x + c_hold·I) + d_cost⁻ − d_cost⁺ = cost_target`
///
/// Realised cost and service level are reconstructed from the deviations.
#[derive(Debug, Clone)]
pub struct GoalProgramming {
    coverage_weight: f64,
    cost_weight: f64,
    cost_target: f64,
}

impl GoalProgramming {
    pub const NAME: &'static str = "goal-programming";

    pub fn new(coverage_weight: f64, cost_weight: f64, cost_target: f64) -> Self {
        Self {
            coverage_weight,
            cost_weight,
            cost_target,
        }
    }

    /// Goal model whose cost target is the lexicographic optimum times the
    /// configured slack factor.
    pub fn from_phase1_cost(settings: &GoalSettings, phase1_cost: f64) -> Self {
        Self::new(
            settings.coverage_weight,
            settings.cost_weight,
            goal_cost_target(phase1_cost, settings.cost_factor),
        )
    }

    pub fn cost_target(&self) -> f64 {
        self.cost_target
    }
}

impl Scalarizer for GoalProgramming {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parameter(&self) -> Option<f64> {
        Some(self.cost_target)
    }

    fn scalarize(&self, ctx: &PlanningContext<'_>) -> Result<ScalarizationOutcome> {
        let mut f = ctx.build("Goal_Programming")?;
        let cost = f.cost_expr(&ctx.config.costs, false)?;
        let cov_under = f.model.add_nonneg("dev_cov_neg", Domain::Continuous);
        let cov_over = f.model.add_nonneg("dev_cov_pos", Domain::Continuous);
        let cost_under = f.model.add_nonneg("dev_cost_neg", Domain::Continuous);
        let cost_over = f.model.add_nonneg("dev_cost_pos", Domain::Continuous);

        let total_demand = f.total_demand();
        let mut coverage_goal = f.total_production_expr();
        coverage_goal
            .add_term(cov_under, 1.0)
            .add_term(cov_over, -1.0);
        f.model.add_constraint(
            "goal_coverage",
            coverage_goal,
            Comparison::Eq,
            ctx.config.alpha * total_demand,
        );

        let mut cost_goal = cost;
        cost_goal
            .add_term(cost_under, 1.0)
            .add_term(cost_over, -1.0);
        f.model
            .add_constraint("goal_cost", cost_goal, Comparison::Eq, self.cost_target);

        let objective: LinearExpr = [
            (cov_under, self.coverage_weight),
            (cov_over, self.coverage_weight),
            (cost_under, self.cost_weight),
            (cost_over, self.cost_weight),
        ]
        .into_iter()
        .collect();
        f.model.set_objective(Sense::Minimize, objective);

        let model = std::mem::take(&mut f.model);
        let solved = ctx.solve_phase(Self::NAME, 1, model)?;

        let deviations = GoalDeviations {
            coverage_under: solved.value(cov_under),
            coverage_over: solved.value(cov_over),
            cost_under: solved.value(cost_under),
            cost_over: solved.value(cost_over),
            cost_target: self.cost_target,
        };
        let record = PlanRecord {
            cost: realised_goal_cost(&deviations),
            shortfall: deviations.coverage_under,
            service_level: realised_goal_service(&deviations, ctx.config.alpha, total_demand),
            production_plan: f.production_plan(&solved.solution.values),
        };
        info!(
            target = self.cost_target,
            cov_under = deviations.coverage_under,
            cov_over = deviations.coverage_over,
            cost_under = deviations.cost_under,
            cost_over = deviations.cost_over,
            "goal-programming optimum"
        );

        Ok(ScalarizationOutcome {
            strategy: Self::NAME,
            objective_value: solved.solution.objective,
            record,
            detail: OutcomeDetail::GoalProgramming(deviations),
            notices: f.notices().to_vec(),
            solved,
        })
    }
}
