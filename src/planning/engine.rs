// src/planning/engine.rs

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PlanningError, Result};
use crate::model::constraints::BuildNotice;
use crate::model::dataset::PlanningDataset;
use crate::planning::config::{FrontierConfig, PlanningConfig};
use crate::solver::traits::LpSolver;
use crate::strategy::implementations::{GoalProgramming, Lexicographic, WeightedSum};
use crate::strategy::traits::{
    OutcomeDetail, PlanRecord, PlanningContext, ScalarizationOutcome, Scalarizer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Infeasible,
    Timeout,
    Skipped,
}

/// One row of the frontier dataset. Missing numbers are `None`, never
/// NaN or infinity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierRecord {
    pub model_name: String,
    pub parameter: Option<f64>,
    pub cost: Option<f64>,
    pub service_level: Option<f64>,
    pub shortfall: Option<f64>,
    pub status: RunStatus,
}

impl FrontierRecord {
    fn solved(model_name: &str, parameter: Option<f64>, record: &PlanRecord) -> Self {
        Self {
            model_name: model_name.to_string(),
            parameter: parameter.and_then(finite),
            cost: finite(record.cost),
            service_level: finite(record.service_level),
            shortfall: finite(record.shortfall),
            status: RunStatus::Ok,
        }
    }

    fn unsolved(model_name: &str, parameter: Option<f64>, status: RunStatus) -> Self {
        Self {
            model_name: model_name.to_string(),
            parameter: parameter.and_then(finite),
            cost: None,
            service_level: None,
            shortfall: None,
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }

    /// True when `self` is no worse on cost and service and strictly better
    /// on at least one. Rows without both numbers never dominate.
    pub fn dominates(&self, other: &FrontierRecord) -> bool {
        let (Some(c1), Some(s1), Some(c2), Some(s2)) =
            (self.cost, self.service_level, other.cost, other.service_level)
        else {
            return false;
        };
        c1 <= c2 && s1 >= s2 && (c1 < c2 || s1 > s2)
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Everything a frontier run produced.
#[derive(Debug, Clone)]
pub struct Frontier {
    pub records: Vec<FrontierRecord>,
    /// The lexicographic run, when it reached an optimum.
    pub baseline: Option<ScalarizationOutcome>,
    pub notices: Vec<BuildNotice>,
}

impl Frontier {
    /// The non-dominated solved rows, in frontier order. Never applied
    /// implicitly; `records` keeps every sampled point.
    pub fn pareto_efficient(&self) -> Vec<&FrontierRecord> {
        self.records
            .iter()
            .filter(|r| r.is_ok())
            .filter(|r| !self.records.iter().any(|other| other.dominates(r)))
            .collect()
    }

    pub fn successful(&self) -> usize {
        self.records.iter().filter(|r| r.is_ok()).count()
    }
}

/// Runs the lexicographic baseline, the weighted-sum sweep and the optional
/// goal-programming model against one dataset.
#[derive(Debug, Clone, Copy)]
pub struct FrontierRunner<'a> {
    dataset: &'a PlanningDataset,
    planning: &'a PlanningConfig,
    frontier: &'a FrontierConfig,
    solver: &'a dyn LpSolver,
    baseline_reduced_costs: bool,
}

impl<'a> FrontierRunner<'a> {
    pub fn new(
        dataset: &'a PlanningDataset,
        planning: &'a PlanningConfig,
        frontier: &'a FrontierConfig,
        solver: &'a dyn LpSolver,
    ) -> Self {
        Self {
            dataset,
            planning,
            frontier,
            solver,
            baseline_reduced_costs: false,
        }
    }

    /// Attaches reduced costs to the baseline solve so a follow-up
    /// degeneracy analysis can skip its own dual solve.
    pub fn with_baseline_reduced_costs(mut self) -> Self {
        self.baseline_reduced_costs = true;
        self
    }

    /// Data and configuration errors abort the run; a failed solve only
    /// marks its own row.
    pub fn run(&self) -> Result<Frontier> {
        self.planning.validate()?;
        self.frontier.validate()?;
        self.dataset.validate()?;
        let ctx = PlanningContext::new(self.dataset, self.planning, self.solver);
        // every run shares one constraint base, so its notices hold for all rows
        let notices = ctx.build("Frontier")?.notices().to_vec();

        let mut records = Vec::new();

        // 1. Lexicographic baseline
        let baseline_ctx = if self.baseline_reduced_costs {
            ctx.with_reduced_costs()
        } else {
            ctx
        };
        let baseline = run_one(&baseline_ctx, &Lexicographic::new())?;
        let (row, baseline) = match baseline {
            Ok(outcome) => (
                FrontierRecord::solved(Lexicographic::NAME, None, &outcome.record),
                Some(outcome),
            ),
            Err(row) => (row, None),
        };
        records.push(row);

        // 2. Weighted-sum sweep
        let sweep = WeightedSum::sweep(self.frontier);
        let swept: Vec<FrontierRecord> = if self.frontier.parallel {
            sweep
                .par_iter()
                .map(|ws| row_for(&ctx, ws))
                .collect::<Result<_>>()?
        } else {
            sweep
                .iter()
                .map(|ws| row_for(&ctx, ws))
                .collect::<Result<_>>()?
        };
        records.extend(swept);

        // 3. Goal programming, anchored on the baseline cost
        if let Some(settings) = &self.frontier.goal {
            let phase1_cost = baseline.as_ref().and_then(|b| match b.detail {
                OutcomeDetail::Lexicographic { phase1_cost } => Some(phase1_cost),
                _ => None,
            });
            match phase1_cost {
                Some(z1) => {
                    let goal = GoalProgramming::from_phase1_cost(settings, z1);
                    records.push(row_for(&ctx, &goal)?);
                }
                None => {
                    warn!("lexicographic baseline failed, skipping goal programming");
                    records.push(FrontierRecord::unsolved(
                        GoalProgramming::NAME,
                        None,
                        RunStatus::Skipped,
                    ));
                }
            }
        }

        records.sort_by(frontier_order);
        for r in &records {
            info!(
                model = %r.model_name,
                parameter = ?r.parameter,
                cost = ?r.cost,
                service = ?r.service_level,
                status = ?r.status,
                "frontier row"
            );
        }

        Ok(Frontier {
            records,
            baseline,
            notices,
        })
    }
}

/// Outer error: fatal for the run. Inner error: the failed row.
fn run_one(
    ctx: &PlanningContext<'_>,
    scalarizer: &dyn Scalarizer,
) -> Result<std::result::Result<ScalarizationOutcome, FrontierRecord>> {
    match scalarizer.scalarize(ctx) {
        Ok(outcome) => Ok(Ok(outcome)),
        Err(err) if err.is_solve_time() => {
            warn!(strategy = scalarizer.name(), error = %err, "run failed");
            let status = match err {
                PlanningError::SolveTimeout { .. } => RunStatus::Timeout,
                _ => RunStatus::Infeasible,
            };
            Ok(Err(FrontierRecord::unsolved(
                scalarizer.name(),
                scalarizer.parameter(),
                status,
            )))
        }
        Err(err) => Err(err),
    }
}

fn row_for(ctx: &PlanningContext<'_>, scalarizer: &dyn Scalarizer) -> Result<FrontierRecord> {
    Ok(match run_one(ctx, scalarizer)? {
        Ok(outcome) => {
            FrontierRecord::solved(scalarizer.name(), scalarizer.parameter(), &outcome.record)
        }
        Err(row) => row,
    })
}

fn strategy_rank(model_name: &str) -> u8 {
    match model_name {
        Lexicographic::NAME => 0,
        WeightedSum::NAME => 1,
        GoalProgramming::NAME => 2,
        _ => 3,
    }
}

fn frontier_order(a: &FrontierRecord, b: &FrontierRecord) -> Ordering {
    strategy_rank(&a.model_name)
        .cmp(&strategy_rank(&b.model_name))
        .then_with(|| {
            a.parameter
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&b.parameter.unwrap_or(f64::NEG_INFINITY))
        })
}
