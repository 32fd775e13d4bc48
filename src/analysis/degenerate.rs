// src/analysis/degenerate.rs

use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PlanningError, Result};
use crate::model::lp::{LinearExpr, LinearModel, Sense, SolvedModel, VarId};
use crate::planning::config::AnalysisSettings;
use crate::solver::traits::{LpSolver, SolveOptions};

/// A variable at zero whose reduced cost is also zero: it can enter the
/// basis without changing the objective, so the optimum is not unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeVariable {
    #[serde(skip)]
    pub var: VarId,
    pub name: String,
    pub value: f64,
    pub reduced_cost: f64,
}

/// One optimal vertex reached by one directional re-solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceVertex {
    pub axis: String,
    pub values: Vec<f64>,
}

/// A directional re-solve that failed; nothing is recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InconclusiveAxis {
    pub axis: String,
    pub reason: String,
}

impl InconclusiveAxis {
    pub fn to_error(&self) -> PlanningError {
        PlanningError::DegenerateAnalysisInconclusive {
            axis: self.axis.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Vertices found by one exploration pass plus the re-solves that failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FaceExploration {
    pub vertices: Vec<FaceVertex>,
    pub inconclusive: Vec<InconclusiveAxis>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DegeneracyReport {
    pub model_name: String,
    pub unique: bool,
    pub free_variables: Vec<FreeVariable>,
    pub extreme_points: Vec<FaceVertex>,
    pub samples: Vec<FaceVertex>,
    pub inconclusive: Vec<InconclusiveAxis>,
}

impl DegeneracyReport {
    pub fn free_variable_names(&self) -> Vec<&str> {
        self.free_variables.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Post-optimality checks on a solved model.
///
/// Every re-solve runs on a fresh model derived from the locked optimum; the
/// analysed model is never touched.
#[derive(Debug, Clone)]
pub struct DegeneracyAnalyzer<'a> {
    solver: &'a dyn LpSolver,
    settings: AnalysisSettings,
    timeout: Option<Duration>,
}

impl<'a> DegeneracyAnalyzer<'a> {
    pub fn new(solver: &'a dyn LpSolver, settings: AnalysisSettings) -> Self {
        Self {
            solver,
            settings,
            timeout: None,
        }
    }

    /// Budget applied to every directional re-solve.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Variables with `|value| < tol` and `|reduced cost| < tol`.
    ///
    /// When the solution carries no reduced costs the model is re-solved
    /// asking for them, and that solution is the one inspected.
    pub fn free_variables(&self, solved: &SolvedModel) -> Result<Vec<FreeVariable>> {
        let resolved;
        let solution = match solved.solution.reduced_costs {
            Some(_) => &solved.solution,
            None => {
                resolved = self.solver.solve(
                    &solved.model,
                    &SolveOptions::with_timeout(self.timeout).reduced_costs(),
                )?;
                &resolved
            }
        };
        let Some(reduced_costs) = solution.reduced_costs.as_ref() else {
            return Err(PlanningError::ReducedCostsUnavailable(
                self.solver.name().to_string(),
            ));
        };

        let tol = self.settings.tolerance;
        let free: Vec<FreeVariable> = solved
            .model
            .var_ids()
            .filter_map(|var| {
                let value = solution.values[var.index()];
                let reduced_cost = reduced_costs[var.index()];
                (value.abs() < tol && reduced_cost.abs() < tol).then(|| FreeVariable {
                    var,
                    name: solved.var_name(var).to_string(),
                    value,
                    reduced_cost,
                })
            })
            .collect();

        debug!(model = solved.model.name(), free = free.len(), "free variable scan");
        Ok(free)
    }

    /// A copy of the solved model with its objective held at the optimum.
    pub fn lock_optimum(&self, solved: &SolvedModel) -> LinearModel {
        solved.model.lock_objective(
            solved.solution.objective,
            self.settings.delta,
            self.settings.two_sided_lock,
        )
    }

    /// Monte-Carlo sketch of the optimal face: maximises random combinations
    /// of the free variables over the locked optimum.
    ///
    /// Vertices are deduplicated on the first two free coordinates rounded
    /// to six decimals.
    pub fn sample_face(&self, solved: &SolvedModel, free: &[FreeVariable]) -> FaceExploration {
        let mut out = FaceExploration::default();
        if free.is_empty() {
            return out;
        }

        let locked = self.lock_optimum(solved);
        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let key_vars: Vec<VarId> = free.iter().take(2).map(|f| f.var).collect();
        let mut seen = HashSet::new();

        for i in 0..self.settings.samples {
            let direction: LinearExpr = free
                .iter()
                .map(|f| (f.var, rng.sample::<f64, _>(StandardNormal)))
                .collect();
            let axis = format!("sample {i}");
            let Some(values) = self.push_toward(&locked, Sense::Maximize, direction, &axis, &mut out)
            else {
                continue;
            };
            let key: Vec<i64> = key_vars.iter().map(|v| rounded(values[v.index()])).collect();
            if seen.insert(key) {
                out.vertices.push(FaceVertex { axis, values });
            }
        }

        info!(
            model = solved.model.name(),
            samples = self.settings.samples,
            distinct = out.vertices.len(),
            "face sampling done"
        );
        out
    }

    /// Maximises then minimises each free variable over the locked optimum.
    /// Identical vertices are reported once.
    pub fn extreme_points(&self, solved: &SolvedModel, free: &[FreeVariable]) -> FaceExploration {
        let mut out = FaceExploration::default();
        let locked = self.lock_optimum(solved);
        let mut seen = HashSet::new();

        for f in free {
            for (sense, label) in [(Sense::Maximize, "max"), (Sense::Minimize, "min")] {
                let axis = format!("{label} {}", f.name);
                let direction = LinearExpr::term(f.var, 1.0);
                let Some(values) = self.push_toward(&locked, sense, direction, &axis, &mut out) else {
                    continue;
                };
                let key: Vec<i64> = values.iter().map(|&v| rounded(v)).collect();
                if seen.insert(key) {
                    out.vertices.push(FaceVertex { axis, values });
                }
            }
        }
        out
    }

    /// Free-variable scan followed by both explorations when the optimum is
    /// not unique.
    pub fn analyze(&self, solved: &SolvedModel) -> Result<DegeneracyReport> {
        let free_variables = self.free_variables(solved)?;
        let unique = free_variables.is_empty();

        let (extreme, sampled) = if unique {
            (FaceExploration::default(), FaceExploration::default())
        } else {
            (
                self.extreme_points(solved, &free_variables),
                self.sample_face(solved, &free_variables),
            )
        };

        let mut inconclusive = extreme.inconclusive;
        inconclusive.extend(sampled.inconclusive);

        info!(
            model = solved.model.name(),
            unique,
            free = free_variables.len(),
            extreme_points = extreme.vertices.len(),
            inconclusive = inconclusive.len(),
            "degeneracy analysis"
        );

        Ok(DegeneracyReport {
            model_name: solved.model.name().to_string(),
            unique,
            free_variables,
            extreme_points: extreme.vertices,
            samples: sampled.vertices,
            inconclusive,
        })
    }

    fn push_toward(
        &self,
        locked: &LinearModel,
        sense: Sense,
        direction: LinearExpr,
        axis: &str,
        out: &mut FaceExploration,
    ) -> Option<Vec<f64>> {
        let directed = locked.with_objective(sense, direction);
        let outcome = self
            .solver
            .solve(&directed, &SolveOptions::with_timeout(self.timeout));
        let reason = match outcome {
            Ok(solution) if solution.is_optimal() => return Some(solution.values),
            Ok(solution) => format!("re-solve ended with status {}", solution.status),
            Err(err) => err.to_string(),
        };
        warn!(axis, %reason, "face direction inconclusive");
        out.inconclusive.push(InconclusiveAxis {
            axis: axis.to_string(),
            reason,
        });
        None
    }
}

fn rounded(value: f64) -> i64 {
    (value * 1e6).round() as i64
}
