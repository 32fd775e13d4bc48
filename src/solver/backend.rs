// src/solver/backend.rs

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use microlp::{ComparisonOp, OptimizationDirection, Problem};
use tracing::{debug, warn};

use crate::error::{PlanningError, Result};
use crate::model::lp::{Comparison, Domain, LinearModel, Sense};
use crate::solver::traits::{LpSolver, Solution, SolveOptions, SolveStatus};

/// Solve primitive backed by the pure-Rust `microlp` simplex.
///
/// Reduced costs come from a second, explicit dual LP and are only
/// available for continuous models.
#[derive(Debug, Clone, Default)]
pub struct MicrolpSolver;

impl MicrolpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl LpSolver for MicrolpSolver {
    fn solve(&self, model: &LinearModel, options: &SolveOptions) -> Result<Solution> {
        let want_reduced_costs = options.reduced_costs;
        let Some(limit) = options.timeout else {
            return Ok(guarded_solve(model, want_reduced_costs));
        };

        // The worker is detached on expiry; microlp has no cancellation hook.
        let (tx, rx) = mpsc::channel();
        let owned = model.clone();
        thread::spawn(move || {
            let _ = tx.send(guarded_solve(&owned, want_reduced_costs));
        });

        match rx.recv_timeout(limit) {
            Ok(solution) => Ok(solution),
            Err(RecvTimeoutError::Timeout) => Err(PlanningError::SolveTimeout {
                model: model.name().to_string(),
                limit,
            }),
            Err(RecvTimeoutError::Disconnected) => {
                warn!(model = model.name(), "solver worker exited without a result");
                Ok(Solution::failed(SolveStatus::Error))
            }
        }
    }

    fn name(&self) -> &str {
        "microlp"
    }
}

fn guarded_solve(model: &LinearModel, want_reduced_costs: bool) -> Solution {
    panic::catch_unwind(AssertUnwindSafe(|| solve_blocking(model, want_reduced_costs)))
        .unwrap_or_else(|_| {
            warn!(model = model.name(), "microlp panicked");
            Solution::failed(SolveStatus::Error)
        })
}

fn solve_blocking(model: &LinearModel, want_reduced_costs: bool) -> Solution {
    let direction = match model.objective().sense {
        Sense::Minimize => OptimizationDirection::Minimize,
        Sense::Maximize => OptimizationDirection::Maximize,
    };
    let obj = objective_coefficients(model);

    let mut problem = Problem::new(direction);
    let vars: Vec<microlp::Variable> = model
        .variables()
        .iter()
        .zip(&obj)
        .map(|(v, &c)| match v.domain {
            Domain::Continuous => problem.add_var(c, (v.lower, v.upper)),
            Domain::Integer => problem.add_integer_var(c, (int_bound(v.lower), int_bound(v.upper))),
        })
        .collect();

    for c in model.constraints() {
        let terms = c.expr.merged_terms();
        if terms.is_empty() {
            if !holds(c.cmp, 0.0, c.rhs) {
                debug!(model = model.name(), row = %c.name, "empty row cannot hold");
                return Solution::failed(SolveStatus::Infeasible);
            }
            continue;
        }
        let expr: microlp::LinearExpr = terms
            .into_iter()
            .map(|(v, k)| (vars[v.index()], k))
            .collect();
        problem.add_constraint(expr, comparison_op(c.cmp), c.rhs);
    }

    match problem.solve() {
        Ok(solved) => {
            let values: Vec<f64> = vars.iter().map(|&v| solved[v]).collect();
            let objective = solved.objective() + model.objective().expr.constant_term();
            let reduced_costs = if want_reduced_costs {
                reduced_costs(model, &obj)
            } else {
                None
            };
            Solution {
                status: SolveStatus::Optimal,
                objective,
                values,
                reduced_costs,
            }
        }
        Err(microlp::Error::Infeasible) => Solution::failed(SolveStatus::Infeasible),
        Err(microlp::Error::Unbounded) => Solution::failed(SolveStatus::Unbounded),
        Err(microlp::Error::InternalError(message)) => {
            warn!(model = model.name(), %message, "microlp internal error");
            Solution::failed(SolveStatus::Error)
        }
    }
}

fn objective_coefficients(model: &LinearModel) -> Vec<f64> {
    let mut obj = vec![0.0; model.variables().len()];
    for (var, coeff) in model.objective().expr.merged_terms() {
        obj[var.index()] = coeff;
    }
    obj
}

fn comparison_op(cmp: Comparison) -> ComparisonOp {
    match cmp {
        Comparison::Le => ComparisonOp::Le,
        Comparison::Ge => ComparisonOp::Ge,
        Comparison::Eq => ComparisonOp::Eq,
    }
}

fn holds(cmp: Comparison, lhs: f64, rhs: f64) -> bool {
    match cmp {
        Comparison::Le => lhs <= rhs,
        Comparison::Ge => lhs >= rhs,
        Comparison::Eq => lhs == rhs,
    }
}

fn int_bound(value: f64) -> i32 {
    if value.is_finite() {
        value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    } else if value > 0.0 {
        i32::MAX
    } else {
        i32::MIN
    }
}

/// One row of the primal after shifting every variable to `x = l + x'`.
struct ShiftedRow {
    terms: Vec<(usize, f64)>,
    cmp: Comparison,
    rhs: f64,
    /// Upper-bound rows contribute bound duals, which are not part of the
    /// reported reduced cost.
    bound_row: bool,
}

/// Reduced costs `d = c − Aᵀy` in minimisation form.
///
/// `y` is an optimal solution of the dual of
/// `min c'x', rows(x') {≤,=,≥} b', x' ≥ 0`.
fn reduced_costs(model: &LinearModel, obj: &[f64]) -> Option<Vec<f64>> {
    if model.has_integer_vars() {
        return None;
    }
    if model.variables().iter().any(|v| !v.lower.is_finite()) {
        debug!(model = model.name(), "free variables present, skipping dual");
        return None;
    }

    let sign = match model.objective().sense {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };
    let cost: Vec<f64> = obj.iter().map(|c| sign * c).collect();
    let lower: Vec<f64> = model.variables().iter().map(|v| v.lower).collect();

    let mut rows: Vec<ShiftedRow> = model
        .constraints()
        .iter()
        .filter_map(|c| {
            let terms: Vec<(usize, f64)> = c
                .expr
                .merged_terms()
                .into_iter()
                .map(|(v, a)| (v.index(), a))
                .collect();
            if terms.is_empty() {
                return None;
            }
            let shift: f64 = terms.iter().map(|&(j, a)| a * lower[j]).sum();
            Some(ShiftedRow {
                terms,
                cmp: c.cmp,
                rhs: c.rhs - shift,
                bound_row: false,
            })
        })
        .collect();
    for (j, v) in model.variables().iter().enumerate() {
        if v.upper.is_finite() {
            rows.push(ShiftedRow {
                terms: vec![(j, 1.0)],
                cmp: Comparison::Le,
                rhs: v.upper - v.lower,
                bound_row: true,
            });
        }
    }
    if rows.is_empty() {
        return Some(cost);
    }

    let mut dual = Problem::new(OptimizationDirection::Maximize);
    let ys: Vec<microlp::Variable> = rows
        .iter()
        .map(|row| {
            let bounds = match row.cmp {
                Comparison::Ge => (0.0, f64::INFINITY),
                Comparison::Le => (f64::NEG_INFINITY, 0.0),
                Comparison::Eq => (f64::NEG_INFINITY, f64::INFINITY),
            };
            dual.add_var(row.rhs, bounds)
        })
        .collect();

    let mut columns: Vec<Vec<(microlp::Variable, f64)>> = vec![Vec::new(); cost.len()];
    for (row, &y) in rows.iter().zip(&ys) {
        for &(j, a) in &row.terms {
            columns[j].push((y, a));
        }
    }
    for (j, column) in columns.into_iter().enumerate() {
        if column.is_empty() {
            continue;
        }
        let expr: microlp::LinearExpr = column.into_iter().collect();
        dual.add_constraint(expr, ComparisonOp::Le, cost[j]);
    }

    let solved = match dual.solve() {
        Ok(solved) => solved,
        Err(err) => {
            warn!(model = model.name(), error = %err, "dual solve failed; no reduced costs");
            return None;
        }
    };

    let mut reduced = cost;
    for (row, &y) in rows.iter().zip(&ys) {
        if row.bound_row {
            continue;
        }
        let price = solved[y];
        for &(j, a) in &row.terms {
            reduced[j] -= a * price;
        }
    }
    Some(reduced)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::lp::LinearExpr;

    fn small_max() -> LinearModel {
        // max x + 2y, x + y <= 4, 2x + y >= 2, y <= 3
        let mut model = LinearModel::new("small");
        let x = model.add_nonneg("x", Domain::Continuous);
        let y = model.add_var("y", (0.0, 3.0), Domain::Continuous);
        model.add_constraint(
            "cap",
            [(x, 1.0), (y, 1.0)].into_iter().collect(),
            Comparison::Le,
            4.0,
        );
        model.add_constraint(
            "floor",
            [(x, 2.0), (y, 1.0)].into_iter().collect(),
            Comparison::Ge,
            2.0,
        );
        let mut obj = LinearExpr::new();
        obj.add_term(x, 1.0).add_term(y, 2.0).add_constant(0.5);
        model.set_objective(Sense::Maximize, obj);
        model
    }

    #[test]
    fn solves_and_adds_objective_constant() {
        let solution = MicrolpSolver::new()
            .solve(&small_max(), &SolveOptions::default())
            .unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!((solution.objective - 7.5).abs() < 1e-9);
        assert!((solution.values[0] - 1.0).abs() < 1e-9);
        assert!((solution.values[1] - 3.0).abs() < 1e-9);
        assert!(solution.reduced_costs.is_none());
    }

    #[test]
    fn reports_infeasible_status() {
        let mut model = LinearModel::new("infeasible");
        let x = model.add_nonneg("x", Domain::Continuous);
        model.add_constraint("lo", LinearExpr::term(x, 1.0), Comparison::Ge, 5.0);
        model.add_constraint("hi", LinearExpr::term(x, 1.0), Comparison::Le, 1.0);

        let solution = MicrolpSolver::new()
            .solve(&model, &SolveOptions::default())
            .unwrap();
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn reports_unbounded_status() {
        let mut model = LinearModel::new("unbounded");
        let x = model.add_nonneg("x", Domain::Continuous);
        model.add_constraint("lo", LinearExpr::term(x, 1.0), Comparison::Ge, 1.0);
        model.set_objective(Sense::Maximize, LinearExpr::term(x, 1.0));

        let solution = MicrolpSolver::new()
            .solve(&model, &SolveOptions::default())
            .unwrap();
        assert_eq!(solution.status, SolveStatus::Unbounded);
    }

    #[test]
    fn reduced_costs_flag_tied_variables() {
        // min x + y + 2z, x + y + z >= 3: x and y tie, z costs 1 more.
        let mut model = LinearModel::new("tie");
        let x = model.add_nonneg("x", Domain::Continuous);
        let y = model.add_nonneg("y", Domain::Continuous);
        let z = model.add_nonneg("z", Domain::Continuous);
        model.add_constraint(
            "cover",
            [(x, 1.0), (y, 1.0), (z, 1.0)].into_iter().collect(),
            Comparison::Ge,
            3.0,
        );
        model.set_objective(
            Sense::Minimize,
            [(x, 1.0), (y, 1.0), (z, 2.0)].into_iter().collect(),
        );

        let solution = MicrolpSolver::new()
            .solve(&model, &SolveOptions::default().reduced_costs())
            .unwrap();
        let rc = solution.reduced_costs.expect("continuous model has duals");

        assert!((solution.objective - 3.0).abs() < 1e-9);
        assert!(rc[0].abs() < 1e-9);
        assert!(rc[1].abs() < 1e-9);
        assert!((rc[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn integer_models_round_and_skip_duals() {
        let mut model = LinearModel::new("int");
        let x = model.add_nonneg("x", Domain::Integer);
        model.add_constraint("lo", LinearExpr::term(x, 2.0), Comparison::Ge, 3.0);
        model.set_objective(Sense::Minimize, LinearExpr::term(x, 1.0));

        let solution = MicrolpSolver::new()
            .solve(&model, &SolveOptions::default().reduced_costs())
            .unwrap();
        assert!((solution.values[0] - 2.0).abs() < 1e-6);
        assert!(solution.reduced_costs.is_none());
    }

    #[test]
    fn generous_timeout_returns_the_solution() {
        let options = SolveOptions::with_timeout(Some(Duration::from_secs(30)));
        let solution = MicrolpSolver::new().solve(&small_max(), &options).unwrap();
        assert!(solution.is_optimal());
    }

    #[test]
    fn expired_budget_is_a_timeout_error() {
        // a chain long enough that the worker cannot beat a zero budget
        let mut model = LinearModel::new("chain");
        let vars: Vec<_> = (0..400)
            .map(|i| model.add_nonneg(format!("v{i}"), Domain::Continuous))
            .collect();
        for pair in vars.windows(2) {
            model.add_constraint(
                "step",
                [(pair[1], 1.0), (pair[0], -1.0)].into_iter().collect(),
                Comparison::Ge,
                1.0,
            );
        }
        model.set_objective(Sense::Minimize, vars.iter().map(|&v| (v, 1.0)).collect());

        let options = SolveOptions::with_timeout(Some(Duration::ZERO));
        let err = MicrolpSolver::new().solve(&model, &options).unwrap_err();

        match err {
            PlanningError::SolveTimeout { model, limit } => {
                assert_eq!(model, "chain");
                assert_eq!(limit, Duration::ZERO);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
