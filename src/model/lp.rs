// src/model/lp.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solver::traits::{Solution, SolveStatus};

/// Handle to a variable inside one `LinearModel`.
///
/// Handles are plain indices; they are only meaningful for the model that
/// created them and for models derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Continuous,
    Integer,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub domain: Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// `Σ coeff·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    pub fn add_expr(&mut self, other: &LinearExpr, scale: f64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|&(var, coeff)| (var, coeff * scale)));
        self.constant += other.constant * scale;
        self
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = LinearExpr::new();
        out.add_expr(self, factor);
        out
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Terms with repeated variables merged and zero coefficients dropped,
    /// ordered by variable index.
    pub fn merged_terms(&self) -> Vec<(VarId, f64)> {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for &(var, coeff) in &self.terms {
            *merged.entry(var).or_insert(0.0) += coeff;
        }
        merged.into_iter().filter(|&(_, c)| c != 0.0).collect()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

/// `expr cmp rhs`, with any expression constant already folded into `rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

#[derive(Debug, Clone)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            sense: Sense::Minimize,
            expr: LinearExpr::new(),
        }
    }
}

/// Variables, constraints and objective of one linear program.
///
/// Backends receive it read-only; derived models (locked optimum, sampling
/// objectives) are new values, never in-place edits of a solved model.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl LinearModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    pub fn var_ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.variables.len()).map(VarId)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn has_integer_vars(&self) -> bool {
        self.variables.iter().any(|v| v.domain == Domain::Integer)
    }

    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        (lower, upper): (f64, f64),
        domain: Domain,
    ) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
            domain,
        });
        id
    }

    /// Adds a `[0, ∞)` variable.
    pub fn add_nonneg(&mut self, name: impl Into<String>, domain: Domain) -> VarId {
        self.add_var(name, (0.0, f64::INFINITY), domain)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) {
        let rhs = rhs - expr.constant;
        let expr = LinearExpr {
            terms: expr.terms,
            constant: 0.0,
        };
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    pub fn set_objective(&mut self, sense: Sense, expr: LinearExpr) {
        self.objective = Objective { sense, expr };
    }

    /// A copy of this model optimising `expr` instead.
    pub fn with_objective(&self, sense: Sense, expr: LinearExpr) -> Self {
        let mut variant = self.clone();
        variant.set_objective(sense, expr);
        variant
    }

    /// A copy of this model whose current objective is held within `delta`
    /// of `optimum`.
    ///
    /// One-sided locks bound only the worsening direction; two-sided locks
    /// add the opposite bound as well.
    pub fn lock_objective(&self, optimum: f64, delta: f64, two_sided: bool) -> Self {
        let mut locked = self.clone();
        locked.name = format!("{}_locked", self.name);
        let expr = self.objective.expr.clone();
        let (worse, better) = match self.objective.sense {
            Sense::Minimize => (
                (Comparison::Le, optimum + delta),
                (Comparison::Ge, optimum - delta),
            ),
            Sense::Maximize => (
                (Comparison::Ge, optimum - delta),
                (Comparison::Le, optimum + delta),
            ),
        };
        locked.add_constraint("lock_optimum", expr.clone(), worse.0, worse.1);
        if two_sided {
            locked.add_constraint("lock_optimum_band", expr, better.0, better.1);
        }
        locked
    }

    /// Checks every constraint and bound against `values` within `tol`.
    pub fn is_feasible(&self, values: &[f64], tol: f64) -> bool {
        let bounds_ok = self
            .variables
            .iter()
            .zip(values)
            .all(|(v, &x)| x >= v.lower - tol && x <= v.upper + tol);
        bounds_ok
            && self.constraints.iter().all(|c| {
                let lhs = c.expr.evaluate(values);
                match c.cmp {
                    Comparison::Le => lhs <= c.rhs + tol,
                    Comparison::Ge => lhs >= c.rhs - tol,
                    Comparison::Eq => (lhs - c.rhs).abs() <= tol,
                }
            })
    }
}

impl fmt::Display for LinearModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} vars, {} constraints)",
            self.name,
            self.variables.len(),
            self.constraints.len()
        )
    }
}

/// A model together with the result of solving it exactly once.
#[derive(Debug, Clone)]
pub struct SolvedModel {
    pub model: LinearModel,
    pub solution: Solution,
}

impl SolvedModel {
    pub fn is_optimal(&self) -> bool {
        self.solution.status == SolveStatus::Optimal
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.solution.values[var.index()]
    }

    pub fn evaluate(&self, expr: &LinearExpr) -> f64 {
        expr.evaluate(&self.solution.values)
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.model.variable(var).name
    }
}
