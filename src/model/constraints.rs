// src/model/constraints.rs

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::dataset::{Period, PlanningDataset, Sku};
use crate::model::lp::{Comparison, Domain, LinearExpr, LinearModel, VarId};
use crate::model::plan::ProductionPlan;
use crate::planning::config::CostParameters;

/// Informational signals raised while building the feasible region.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildNotice {
    /// No capacity was supplied for `period`; `Σ_p (D + SST)` was used.
    CapacityFallbackApplied { period: Period, capacity: f64 },
}

/// Assembles the objective-independent part of every planning model:
/// inventory balance, safety stock and capacity over `x[p,t]` and `I[p,t]`.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintBuilder<'a> {
    dataset: &'a PlanningDataset,
    domain: Domain,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(dataset: &'a PlanningDataset) -> Self {
        Self {
            dataset,
            domain: Domain::Continuous,
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    /// Builds a fresh model named `name`. Each call yields an independent
    /// variable set.
    pub fn build(&self, name: &str) -> Result<PlanningFormulation> {
        let data = self.dataset;
        data.validate()?;

        let products = data.products().to_vec();
        let periods = data.periods().to_vec();

        let grid = |read: &dyn Fn(&Sku, &Period) -> Option<f64>| -> Vec<Vec<f64>> {
            products
                .iter()
                .map(|p| periods.iter().map(|t| read(p, t).unwrap_or(0.0)).collect())
                .collect()
        };
        // validate() guarantees D and SST are complete; EEX defaults to 0.
        let demand = grid(&|p: &Sku, t: &Period| data.demand(p, t));
        let safety_stock = grid(&|p: &Sku, t: &Period| data.safety_stock(p, t));
        let excess = grid(&|p: &Sku, t: &Period| data.excess_inventory(p, t));

        let mut notices = Vec::new();
        let capacity: Vec<f64> = periods
            .iter()
            .enumerate()
            .map(|(k, t)| match data.capacity(t) {
                Some(cap) => cap,
                None => {
                    let fallback: f64 = (0..products.len())
                        .map(|i| demand[i][k] + safety_stock[i][k])
                        .sum();
                    warn!(period = %t, capacity = fallback, "capacity missing, using demand + safety stock");
                    notices.push(BuildNotice::CapacityFallbackApplied {
                        period: t.clone(),
                        capacity: fallback,
                    });
                    fallback
                }
            })
            .collect();

        let mut model = LinearModel::new(name);
        let mut production = Vec::with_capacity(products.len());
        let mut inventory = Vec::with_capacity(products.len());
        for p in &products {
            production.push(
                periods
                    .iter()
                    .map(|t| model.add_nonneg(format!("x[{p},{t}]"), self.domain))
                    .collect::<Vec<_>>(),
            );
            inventory.push(
                periods
                    .iter()
                    .map(|t| model.add_nonneg(format!("I[{p},{t}]"), self.domain))
                    .collect::<Vec<_>>(),
            );
        }

        for (i, p) in products.iter().enumerate() {
            for (k, t) in periods.iter().enumerate() {
                // x[p,t] + I[p,t-1] - I[p,t] = D[p,t]
                let mut balance = LinearExpr::term(production[i][k], 1.0);
                balance.add_term(inventory[i][k], -1.0);
                if k > 0 {
                    balance.add_term(inventory[i][k - 1], 1.0);
                }
                model.add_constraint(
                    format!("balance[{p},{t}]"),
                    balance,
                    Comparison::Eq,
                    demand[i][k],
                );
                model.add_constraint(
                    format!("safety[{p},{t}]"),
                    LinearExpr::term(inventory[i][k], 1.0),
                    Comparison::Ge,
                    safety_stock[i][k],
                );
            }
        }
        for (k, t) in periods.iter().enumerate() {
            let load: LinearExpr = production.iter().map(|row| (row[k], 1.0)).collect();
            model.add_constraint(format!("capacity[{t}]"), load, Comparison::Le, capacity[k]);
        }

        debug!(
            model = name,
            skus = products.len(),
            periods = periods.len(),
            constraints = model.constraints().len(),
            "built constraint base"
        );

        Ok(PlanningFormulation {
            model,
            products,
            periods,
            production,
            inventory,
            demand,
            safety_stock,
            excess,
            capacity,
            notices,
        })
    }
}

/// The shared feasible region plus handles to its decision variables.
///
/// Scalarizers add their own variables, goals and objective to `model`
/// before handing it to a solver.
#[derive(Debug, Clone)]
pub struct PlanningFormulation {
    pub model: LinearModel,
    products: Vec<Sku>,
    periods: Vec<Period>,
    production: Vec<Vec<VarId>>,
    inventory: Vec<Vec<VarId>>,
    demand: Vec<Vec<f64>>,
    safety_stock: Vec<Vec<f64>>,
    excess: Vec<Vec<f64>>,
    capacity: Vec<f64>,
    notices: Vec<BuildNotice>,
}

impl PlanningFormulation {
    pub fn products(&self) -> &[Sku] {
        &self.products
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// `x[p,t]` by SKU and period index.
    pub fn production(&self, p: usize, t: usize) -> VarId {
        self.production[p][t]
    }

    /// `I[p,t]` by SKU and period index.
    pub fn inventory(&self, p: usize, t: usize) -> VarId {
        self.inventory[p][t]
    }

    pub fn demand(&self, p: usize, t: usize) -> f64 {
        self.demand[p][t]
    }

    pub fn safety_stock(&self, p: usize, t: usize) -> f64 {
        self.safety_stock[p][t]
    }

    /// Effective capacity per period, fallbacks included.
    pub fn capacity(&self) -> &[f64] {
        &self.capacity
    }

    pub fn notices(&self) -> &[BuildNotice] {
        &self.notices
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.iter().flatten().sum()
    }

    /// `Σ_{p,t} x[p,t]`.
    pub fn total_production_expr(&self) -> LinearExpr {
        self.production
            .iter()
            .flatten()
            .map(|&x| (x, 1.0))
            .collect()
    }

    /// `Σ c_prod·x + c_hold·I`, plus the constant `Σ c_exc·EEX` when
    /// `include_excess` is set.
    pub fn cost_expr(&self, costs: &CostParameters, include_excess: bool) -> Result<LinearExpr> {
        let mut expr = LinearExpr::new();
        for (i, sku) in self.products.iter().enumerate() {
            let c_prod = costs.production(sku)?;
            let c_hold = costs.holding(sku)?;
            let c_exc = if include_excess { costs.excess(sku)? } else { 0.0 };
            for k in 0..self.periods.len() {
                expr.add_term(self.production[i][k], c_prod)
                    .add_term(self.inventory[i][k], c_hold)
                    .add_constant(c_exc * self.excess[i][k]);
            }
        }
        Ok(expr)
    }

    /// Sparse plan read off a solved value vector.
    pub fn production_plan(&self, values: &[f64]) -> ProductionPlan {
        ProductionPlan::from_quantities(self.products.iter().enumerate().flat_map(|(i, sku)| {
            self.periods
                .iter()
                .enumerate()
                .map(move |(k, t)| (sku.clone(), t.clone(), values[self.production[i][k].index()]))
        }))
    }
}
