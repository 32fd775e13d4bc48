// src/model/dataset.rs

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlanningError, Result};

/// Stock-keeping unit identifier. Opaque; no ordering significance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(pub String);

/// Planning period identifier. Chronology comes from the dataset's period
/// list, never from the identifier itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub String);

impl From<&str> for Sku {
    fn from(value: &str) -> Self {
        Sku(value.to_string())
    }
}

impl From<String> for Sku {
    fn from(value: String) -> Self {
        Sku(value)
    }
}

impl From<&str> for Period {
    fn from(value: &str) -> Self {
        Period(value.to_string())
    }
}

impl From<String> for Period {
    fn from(value: String) -> Self {
        Period(value)
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized per-SKU, per-period planning inputs.
///
/// Produced by the ingestion layer. Periods are kept in the order they were
/// given; that order drives the inventory chaining.
#[derive(Debug, Clone, Default)]
pub struct PlanningDataset {
    products: Vec<Sku>,
    periods: Vec<Period>,
    demand: HashMap<(Sku, Period), f64>,
    safety_stock: HashMap<(Sku, Period), f64>,
    excess_inventory: HashMap<(Sku, Period), f64>,
    capacity: HashMap<Period, f64>,
}

impl PlanningDataset {
    pub fn new<P, T>(products: impl IntoIterator<Item = P>, periods: impl IntoIterator<Item = T>) -> Self
    where
        P: Into<Sku>,
        T: Into<Period>,
    {
        Self {
            products: products.into_iter().map(Into::into).collect(),
            periods: periods.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn set_demand(&mut self, sku: impl Into<Sku>, period: impl Into<Period>, value: f64) -> &mut Self {
        self.demand.insert((sku.into(), period.into()), value);
        self
    }

    pub fn set_safety_stock(
        &mut self,
        sku: impl Into<Sku>,
        period: impl Into<Period>,
        value: f64,
    ) -> &mut Self {
        self.safety_stock.insert((sku.into(), period.into()), value);
        self
    }

    pub fn set_excess_inventory(
        &mut self,
        sku: impl Into<Sku>,
        period: impl Into<Period>,
        value: f64,
    ) -> &mut Self {
        self.excess_inventory.insert((sku.into(), period.into()), value);
        self
    }

    pub fn set_capacity(&mut self, period: impl Into<Period>, value: f64) -> &mut Self {
        self.capacity.insert(period.into(), value);
        self
    }

    pub fn products(&self) -> &[Sku] {
        &self.products
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn demand(&self, sku: &Sku, period: &Period) -> Option<f64> {
        lookup(&self.demand, sku, period)
    }

    pub fn safety_stock(&self, sku: &Sku, period: &Period) -> Option<f64> {
        lookup(&self.safety_stock, sku, period)
    }

    pub fn excess_inventory(&self, sku: &Sku, period: &Period) -> Option<f64> {
        lookup(&self.excess_inventory, sku, period)
    }

    pub fn capacity(&self, period: &Period) -> Option<f64> {
        self.capacity.get(period).copied()
    }

    /// Σ D[p,t] over the planning grid.
    pub fn total_demand(&self) -> f64 {
        self.products
            .iter()
            .flat_map(|p| self.periods.iter().map(move |t| (p, t)))
            .filter_map(|(p, t)| self.demand(p, t))
            .sum()
    }

    /// Fails fast on anything the constraint builder cannot consume.
    pub fn validate(&self) -> Result<()> {
        if self.products.is_empty() {
            return Err(PlanningError::data("dataset has no SKUs"));
        }
        if self.periods.is_empty() {
            return Err(PlanningError::data("dataset has no periods"));
        }
        if let Some(dup) = first_duplicate(&self.products) {
            return Err(PlanningError::data(format!("SKU '{dup}' listed twice")));
        }
        if let Some(dup) = first_duplicate(&self.periods) {
            return Err(PlanningError::data(format!("period '{dup}' listed twice")));
        }

        let skus: HashSet<&Sku> = self.products.iter().collect();
        let periods: HashSet<&Period> = self.periods.iter().collect();

        for (label, table) in [
            ("demand", &self.demand),
            ("safety stock", &self.safety_stock),
            ("excess inventory", &self.excess_inventory),
        ] {
            for ((p, t), &value) in table {
                if !skus.contains(p) || !periods.contains(t) {
                    return Err(PlanningError::data(format!(
                        "{label} entry ({p}, {t}) is outside the planning grid"
                    )));
                }
                check_value(label, &format!("({p}, {t})"), value)?;
            }
        }
        for (t, &value) in &self.capacity {
            if !periods.contains(t) {
                return Err(PlanningError::data(format!(
                    "capacity entry for unknown period '{t}'"
                )));
            }
            check_value("capacity", t.0.as_str(), value)?;
        }

        for p in &self.products {
            for t in &self.periods {
                if self.demand(p, t).is_none() {
                    return Err(PlanningError::data(format!("missing demand for ({p}, {t})")));
                }
                if self.safety_stock(p, t).is_none() {
                    return Err(PlanningError::data(format!(
                        "missing safety stock target for ({p}, {t})"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn lookup(table: &HashMap<(Sku, Period), f64>, sku: &Sku, period: &Period) -> Option<f64> {
    table.get(&(sku.clone(), period.clone())).copied()
}

fn check_value(label: &str, key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanningError::data(format!(
            "{label} {key} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn first_duplicate<T: Eq + std::hash::Hash>(items: &[T]) -> Option<&T> {
    let mut seen = HashSet::new();
    items.iter().find(|item| !seen.insert(*item))
}
