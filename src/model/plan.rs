// src/model/plan.rs

use serde::Serialize;

use crate::model::dataset::{Period, Sku};

/// Quantities at or below this are left out of a plan.
pub const PLAN_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    #[serde(rename = "Product")]
    pub sku: Sku,
    #[serde(rename = "Period")]
    pub period: Period,
    #[serde(rename = "Production")]
    pub quantity: f64,
}

/// Sparse production plan: only `(SKU, period)` pairs with a positive
/// quantity, in SKU-major, chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProductionPlan {
    entries: Vec<PlanEntry>,
}

impl ProductionPlan {
    /// Keeps the entries above `PLAN_EPSILON`.
    pub fn from_quantities(quantities: impl IntoIterator<Item = (Sku, Period, f64)>) -> Self {
        let entries = quantities
            .into_iter()
            .filter(|&(_, _, q)| q > PLAN_EPSILON)
            .map(|(sku, period, quantity)| PlanEntry {
                sku,
                period,
                quantity,
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, sku: &Sku, period: &Period) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| &e.sku == sku && &e.period == period)
            .map(|e| e.quantity)
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.quantity).sum()
    }
}
