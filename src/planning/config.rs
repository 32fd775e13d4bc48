// src/planning/config.rs

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlanningError, Result};
use crate::model::dataset::Sku;
use crate::model::lp::Domain;

/// Unit costs per SKU ($/unit).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParameters {
    pub production: HashMap<Sku, f64>,
    pub holding: HashMap<Sku, f64>,
    pub excess: HashMap<Sku, f64>,
}

impl CostParameters {
    /// Same unit costs for every SKU.
    pub fn uniform<S: Into<Sku>>(
        skus: impl IntoIterator<Item = S>,
        production: f64,
        holding: f64,
        excess: f64,
    ) -> Self {
        let mut costs = Self::default();
        for sku in skus {
            costs.set(sku, production, holding, excess);
        }
        costs
    }

    pub fn set(&mut self, sku: impl Into<Sku>, production: f64, holding: f64, excess: f64) -> &mut Self {
        let sku = sku.into();
        self.production.insert(sku.clone(), production);
        self.holding.insert(sku.clone(), holding);
        self.excess.insert(sku, excess);
        self
    }

    pub fn production(&self, sku: &Sku) -> Result<f64> {
        unit_cost(&self.production, "production", sku)
    }

    pub fn holding(&self, sku: &Sku) -> Result<f64> {
        unit_cost(&self.holding, "holding", sku)
    }

    pub fn excess(&self, sku: &Sku) -> Result<f64> {
        unit_cost(&self.excess, "excess", sku)
    }
}

fn unit_cost(table: &HashMap<Sku, f64>, label: &str, sku: &Sku) -> Result<f64> {
    let value = table
        .get(sku)
        .copied()
        .ok_or_else(|| PlanningError::data(format!("no {label} cost for SKU '{sku}'")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(PlanningError::data(format!(
            "{label} cost for SKU '{sku}' must be non-negative, got {value}"
        )));
    }
    Ok(value)
}

/// Parameters shared by every scalarizer call. Never mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Minimum coverage fraction, 0 < alpha <= 1.
    pub alpha: f64,
    pub costs: CostParameters,
    /// Slack on the lexicographic cost cap: phase 2 uses `cost <= z1* + tol`.
    pub lexicographic_tolerance: f64,
    /// Declare production and inventory integer.
    pub integer_production: bool,
    /// Budget for each external solve.
    pub solve_timeout_ms: Option<u64>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        let mut costs = CostParameters::default();
        costs
            .set("21A", 5.0, 0.2, 1.0)
            .set("22B", 4.5, 0.15, 1.0)
            .set("23C", 6.0, 0.25, 1.0);
        Self {
            alpha: 0.9,
            costs,
            lexicographic_tolerance: 0.0,
            integer_production: false,
            solve_timeout_ms: None,
        }
    }
}

impl PlanningConfig {
    pub fn with_costs(costs: CostParameters) -> Self {
        Self {
            costs,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(PlanningError::data(format!(
                "alpha must lie in (0, 1], got {}",
                self.alpha
            )));
        }
        if !self.lexicographic_tolerance.is_finite() || self.lexicographic_tolerance < 0.0 {
            return Err(PlanningError::data(format!(
                "lexicographic tolerance must be non-negative, got {}",
                self.lexicographic_tolerance
            )));
        }
        Ok(())
    }

    pub fn domain(&self) -> Domain {
        if self.integer_production {
            Domain::Integer
        } else {
            Domain::Continuous
        }
    }

    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_ms.map(Duration::from_millis)
    }
}

/// Weights of the goal-programming model and how its cost target is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalSettings {
    pub coverage_weight: f64,
    pub cost_weight: f64,
    /// `cost_target = z1* · cost_factor`, usually slightly above 1.
    pub cost_factor: f64,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            coverage_weight: 1.0,
            cost_weight: 1.0,
            cost_factor: 1.05,
        }
    }
}

/// Which runs make up a frontier sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    pub cost_weight: f64,
    /// One weighted-sum run per entry; larger values favour coverage.
    pub shortfall_weights: Vec<f64>,
    pub goal: Option<GoalSettings>,
    /// Run the weighted-sum sweep on the rayon pool.
    pub parallel: bool,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            cost_weight: 1.0,
            shortfall_weights: vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0],
            goal: Some(GoalSettings::default()),
            parallel: true,
        }
    }
}

impl FrontierConfig {
    pub fn validate(&self) -> Result<()> {
        check_weight("cost weight", self.cost_weight)?;
        for &w in &self.shortfall_weights {
            check_weight("shortfall weight", w)?;
        }
        if let Some(goal) = &self.goal {
            check_weight("coverage goal weight", goal.coverage_weight)?;
            check_weight("cost goal weight", goal.cost_weight)?;
            if !(goal.cost_factor.is_finite() && goal.cost_factor > 0.0) {
                return Err(PlanningError::data(format!(
                    "cost factor must be positive, got {}",
                    goal.cost_factor
                )));
            }
        }
        Ok(())
    }
}

fn check_weight(label: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanningError::data(format!(
            "{label} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

/// Tolerances of the post-optimality analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// |value| and |reduced cost| below this count as zero.
    pub tolerance: f64,
    /// Width of the band that locks the optimum.
    pub delta: f64,
    /// Number of random objectives for face sampling.
    pub samples: usize,
    /// Seed for face sampling. `None` draws from entropy.
    pub seed: Option<u64>,
    pub two_sided_lock: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            delta: 1e-4,
            samples: 60,
            seed: None,
            two_sided_lock: false,
        }
    }
}

/// Everything the demo binary reads from its JSON config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub planning: PlanningConfig,
    pub frontier: FrontierConfig,
    pub analysis: AnalysisSettings,
}

impl RunConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&raw)?;
        config.planning.validate()?;
        config.frontier.validate()?;
        Ok(config)
    }
}
