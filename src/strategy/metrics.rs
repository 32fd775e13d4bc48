// src/strategy/metrics.rs

//! Service-level and cost bookkeeping shared by the scalarizers.

use crate::strategy::traits::GoalDeviations;

/// Fraction of total demand covered by production.
///
/// `Σx / ΣD`. Zero demand yields NaN, which the frontier reports as missing.
pub fn service_level(total_production: f64, total_demand: f64) -> f64 {
    if total_demand == 0.0 {
        return f64::NAN;
    }
    total_production / total_demand
}

/// Cost target for goal programming: the lexicographic cost optimum
/// inflated by `cost_factor`.
pub fn goal_cost_target(phase1_cost: f64, cost_factor: f64) -> f64 {
    phase1_cost * cost_factor
}

/// Realised cost implied by the cost goal: `target − d⁻ + d⁺`.
pub fn realised_goal_cost(dev: &GoalDeviations) -> f64 {
    dev.cost_target - dev.cost_under + dev.cost_over
}

/// Service level implied by the coverage goal.
///
/// Formula: `(alpha·D − d⁻ + d⁺) / D`
pub fn realised_goal_service(dev: &GoalDeviations, alpha: f64, total_demand: f64) -> f64 {
    service_level(
        alpha * total_demand - dev.coverage_under + dev.coverage_over,
        total_demand,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_demand_has_no_service_level() {
        assert!(service_level(5.0, 0.0).is_nan());
        assert_eq!(service_level(15.0, 20.0), 0.75);
    }

    #[test]
    fn goal_reconstruction_reads_deviation_pairs() {
        let dev = GoalDeviations {
            coverage_under: 2.0,
            coverage_over: 0.0,
            cost_under: 0.0,
            cost_over: 3.0,
            cost_target: 105.0,
        };
        assert_eq!(realised_goal_cost(&dev), 108.0);
        // 0.9 * 100 - 2 = 88
        assert!((realised_goal_service(&dev, 0.9, 100.0) - 0.88).abs() < 1e-12);
        assert!((goal_cost_target(100.0, 1.05) - 105.0).abs() < 1e-12);
    }
}
