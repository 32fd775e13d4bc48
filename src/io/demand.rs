// src/io/demand.rs

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{PlanningError, Result};
use crate::model::dataset::{Period, PlanningDataset, Sku};

/// Period labels `t0, t1, ...` in chronological order.
pub fn period_labels(periods: usize) -> Vec<Period> {
    (0..periods).map(|t| Period(format!("t{t}"))).collect()
}

/// Every period has the exact same demand.
pub fn generate_constant_demand(periods: usize, value: f64) -> Vec<f64> {
    vec![value; periods]
}

/// Demand drawn from a Normal distribution, rounded and clamped at zero.
///
/// # Arguments
/// * `periods` - Length of the horizon.
/// * `mean` - The average demand per period (e.g., 100.0).
/// * `std_dev` - The volatility (e.g., 15.0).
/// * `rng` - Caller-owned generator, seeded for reproducible runs.
pub fn generate_normal_demand<R: rand::Rng + ?Sized>(
    periods: usize,
    mean: f64,
    std_dev: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    // rand_distr 0.4 accepts a negative spread and mirrors the draw
    if !(std_dev >= 0.0 && std_dev.is_finite()) {
        return Err(PlanningError::data(format!(
            "demand spread must be non-negative, got {std_dev}"
        )));
    }
    let normal = Normal::new(mean, std_dev)
        .map_err(|e| PlanningError::data(format!("invalid demand distribution: {e}")))?;
    Ok((0..periods)
        .map(|_| normal.sample(&mut *rng).round().max(0.0))
        .collect())
}

/// Shape of a generated planning dataset.
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    pub skus: Vec<Sku>,
    pub periods: usize,
    pub mean_demand: f64,
    pub std_dev: f64,
    /// Safety stock as a fraction of the same period's demand.
    pub safety_ratio: f64,
    /// Excess inventory carried into each period.
    pub excess: f64,
    /// Shared per-period capacity; `None` leaves it to the builder fallback.
    pub capacity: Option<f64>,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            skus: vec![Sku::from("21A"), Sku::from("22B"), Sku::from("23C")],
            periods: 6,
            mean_demand: 100.0,
            std_dev: 15.0,
            safety_ratio: 0.1,
            excess: 5.0,
            capacity: Some(450.0),
        }
    }
}

/// Builds a dataset from the profile. A seed makes the draw reproducible.
pub fn generate_dataset(profile: &SyntheticProfile, seed: Option<u64>) -> Result<PlanningDataset> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let periods = period_labels(profile.periods);
    let mut data = PlanningDataset::new(profile.skus.iter().cloned(), periods.iter().cloned());

    for sku in &profile.skus {
        let demand = if profile.std_dev > 0.0 {
            generate_normal_demand(profile.periods, profile.mean_demand, profile.std_dev, &mut rng)?
        } else {
            generate_constant_demand(profile.periods, profile.mean_demand)
        };
        for (t, d) in periods.iter().zip(demand) {
            data.set_demand(sku.clone(), t.clone(), d)
                .set_safety_stock(sku.clone(), t.clone(), (d * profile.safety_ratio).round())
                .set_excess_inventory(sku.clone(), t.clone(), profile.excess);
        }
    }
    if let Some(cap) = profile.capacity {
        for t in &periods {
            data.set_capacity(t.clone(), cap);
        }
    }

    data.validate()?;
    Ok(data)
}
