// src/lib.rs

//! Multi-objective production and inventory planning over a linear model.
//!
//! A [`model::constraints::ConstraintBuilder`] lays down the shared feasible
//! region, the scalarizers in [`strategy`] turn the cost and coverage
//! objectives into single LPs, [`analysis`] checks whether an optimum is
//! unique, and [`planning::engine::FrontierRunner`] collects the
//! cost/service frontier.

pub mod analysis;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod planning;
pub mod solver;
pub mod strategy;

pub use error::{PlanningError, Result};
