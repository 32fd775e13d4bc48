// src/analysis/mod.rs

//! Post-optimality analysis: uniqueness checks and optimal-face exploration.

pub mod degenerate;

pub use degenerate::{DegeneracyAnalyzer, DegeneracyReport, FaceVertex, FreeVariable};
