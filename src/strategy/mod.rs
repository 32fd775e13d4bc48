// src/strategy/mod.rs

pub mod implementations;
pub mod metrics;
pub mod traits;
