// src/solver/mod.rs

pub mod backend;
pub mod traits;
