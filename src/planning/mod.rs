// src/planning/mod.rs

pub mod config;
pub mod engine;
