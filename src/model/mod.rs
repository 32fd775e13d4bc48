// src/model/mod.rs

pub mod constraints;
pub mod dataset;
pub mod lp;
pub mod plan;
