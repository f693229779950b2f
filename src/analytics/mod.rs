// src/analytics/mod.rs

pub mod aggregator;
pub mod summary;
