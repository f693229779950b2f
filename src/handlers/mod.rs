// src/handlers/mod.rs

pub mod analytics;
pub mod auth;
pub mod lists;
pub mod practice;
pub mod students;
