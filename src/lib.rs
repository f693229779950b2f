// src/lib.rs

pub mod analytics;
pub mod config;
pub mod error;
pub mod exercises;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
