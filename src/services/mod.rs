// src/services/mod.rs

pub mod ai;
pub mod mailer;
