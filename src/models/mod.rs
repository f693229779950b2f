// src/models/mod.rs

pub mod attempt;
pub mod otp;
pub mod user;
pub mod word_list;
