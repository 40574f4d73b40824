// src/handlers/mod.rs

pub mod quiz;
pub mod review;
pub mod session;
