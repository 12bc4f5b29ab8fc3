// src/strategy/mod.rs

pub mod implementations;
pub mod statistics;
pub mod traits;
