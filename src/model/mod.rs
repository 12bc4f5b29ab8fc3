// src/model/mod.rs

pub mod demand;
pub mod distribution;
pub mod inventory;
pub mod pipeline;
pub mod seasonality;
