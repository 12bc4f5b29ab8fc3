//! Safety-stock policy simulator.
//!
//! Simulates a single stock position day by day under stochastic demand and
//! compares reorder-point policies by fill rate, cycle service level and
//! write-offs.
//!
//! # Layout
//!
//! - **model**: demand distributions and environments, order pipeline, stock
//! - **strategy**: reorder-point policies and their statistics
//! - **simulation**: configuration, per-trial engine, tracker, trial runner
//! - **io**: CSV / JSON exports for downstream reporting

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{Result, SimulationError};
pub use model::demand::{DemandDay, DemandEnvironment, DemandParameterRanges, EnvironmentKind};
pub use model::distribution::DemandDistribution;
pub use model::inventory::InventoryState;
pub use model::pipeline::{Order, OrderPipeline};
pub use simulation::config::SimulationConfig;
pub use simulation::engine::{run_trial, DayOutcome, InventorySimulation};
pub use simulation::runner::{
    run_experiment, run_scenario, AggregateReport, FieldStats, Scenario, ScenarioResult,
};
pub use simulation::tracker::{PerformanceSample, PerformanceTracker, TrialSummary};
pub use strategy::traits::{PolicyKind, ReorderPolicy};
