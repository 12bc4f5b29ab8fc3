// src/error.rs

use thiserror::Error;

/// Every way a simulation run can fail.
///
/// Configuration problems surface at setup, before any trial runs.
/// Precondition violations are programming errors inside a trial and abort it.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Unknown reorder policy '{0}'")]
    UnknownPolicy(String),

    #[error("Unknown demand environment '{0}'")]
    UnknownEnvironment(String),

    #[error("Precondition violated on day {day}: {reason}")]
    Precondition { day: usize, reason: String },

    #[error("Invalid demand distribution: {0}")]
    Distribution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
