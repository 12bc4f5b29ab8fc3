// src/strategy/traits.rs

use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::model::demand::DemandEnvironment;

/// Decides the reorder point of the single stock position.
///
/// Policies read the demand environment but never own or mutate it. Policies
/// built on history only look at realized demand strictly before `day`;
/// forecasting policies may also read the distributions of later days.
///
/// We require `Send` so trials can be moved across threads by a caller.
pub trait ReorderPolicy: Debug + Send {
    /// Which variant this is.
    fn kind(&self) -> PolicyKind;

    /// Length of the trailing demand history the policy reads.
    fn histo_days(&self) -> usize;

    fn lead_time(&self) -> usize;

    /// Inventory threshold for `day` at the target `service_level`.
    ///
    /// Callable only for `day >= histo_days`; earlier days return
    /// `SimulationError::Precondition`.
    fn compute_reorder_point(
        &mut self,
        demand: &DemandEnvironment,
        day: usize,
        service_level: f64,
    ) -> Result<f64>;
}

/// Selector for the reorder policy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    MovingAverage,
    NormalSafetyStock,
    ForecastError,
    MonteCarlo,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::MovingAverage,
        PolicyKind::NormalSafetyStock,
        PolicyKind::ForecastError,
        PolicyKind::MonteCarlo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::MovingAverage => "Historical Demand",
            PolicyKind::NormalSafetyStock => "Safety Stock",
            PolicyKind::ForecastError => "Forecast",
            PolicyKind::MonteCarlo => "Monte Carlo",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            PolicyKind::MovingAverage => "moving-average",
            PolicyKind::NormalSafetyStock => "normal-safety-stock",
            PolicyKind::ForecastError => "forecast-error",
            PolicyKind::MonteCarlo => "monte-carlo",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PolicyKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted || kind.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| SimulationError::UnknownPolicy(s.to_string()))
    }
}
