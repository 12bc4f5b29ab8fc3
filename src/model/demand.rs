// src/model/demand.rs

//! Demand environments.
//!
//! An environment is one frozen realization of a demand model over the whole
//! horizon: the stochastic parameters are drawn once, each day's distribution
//! is built from them (scaled by seasonality), and one sample per day becomes
//! the realized demand.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::model::distribution::DemandDistribution;
use crate::model::seasonality::seasonality_multiplier;

/// Weight of the Gamma base component in the Gamma/Poisson mixture.
pub const BASE_DEMAND_WEIGHT: f64 = 0.9;
/// Weight of the zero point mass in the spiking mixture.
pub const NO_DEMAND_WEIGHT: f64 = 0.95;

// =========================================================================
// Environment selection
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentKind {
    /// 90/10 mixture of a Gamma base demand and a Poisson spike.
    GammaPoisson,
    /// 50/50 mixture of a low-mean and a high-mean Gamma.
    GammaGammaHighVariance,
    /// Mostly zero demand with rare Exponential spikes.
    SpikingDemand,
    /// A single low-variance Gamma.
    SingleGammaLowVariance,
}

impl EnvironmentKind {
    pub const ALL: [EnvironmentKind; 4] = [
        EnvironmentKind::GammaPoisson,
        EnvironmentKind::GammaGammaHighVariance,
        EnvironmentKind::SpikingDemand,
        EnvironmentKind::SingleGammaLowVariance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentKind::GammaPoisson => "90/10 Gamma/Poisson",
            EnvironmentKind::GammaGammaHighVariance => "50/50 Gamma(low)/Gamma(high)",
            EnvironmentKind::SpikingDemand => "Spiking High Demand",
            EnvironmentKind::SingleGammaLowVariance => "Gamma",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            EnvironmentKind::GammaPoisson => "gamma-poisson",
            EnvironmentKind::GammaGammaHighVariance => "gamma-gamma-high-variance",
            EnvironmentKind::SpikingDemand => "spiking-demand",
            EnvironmentKind::SingleGammaLowVariance => "single-gamma-low-variance",
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EnvironmentKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted || kind.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| SimulationError::UnknownEnvironment(s.to_string()))
    }
}

// =========================================================================
// Parameter ranges
// =========================================================================

/// Closed interval a parameter is drawn from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub min: f64,
    pub max: f64,
}

impl UniformRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.min > 0.0) || !self.max.is_finite() || self.min > self.max {
            return Err(SimulationError::Configuration(format!(
                "{name} range must satisfy 0 < min <= max, got [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaRange {
    pub shape: UniformRange,
    pub scale: UniformRange,
}

/// Ranges for every stochastic parameter of every demand family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandParameterRanges {
    pub base_gamma: GammaRange,
    pub spike_poisson_rate: UniformRange,
    pub low_mean_gamma: GammaRange,
    pub high_mean_gamma: GammaRange,
    pub low_variance_gamma: GammaRange,
    pub spike_exponential_rate: UniformRange,
}

impl Default for DemandParameterRanges {
    fn default() -> Self {
        Self {
            base_gamma: GammaRange {
                shape: UniformRange::new(6.0, 8.0),
                scale: UniformRange::new(14.0, 18.0),
            },
            spike_poisson_rate: UniformRange::new(75.0, 85.0),
            low_mean_gamma: GammaRange {
                shape: UniformRange::new(6.0, 8.0),
                scale: UniformRange::new(2.0, 4.0),
            },
            high_mean_gamma: GammaRange {
                shape: UniformRange::new(6.0, 8.0),
                scale: UniformRange::new(28.0, 30.0),
            },
            low_variance_gamma: GammaRange {
                shape: UniformRange::new(6.0, 8.0),
                scale: UniformRange::new(14.0, 18.0),
            },
            spike_exponential_rate: UniformRange::new(0.005, 0.1),
        }
    }
}

impl DemandParameterRanges {
    pub fn validate(&self) -> Result<()> {
        self.base_gamma.shape.validate("base_gamma.shape")?;
        self.base_gamma.scale.validate("base_gamma.scale")?;
        self.spike_poisson_rate.validate("spike_poisson_rate")?;
        self.low_mean_gamma.shape.validate("low_mean_gamma.shape")?;
        self.low_mean_gamma.scale.validate("low_mean_gamma.scale")?;
        self.high_mean_gamma.shape.validate("high_mean_gamma.shape")?;
        self.high_mean_gamma.scale.validate("high_mean_gamma.scale")?;
        self.low_variance_gamma.shape.validate("low_variance_gamma.shape")?;
        self.low_variance_gamma.scale.validate("low_variance_gamma.scale")?;
        self.spike_exponential_rate.validate("spike_exponential_rate")
    }
}

// =========================================================================
// Drawn parameters
// =========================================================================

/// Parameters of one environment instance, fixed for its whole horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum DemandParameters {
    GammaPoisson {
        shape: f64,
        scale: f64,
        rate: f64,
    },
    GammaGamma {
        low_shape: f64,
        low_scale: f64,
        high_shape: f64,
        high_scale: f64,
    },
    Spiking {
        rate: f64,
    },
    SingleGamma {
        shape: f64,
        scale: f64,
    },
}

impl DemandParameters {
    pub fn draw<R: Rng + ?Sized>(
        kind: EnvironmentKind,
        ranges: &DemandParameterRanges,
        rng: &mut R,
    ) -> Self {
        match kind {
            EnvironmentKind::GammaPoisson => DemandParameters::GammaPoisson {
                shape: ranges.base_gamma.shape.sample(rng),
                scale: ranges.base_gamma.scale.sample(rng),
                rate: ranges.spike_poisson_rate.sample(rng),
            },
            EnvironmentKind::GammaGammaHighVariance => DemandParameters::GammaGamma {
                low_shape: ranges.low_mean_gamma.shape.sample(rng),
                low_scale: ranges.low_mean_gamma.scale.sample(rng),
                high_shape: ranges.high_mean_gamma.shape.sample(rng),
                high_scale: ranges.high_mean_gamma.scale.sample(rng),
            },
            EnvironmentKind::SpikingDemand => DemandParameters::Spiking {
                rate: ranges.spike_exponential_rate.sample(rng),
            },
            EnvironmentKind::SingleGammaLowVariance => DemandParameters::SingleGamma {
                shape: ranges.low_variance_gamma.shape.sample(rng),
                scale: ranges.low_variance_gamma.scale.sample(rng),
            },
        }
    }

    /// Builds the day's distribution with scale-like parameters multiplied by
    /// `seasonality`. Exponential spikes scale their mean, i.e. divide the rate.
    pub fn distribution(&self, seasonality: f64) -> Result<DemandDistribution> {
        match *self {
            DemandParameters::GammaPoisson { shape, scale, rate } => {
                DemandDistribution::mixture(vec![
                    (
                        BASE_DEMAND_WEIGHT,
                        DemandDistribution::gamma(shape, scale * seasonality)?,
                    ),
                    (
                        1.0 - BASE_DEMAND_WEIGHT,
                        DemandDistribution::poisson(rate * seasonality)?,
                    ),
                ])
            }
            DemandParameters::GammaGamma {
                low_shape,
                low_scale,
                high_shape,
                high_scale,
            } => DemandDistribution::mixture(vec![
                (0.5, DemandDistribution::gamma(low_shape, low_scale * seasonality)?),
                (0.5, DemandDistribution::gamma(high_shape, high_scale * seasonality)?),
            ]),
            DemandParameters::Spiking { rate } => DemandDistribution::mixture(vec![
                (NO_DEMAND_WEIGHT, DemandDistribution::point_mass(0.0)?),
                (
                    1.0 - NO_DEMAND_WEIGHT,
                    DemandDistribution::exponential(rate / seasonality)?,
                ),
            ]),
            DemandParameters::SingleGamma { shape, scale } => {
                DemandDistribution::gamma(shape, scale * seasonality)
            }
        }
    }
}

// =========================================================================
// Environment
// =========================================================================

/// One day of a frozen demand realization.
#[derive(Debug, Clone)]
pub struct DemandDay {
    pub day: usize,
    pub realized_demand: u32,
    pub mean_estimate: f64,
    pub distribution: DemandDistribution,
}

/// Day-indexed demand for a whole horizon. Immutable once built.
#[derive(Debug, Clone)]
pub struct DemandEnvironment {
    kind: Option<EnvironmentKind>,
    parameters: Option<DemandParameters>,
    days: Vec<DemandDay>,
}

impl DemandEnvironment {
    /// Draws a fresh realization of `kind` for `sim_days` days.
    ///
    /// Parameter draws and daily samples both come from `rng`, in that order.
    pub fn generate<R: Rng + ?Sized>(
        kind: EnvironmentKind,
        ranges: &DemandParameterRanges,
        sim_days: usize,
        start_date: NaiveDate,
        rng: &mut R,
    ) -> Result<Self> {
        let parameters = DemandParameters::draw(kind, ranges, rng);
        let distributions = (0..sim_days)
            .map(|day| parameters.distribution(seasonality_multiplier(start_date, day)))
            .collect::<Result<Vec<_>>>()?;

        let mut environment = Self::from_distributions(distributions, rng)?;
        environment.kind = Some(kind);
        environment.parameters = Some(parameters);
        Ok(environment)
    }

    /// Realizes one sample per given distribution, day 0 first.
    pub fn from_distributions<R: Rng + ?Sized>(
        distributions: Vec<DemandDistribution>,
        rng: &mut R,
    ) -> Result<Self> {
        if distributions.is_empty() {
            return Err(SimulationError::Configuration(
                "a demand environment needs at least one day".to_string(),
            ));
        }

        let days = distributions
            .into_iter()
            .enumerate()
            .map(|(day, distribution)| DemandDay {
                day,
                // Truncation toward zero; samples are never negative.
                realized_demand: distribution.sample(rng) as u32,
                mean_estimate: distribution.mean(),
                distribution,
            })
            .collect();

        Ok(Self {
            kind: None,
            parameters: None,
            days,
        })
    }

    pub fn kind(&self) -> Option<EnvironmentKind> {
        self.kind
    }

    pub fn parameters(&self) -> Option<&DemandParameters> {
        self.parameters.as_ref()
    }

    /// Number of days in the horizon.
    pub fn horizon(&self) -> usize {
        self.days.len()
    }

    pub fn days(&self) -> &[DemandDay] {
        &self.days
    }

    /// Day lookup; indices past the horizon repeat the final day.
    pub fn get(&self, day: usize) -> &DemandDay {
        &self.days[day.min(self.days.len() - 1)]
    }

    pub fn realized_demand(&self, day: usize) -> u32 {
        self.get(day).realized_demand
    }

    pub fn mean_estimate(&self, day: usize) -> f64 {
        self.get(day).mean_estimate
    }

    pub fn distribution(&self, day: usize) -> &DemandDistribution {
        &self.get(day).distribution
    }

    /// Realized demand for days `[start, end)` as floats.
    pub fn realized_window(&self, start: usize, end: usize) -> Vec<f64> {
        (start..end)
            .map(|day| self.realized_demand(day) as f64)
            .collect()
    }
}
