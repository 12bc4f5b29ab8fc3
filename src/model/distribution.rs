// src/model/distribution.rs

//! Sampleable daily demand distributions.
//!
//! A `DemandDistribution` is a weighted mixture of simple kernels (point mass,
//! Gamma, Poisson, Exponential). Single distributions are mixtures with one
//! component of weight 1.

use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma, Poisson};

use crate::error::{Result, SimulationError};

#[derive(Debug, Clone)]
enum Kernel {
    Point(f64),
    Gamma { shape: f64, scale: f64, dist: Gamma<f64> },
    Poisson { rate: f64, dist: Poisson<f64> },
    Exponential { rate: f64, dist: Exp<f64> },
}

impl Kernel {
    fn mean(&self) -> f64 {
        match self {
            Kernel::Point(value) => *value,
            Kernel::Gamma { shape, scale, .. } => shape * scale,
            Kernel::Poisson { rate, .. } => *rate,
            Kernel::Exponential { rate, .. } => 1.0 / rate,
        }
    }

    fn variance(&self) -> f64 {
        match self {
            Kernel::Point(_) => 0.0,
            Kernel::Gamma { shape, scale, .. } => shape * scale * scale,
            Kernel::Poisson { rate, .. } => *rate,
            Kernel::Exponential { rate, .. } => 1.0 / (rate * rate),
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Kernel::Point(value) => *value,
            Kernel::Gamma { dist, .. } => dist.sample(rng),
            Kernel::Poisson { dist, .. } => dist.sample(rng),
            Kernel::Exponential { dist, .. } => dist.sample(rng),
        }
    }
}

/// A (possibly mixed) non-negative demand distribution for one day.
#[derive(Debug, Clone)]
pub struct DemandDistribution {
    // (weight, kernel); weights sum to 1
    components: Vec<(f64, Kernel)>,
}

impl DemandDistribution {
    /// Degenerate distribution that always yields `value`.
    pub fn point_mass(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::Distribution(format!(
                "point mass must be a finite non-negative value, got {value}"
            )));
        }
        Ok(Self::single(Kernel::Point(value)))
    }

    pub fn gamma(shape: f64, scale: f64) -> Result<Self> {
        let dist = Gamma::new(shape, scale).map_err(|e| {
            SimulationError::Distribution(format!("gamma(shape={shape}, scale={scale}): {e}"))
        })?;
        Ok(Self::single(Kernel::Gamma { shape, scale, dist }))
    }

    pub fn poisson(rate: f64) -> Result<Self> {
        let dist = Poisson::new(rate)
            .map_err(|e| SimulationError::Distribution(format!("poisson(rate={rate}): {e}")))?;
        Ok(Self::single(Kernel::Poisson { rate, dist }))
    }

    pub fn exponential(rate: f64) -> Result<Self> {
        // Exp::new accepts a zero rate (infinite mean), which is useless as demand.
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(SimulationError::Distribution(format!(
                "exponential rate must be positive, got {rate}"
            )));
        }
        let dist = Exp::new(rate)
            .map_err(|e| SimulationError::Distribution(format!("exponential(rate={rate}): {e}")))?;
        Ok(Self::single(Kernel::Exponential { rate, dist }))
    }

    /// Weighted mixture of distributions.
    ///
    /// Weights must be positive; they are normalized to sum to 1. Nested
    /// mixtures are flattened.
    pub fn mixture(parts: Vec<(f64, DemandDistribution)>) -> Result<Self> {
        if parts.is_empty() {
            return Err(SimulationError::Distribution(
                "mixture needs at least one component".to_string(),
            ));
        }
        if let Some((weight, _)) = parts.iter().find(|(w, _)| !(*w > 0.0) || !w.is_finite()) {
            return Err(SimulationError::Distribution(format!(
                "mixture weights must be positive, got {weight}"
            )));
        }

        let total: f64 = parts.iter().map(|(w, _)| w).sum();
        let components = parts
            .into_iter()
            .flat_map(|(weight, dist)| {
                dist.components
                    .into_iter()
                    .map(move |(inner, kernel)| (weight / total * inner, kernel))
            })
            .collect();

        Ok(Self { components })
    }

    fn single(kernel: Kernel) -> Self {
        Self {
            components: vec![(1.0, kernel)],
        }
    }

    /// Analytic expected value.
    pub fn mean(&self) -> f64 {
        self.components.iter().map(|(w, k)| w * k.mean()).sum()
    }

    /// Analytic variance (law of total variance over the mixture components).
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.components
            .iter()
            .map(|(w, k)| w * (k.variance() + (k.mean() - mean).powi(2)))
            .sum()
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

impl Distribution<f64> for DemandDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if let [(_, kernel)] = self.components.as_slice() {
            return kernel.draw(rng);
        }

        let u: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (weight, kernel) in &self.components {
            cumulative += weight;
            if u < cumulative {
                return kernel.draw(rng);
            }
        }
        // Rounding can leave the cumulative weight a hair below 1.
        self.components
            .last()
            .map(|(_, kernel)| kernel.draw(rng))
            .unwrap_or(0.0)
    }
}
