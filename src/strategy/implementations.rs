// src/strategy/implementations.rs

use std::ops::Range;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Distribution;
use tracing::trace;

use crate::error::{Result, SimulationError};
use crate::model::demand::DemandEnvironment;
use crate::simulation::config::SimulationConfig;
use crate::strategy::statistics::{inverse_normal_cdf, mean, quantile, sample_std_dev};
use crate::strategy::traits::{PolicyKind, ReorderPolicy};

/// ChaCha stream used by Monte-Carlo resampling. Environments draw from the
/// default stream 0 of the same seed, so the two never overlap.
pub const MONTE_CARLO_STREAM: u64 = 1;

impl PolicyKind {
    /// Builds the policy for one trial. `seed` only matters for Monte-Carlo.
    pub fn build(&self, config: &SimulationConfig, seed: u64) -> Box<dyn ReorderPolicy> {
        let (histo_days, lead_time) = (config.histo_days, config.lead_time);
        match self {
            PolicyKind::MovingAverage => Box::new(MovingAveragePolicy::new(histo_days, lead_time)),
            PolicyKind::NormalSafetyStock => {
                Box::new(NormalSafetyStockPolicy::new(histo_days, lead_time))
            }
            PolicyKind::ForecastError => {
                Box::new(ForecastErrorPolicy::new(histo_days, lead_time))
            }
            PolicyKind::MonteCarlo => Box::new(MonteCarloPolicy::new(
                histo_days,
                lead_time,
                config.mc_sims,
                seed,
            )),
        }
    }
}

/// Trailing history `[day - histo_days, day)`.
fn trailing_window(day: usize, histo_days: usize) -> Result<Range<usize>> {
    if histo_days == 0 {
        return Err(SimulationError::Precondition {
            day,
            reason: "trailing history window is empty".to_string(),
        });
    }
    if day < histo_days {
        return Err(SimulationError::Precondition {
            day,
            reason: format!("reorder point requested before {histo_days} days of history"),
        });
    }
    Ok(day - histo_days..day)
}

/// z * sigma * sqrt(L); zero when sigma is undefined or zero.
fn safety_stock(service_level: f64, std_dev: Option<f64>, lead_time: usize) -> f64 {
    match std_dev {
        Some(sigma) if sigma > 0.0 && sigma.is_finite() => {
            inverse_normal_cdf(service_level) * sigma * (lead_time as f64).sqrt()
        }
        _ => {
            trace!(?std_dev, "degenerate demand spread, no safety stock");
            0.0
        }
    }
}

// =========================================================================
// 1. Moving-Average Policy
// =========================================================================

/// Covers average historical demand over the lead time, nothing more.
#[derive(Debug, Clone)]
pub struct MovingAveragePolicy {
    histo_days: usize,
    lead_time: usize,
}

impl MovingAveragePolicy {
    pub fn new(histo_days: usize, lead_time: usize) -> Self {
        Self {
            histo_days,
            lead_time,
        }
    }
}

impl ReorderPolicy for MovingAveragePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::MovingAverage
    }

    fn histo_days(&self) -> usize {
        self.histo_days
    }

    fn lead_time(&self) -> usize {
        self.lead_time
    }

    fn compute_reorder_point(
        &mut self,
        demand: &DemandEnvironment,
        day: usize,
        _service_level: f64,
    ) -> Result<f64> {
        let window = trailing_window(day, self.histo_days)?;
        let history = demand.realized_window(window.start, window.end);
        let mu = mean(&history).ok_or_else(|| SimulationError::Precondition {
            day,
            reason: "no demand history".to_string(),
        })?;
        Ok(mu * self.lead_time as f64)
    }
}

// =========================================================================
// 2. Normal Safety-Stock Policy
// =========================================================================

/// Lead-time demand plus a safety stock assuming normally distributed daily
/// demand with the sample spread of the trailing window.
///
/// Formula: ROP = mu * L + z(service_level) * sigma * sqrt(L)
#[derive(Debug, Clone)]
pub struct NormalSafetyStockPolicy {
    histo_days: usize,
    lead_time: usize,
}

impl NormalSafetyStockPolicy {
    pub fn new(histo_days: usize, lead_time: usize) -> Self {
        Self {
            histo_days,
            lead_time,
        }
    }
}

impl ReorderPolicy for NormalSafetyStockPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::NormalSafetyStock
    }

    fn histo_days(&self) -> usize {
        self.histo_days
    }

    fn lead_time(&self) -> usize {
        self.lead_time
    }

    fn compute_reorder_point(
        &mut self,
        demand: &DemandEnvironment,
        day: usize,
        service_level: f64,
    ) -> Result<f64> {
        let window = trailing_window(day, self.histo_days)?;
        let history = demand.realized_window(window.start, window.end);
        let mu = mean(&history).ok_or_else(|| SimulationError::Precondition {
            day,
            reason: "no demand history".to_string(),
        })?;

        let buffer = safety_stock(service_level, sample_std_dev(&history), self.lead_time);
        Ok(mu * self.lead_time as f64 + buffer)
    }
}

// =========================================================================
// 3. Forecast-Error Policy
// =========================================================================

/// Sums the expected demand of the coming lead-time days and sizes the
/// safety stock from the historical spread of forecast errors
/// (expected minus realized).
#[derive(Debug, Clone)]
pub struct ForecastErrorPolicy {
    histo_days: usize,
    lead_time: usize,
}

impl ForecastErrorPolicy {
    pub fn new(histo_days: usize, lead_time: usize) -> Self {
        Self {
            histo_days,
            lead_time,
        }
    }
}

impl ReorderPolicy for ForecastErrorPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ForecastError
    }

    fn histo_days(&self) -> usize {
        self.histo_days
    }

    fn lead_time(&self) -> usize {
        self.lead_time
    }

    fn compute_reorder_point(
        &mut self,
        demand: &DemandEnvironment,
        day: usize,
        service_level: f64,
    ) -> Result<f64> {
        let window = trailing_window(day, self.histo_days)?;

        let forecast: f64 = (day + 1..=day + self.lead_time)
            .map(|t| demand.mean_estimate(t))
            .sum();

        let errors: Vec<f64> = window
            .map(|t| demand.mean_estimate(t) - demand.realized_demand(t) as f64)
            .collect();

        let buffer = safety_stock(service_level, sample_std_dev(&errors), self.lead_time);
        Ok(forecast + buffer)
    }
}

// =========================================================================
// 4. Monte-Carlo Policy
// =========================================================================

/// Resamples the known distributions of the coming lead-time days and uses
/// the empirical `service_level` quantile of total lead-time demand.
///
/// Owns its random stream; resampling never touches the environment's draws.
#[derive(Debug, Clone)]
pub struct MonteCarloPolicy {
    histo_days: usize,
    lead_time: usize,
    mc_sims: usize,
    rng: ChaCha8Rng,
}

impl MonteCarloPolicy {
    pub fn new(histo_days: usize, lead_time: usize, mc_sims: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(MONTE_CARLO_STREAM);
        Self {
            histo_days,
            lead_time,
            mc_sims,
            rng,
        }
    }

    /// `mc_sims` draws of total demand over days `day + 1 ..= day + L`.
    pub fn sample_lead_time_demand(&mut self, demand: &DemandEnvironment, day: usize) -> Vec<f64> {
        let lead_time = self.lead_time;
        let rng = &mut self.rng;
        (0..self.mc_sims)
            .map(|_| {
                (day + 1..=day + lead_time)
                    .map(|t| demand.distribution(t).sample(rng))
                    .sum::<f64>()
            })
            .collect()
    }
}

impl ReorderPolicy for MonteCarloPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::MonteCarlo
    }

    fn histo_days(&self) -> usize {
        self.histo_days
    }

    fn lead_time(&self) -> usize {
        self.lead_time
    }

    fn compute_reorder_point(
        &mut self,
        demand: &DemandEnvironment,
        day: usize,
        service_level: f64,
    ) -> Result<f64> {
        trailing_window(day, self.histo_days)?;
        let samples = self.sample_lead_time_demand(demand, day);
        quantile(&samples, service_level).ok_or_else(|| SimulationError::Precondition {
            day,
            reason: "Monte-Carlo needs at least one simulation".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::distribution::DemandDistribution;
    use rand::SeedableRng;

    fn constant_environment(values: &[f64]) -> DemandEnvironment {
        let dists = values
            .iter()
            .map(|v| DemandDistribution::point_mass(*v).unwrap())
            .collect();
        DemandEnvironment::from_distributions(dists, &mut ChaCha8Rng::seed_from_u64(0)).unwrap()
    }

    #[test]
    fn test_moving_average_uses_trailing_window_only() {
        // history of 10s, then a jump to 1000 that must stay invisible
        let mut values = vec![10.0; 5];
        values.extend([1000.0; 5]);
        let env = constant_environment(&values);

        let mut policy = MovingAveragePolicy::new(5, 3);
        assert_eq!(policy.compute_reorder_point(&env, 5, 0.95).unwrap(), 30.0);
    }

    #[test]
    fn test_normal_safety_stock_matches_formula() {
        let env = constant_environment(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, 0.0]);
        let mut policy = NormalSafetyStockPolicy::new(8, 4);

        let rop = policy.compute_reorder_point(&env, 8, 0.95).unwrap();
        let sigma = (32.0f64 / 7.0).sqrt();
        let expected = 5.0 * 4.0 + inverse_normal_cdf(0.95) * sigma * 2.0;
        assert!((rop - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_variance_has_no_safety_stock() {
        let env = constant_environment(&[100.0; 20]);
        let mut normal = NormalSafetyStockPolicy::new(10, 3);
        let mut forecast = ForecastErrorPolicy::new(10, 3);

        assert_eq!(normal.compute_reorder_point(&env, 12, 0.99).unwrap(), 300.0);
        assert_eq!(forecast.compute_reorder_point(&env, 12, 0.99).unwrap(), 300.0);
    }

    #[test]
    fn test_single_day_history_has_no_safety_stock() {
        let env = constant_environment(&[40.0, 60.0, 80.0]);
        let mut policy = NormalSafetyStockPolicy::new(1, 2);
        assert_eq!(policy.compute_reorder_point(&env, 1, 0.95).unwrap(), 80.0);
    }

    #[test]
    fn test_forecast_sum_clamps_at_horizon_end() {
        let env = constant_environment(&[10.0, 10.0, 10.0, 20.0, 30.0]);
        let mut policy = ForecastErrorPolicy::new(3, 3);

        // days 4, 5, 6 -> 30 + 30 + 30 (clamped), zero forecast error
        assert_eq!(policy.compute_reorder_point(&env, 3, 0.95).unwrap(), 90.0);
    }

    #[test]
    fn test_forecast_error_spread_uses_sample_std() {
        // fractional means truncate on realization: errors 0.5, 0, 0.5, 0
        let env = constant_environment(&[2.5, 3.0, 4.5, 5.0, 10.0, 10.0, 10.0, 10.0]);
        let mut policy = ForecastErrorPolicy::new(4, 3);

        // sigma = sqrt(0.25 / 3), so sigma * sqrt(3) = 0.5
        let rop = policy.compute_reorder_point(&env, 4, 0.9).unwrap();
        let expected = 30.0 + inverse_normal_cdf(0.9) * 0.5;
        assert!((rop - expected).abs() < 1e-9, "{rop} vs {expected}");
    }

    #[test]
    fn test_forecast_error_with_random_history_day() {
        let mut dists = vec![DemandDistribution::poisson(10.0).unwrap()];
        dists.extend((0..11).map(|_| DemandDistribution::point_mass(2.0).unwrap()));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let env = DemandEnvironment::from_distributions(dists, &mut rng).unwrap();
        let mut policy = ForecastErrorPolicy::new(8, 3);

        // only day 0 carries an error e; the sample std of [e, 0 x 7] is |e| / sqrt(8)
        let error = 10.0 - env.realized_demand(0) as f64;
        let sigma = error.abs() / 8.0f64.sqrt();
        let buffer = if sigma > 0.0 {
            inverse_normal_cdf(0.95) * sigma * 3.0f64.sqrt()
        } else {
            0.0
        };
        let rop = policy.compute_reorder_point(&env, 8, 0.95).unwrap();
        assert!((rop - (6.0 + buffer)).abs() < 1e-9, "{rop} vs {}", 6.0 + buffer);
    }

    #[test]
    fn test_monte_carlo_on_point_masses_is_exact() {
        let env = constant_environment(&[5.0, 5.0, 5.0, 5.0, 7.0, 9.0]);
        let mut policy = MonteCarloPolicy::new(2, 2, 50, 1);

        // days 4 and 5: 7 + 9
        assert_eq!(policy.compute_reorder_point(&env, 3, 0.5).unwrap(), 16.0);
        // days 6, 7 clamp to day 5: 9 + 9
        assert_eq!(policy.compute_reorder_point(&env, 5, 0.5).unwrap(), 18.0);
    }

    #[test]
    fn test_monte_carlo_is_reproducible_for_a_seed() {
        let env = constant_environment(&[0.0; 30]);
        let dists = (0..30)
            .map(|_| DemandDistribution::gamma(7.0, 16.0).unwrap())
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let gamma_env = DemandEnvironment::from_distributions(dists, &mut rng).unwrap();

        let mut a = MonteCarloPolicy::new(10, 3, 500, 99);
        let mut b = MonteCarloPolicy::new(10, 3, 500, 99);
        let ra = a.compute_reorder_point(&gamma_env, 15, 0.9).unwrap();
        let rb = b.compute_reorder_point(&gamma_env, 15, 0.9).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.compute_reorder_point(&env, 15, 0.9).unwrap(), 0.0);
    }

    #[test]
    fn test_precondition_before_history_is_an_error() {
        let env = constant_environment(&[1.0; 10]);
        let mut policies: Vec<Box<dyn ReorderPolicy>> = vec![
            Box::new(MovingAveragePolicy::new(5, 2)),
            Box::new(NormalSafetyStockPolicy::new(5, 2)),
            Box::new(ForecastErrorPolicy::new(5, 2)),
            Box::new(MonteCarloPolicy::new(5, 2, 10, 0)),
        ];
        for policy in policies.iter_mut() {
            let result = policy.compute_reorder_point(&env, 4, 0.95);
            assert!(
                matches!(result, Err(SimulationError::Precondition { day: 4, .. })),
                "{:?} accepted day 4",
                policy.kind()
            );
        }
    }

    #[test]
    fn test_monte_carlo_without_simulations_is_an_error() {
        let env = constant_environment(&[1.0; 10]);
        let mut policy = MonteCarloPolicy::new(2, 2, 0, 0);
        assert!(policy.compute_reorder_point(&env, 4, 0.95).is_err());
    }

    #[test]
    fn test_build_returns_requested_kind() {
        let config = SimulationConfig::default();
        for kind in PolicyKind::ALL {
            assert_eq!(kind.build(&config, 7).kind(), kind);
        }
    }
}
