// src/simulation/runner.rs

//! Repeated trials and their aggregation.
//!
//! Each trial owns a fresh demand realization, pipeline, inventory and
//! tracker. The environment seed of trial `i` depends only on the base seed
//! and `i`, so every policy and service level in a sweep is evaluated against
//! the same demand sequences.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::demand::{DemandEnvironment, EnvironmentKind};
use crate::simulation::config::SimulationConfig;
use crate::simulation::engine::run_trial;
use crate::simulation::tracker::TrialSummary;
use crate::strategy::statistics::{mean, sample_std_dev};
use crate::strategy::traits::PolicyKind;

/// One (environment, policy, service level) combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scenario {
    pub environment: EnvironmentKind,
    pub policy: PolicyKind,
    pub service_level: f64,
}

/// Mean and sample standard deviation of one summary field across trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl FieldStats {
    /// Zero mean for no trials, zero spread for fewer than two.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: mean(values).unwrap_or(0.0),
            std_dev: sample_std_dev(values).unwrap_or(0.0),
        }
    }
}

/// Cross-trial statistics of a scenario, the record consumed by reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub environment: EnvironmentKind,
    pub policy: PolicyKind,
    pub service_level: f64,
    pub trials: usize,
    pub total_demand: FieldStats,
    pub total_fulfilled: FieldStats,
    pub fill_rate: FieldStats,
    pub total_writeoff: FieldStats,
    pub stockout_count: FieldStats,
    pub total_lost_sales: FieldStats,
    pub avg_service_level: FieldStats,
    pub avg_inventory_level: FieldStats,
    pub orders_placed: FieldStats,
    pub quantity_ordered: FieldStats,
}

impl AggregateReport {
    pub fn from_trials(scenario: Scenario, trials: &[TrialSummary]) -> Self {
        let stats = |field: fn(&TrialSummary) -> f64| {
            let values: Vec<f64> = trials.iter().map(field).collect();
            FieldStats::from_values(&values)
        };

        Self {
            environment: scenario.environment,
            policy: scenario.policy,
            service_level: scenario.service_level,
            trials: trials.len(),
            total_demand: stats(|t| t.total_demand),
            total_fulfilled: stats(|t| t.total_fulfilled),
            fill_rate: stats(|t| t.fill_rate),
            total_writeoff: stats(|t| t.total_writeoff),
            stockout_count: stats(|t| t.stockout_count as f64),
            total_lost_sales: stats(|t| t.total_lost_sales),
            avg_service_level: stats(|t| t.avg_service_level),
            avg_inventory_level: stats(|t| t.avg_inventory_level),
            orders_placed: stats(|t| t.orders_placed as f64),
            quantity_ordered: stats(|t| t.quantity_ordered),
        }
    }
}

/// All trials of one scenario plus their aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub trials: Vec<TrialSummary>,
    pub report: AggregateReport,
}

/// Seed of trial `trial`, spread with a SplitMix64 finalizer so neighbouring
/// trials do not get neighbouring seeds.
pub fn trial_seed(base_seed: u64, trial: usize) -> u64 {
    let mut z = base_seed.wrapping_add((trial as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fresh demand realization for `trial`.
pub fn build_environment(
    config: &SimulationConfig,
    kind: EnvironmentKind,
    trial: usize,
) -> Result<DemandEnvironment> {
    let mut rng = ChaCha8Rng::seed_from_u64(trial_seed(config.seed, trial));
    DemandEnvironment::generate(
        kind,
        &config.demand_ranges,
        config.sim_days,
        config.start_date,
        &mut rng,
    )
}

/// Runs `n_simulations` trials of one scenario.
pub fn run_scenario(config: &SimulationConfig, scenario: Scenario) -> Result<ScenarioResult> {
    config.validate()?;

    let mut trials = Vec::with_capacity(config.n_simulations);
    for trial in 0..config.n_simulations {
        let environment = build_environment(config, scenario.environment, trial)?;
        let policy = scenario.policy.build(config, trial_seed(config.seed, trial));
        trials.push(run_trial(
            config,
            &environment,
            policy,
            scenario.service_level,
            trial,
        )?);
    }

    let report = AggregateReport::from_trials(scenario, &trials);
    info!(
        environment = %scenario.environment,
        policy = %scenario.policy,
        service_level = scenario.service_level,
        fill_rate = report.fill_rate.mean,
        cycle_service_level = report.avg_service_level.mean,
        writeoff = report.total_writeoff.mean,
        "scenario finished"
    );

    Ok(ScenarioResult {
        scenario,
        trials,
        report,
    })
}

/// Every configured environment against every policy and service level.
pub fn run_experiment(config: &SimulationConfig) -> Result<Vec<ScenarioResult>> {
    config.validate()?;

    let mut results = Vec::new();
    for &environment in &config.environments {
        for &policy in &config.policies {
            for service_level in config.service_levels() {
                let scenario = Scenario {
                    environment,
                    policy,
                    service_level,
                };
                results.push(run_scenario(config, scenario)?);
            }
        }
    }
    Ok(results)
}
