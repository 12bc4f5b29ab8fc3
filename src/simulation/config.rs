// src/simulation/config.rs

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::model::demand::{DemandParameterRanges, EnvironmentKind};
use crate::strategy::traits::PolicyKind;

/// Run parameters. Every field has a default, so a JSON file only needs the
/// fields it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Horizon length in days, warm-up included.
    pub sim_days: usize,
    /// Warm-up days that only build demand history.
    pub histo_days: usize,
    /// Days between placing and receiving an order.
    pub lead_time: usize,
    /// Lead-time demand draws per Monte-Carlo evaluation.
    pub mc_sims: usize,
    /// Fraction of the remaining stock spoiled every day.
    pub write_off_rate: f64,
    pub default_service_level: f64,
    /// Independent trials per scenario.
    pub n_simulations: usize,
    /// Stock on hand when the controlled period starts.
    pub base_stock: f64,
    /// Calendar date of day 0, drives seasonality.
    pub start_date: NaiveDate,
    pub seed: u64,
    /// Service levels to sweep; empty means only `default_service_level`.
    pub service_levels: Vec<f64>,
    pub environments: Vec<EnvironmentKind>,
    pub policies: Vec<PolicyKind>,
    pub demand_ranges: DemandParameterRanges,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_days: 730,
            histo_days: 365,
            lead_time: 3,
            mc_sims: 1000,
            write_off_rate: 0.01,
            default_service_level: 0.95,
            n_simulations: 100,
            base_stock: 0.0,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            seed: 42,
            service_levels: Vec::new(),
            environments: EnvironmentKind::ALL.to_vec(),
            policies: PolicyKind::ALL.to_vec(),
            demand_ranges: DemandParameterRanges::default(),
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("sim_days", self.sim_days),
            ("histo_days", self.histo_days),
            ("lead_time", self.lead_time),
            ("mc_sims", self.mc_sims),
            ("n_simulations", self.n_simulations),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(SimulationError::Configuration(format!(
                "{name} must be positive"
            )));
        }

        if self.histo_days >= self.sim_days {
            return Err(SimulationError::Configuration(format!(
                "histo_days ({}) must be smaller than sim_days ({})",
                self.histo_days, self.sim_days
            )));
        }
        if self.lead_time >= self.sim_days - self.histo_days {
            return Err(SimulationError::Configuration(format!(
                "lead_time ({}) must be smaller than the controlled period ({} days)",
                self.lead_time,
                self.sim_days - self.histo_days
            )));
        }
        if !(0.0..1.0).contains(&self.write_off_rate) {
            return Err(SimulationError::Configuration(format!(
                "write_off_rate must be in [0, 1), got {}",
                self.write_off_rate
            )));
        }
        if !self.base_stock.is_finite() || self.base_stock < 0.0 {
            return Err(SimulationError::Configuration(format!(
                "base_stock must be non-negative, got {}",
                self.base_stock
            )));
        }
        for level in self.service_levels() {
            if !(level > 0.0 && level < 1.0) {
                return Err(SimulationError::Configuration(format!(
                    "service levels must be in (0, 1), got {level}"
                )));
            }
        }
        if self.environments.is_empty() || self.policies.is_empty() {
            return Err(SimulationError::Configuration(
                "at least one environment and one policy are required".to_string(),
            ));
        }

        self.demand_ranges.validate()
    }

    /// Service levels to run, falling back to the default one.
    pub fn service_levels(&self) -> Vec<f64> {
        if self.service_levels.is_empty() {
            vec![self.default_service_level]
        } else {
            self.service_levels.clone()
        }
    }

    /// First day on which no order may be placed any more.
    pub fn last_order_day(&self) -> usize {
        self.sim_days - self.lead_time
    }

    /// Days counted in the performance summary (inclusive). Skips the days
    /// right after warm-up and the final lead time, whose pipeline is
    /// incomplete.
    pub fn evaluation_window(&self) -> RangeInclusive<usize> {
        (self.histo_days + self.lead_time + 2)..=(self.sim_days - self.lead_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service_levels(), vec![0.95]);
        assert_eq!(config.evaluation_window(), 370..=727);
        assert_eq!(config.last_order_day(), 727);
    }

    #[test]
    fn test_bounds_are_checked() {
        let bad = [
            SimulationConfig {
                histo_days: 730,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                lead_time: 365,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                mc_sims: 0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                write_off_rate: 1.0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                service_levels: vec![0.9, 1.0],
                ..SimulationConfig::default()
            },
            SimulationConfig {
                policies: Vec::new(),
                ..SimulationConfig::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SimulationError::Configuration(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "sim_days": 400,
            "lead_time": 2,
            "environments": ["spiking-demand"],
            "policies": ["monte-carlo", "moving-average"],
            "start_date": "2024-03-01"
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.sim_days, 400);
        assert_eq!(config.lead_time, 2);
        assert_eq!(config.histo_days, 365);
        assert_eq!(config.environments, vec![EnvironmentKind::SpikingDemand]);
        assert_eq!(
            config.policies,
            vec![PolicyKind::MonteCarlo, PolicyKind::MovingAverage]
        );
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_policy_in_json_is_rejected() {
        let json = r#"{ "policies": ["newsvendor"] }"#;
        assert!(serde_json::from_str::<SimulationConfig>(json).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join("safety_stock_sim_config_test.json");
        fs::write(&path, r#"{ "n_simulations": 5, "mc_sims": 200 }"#).unwrap();

        let config = SimulationConfig::from_json_file(&path).unwrap();
        assert_eq!(config.n_simulations, 5);
        assert_eq!(config.mc_sims, 200);

        fs::remove_file(&path).ok();
    }
}
