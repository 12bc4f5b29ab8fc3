// src/simulation/engine.rs

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::model::demand::DemandEnvironment;
use crate::model::inventory::{Fulfillment, InventoryState};
use crate::model::pipeline::OrderPipeline;
use crate::simulation::config::SimulationConfig;
use crate::simulation::tracker::{PerformanceSample, PerformanceTracker, TrialSummary};
use crate::strategy::traits::ReorderPolicy;

/// Everything that happened to the stock on one controlled day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOutcome {
    pub day: usize,
    pub delivered: f64,
    pub stock_before_fulfillment: f64,
    pub fulfillment: Fulfillment,
    pub stock_before_writeoff: f64,
    pub writeoff: f64,
    /// `None` once the horizon is too close for an order to arrive.
    pub reorder_point: Option<f64>,
    pub order_placed: Option<f64>,
    pub stock_after: f64,
}

/// One trial: a single stock position driven by one policy through one
/// demand realization.
///
/// Days before `histo_days` are warm-up: their demand exists in the
/// environment and feeds the policies' history, but the stock is untouched.
pub struct InventorySimulation<'a> {
    config: &'a SimulationConfig,
    environment: &'a DemandEnvironment,
    policy: Box<dyn ReorderPolicy>,
    service_level: f64,

    pipeline: OrderPipeline,
    inventory: InventoryState,
    tracker: PerformanceTracker,

    current_day: usize,
}

impl<'a> InventorySimulation<'a> {
    pub fn new(
        config: &'a SimulationConfig,
        environment: &'a DemandEnvironment,
        policy: Box<dyn ReorderPolicy>,
        service_level: f64,
    ) -> Result<Self> {
        config.validate()?;
        if !(service_level > 0.0 && service_level < 1.0) {
            return Err(SimulationError::Configuration(format!(
                "service level must be in (0, 1), got {service_level}"
            )));
        }
        if policy.histo_days() != config.histo_days || policy.lead_time() != config.lead_time {
            return Err(SimulationError::Configuration(format!(
                "{} policy built for {} history days and lead time {}, trial uses {} and {}",
                policy.kind(),
                policy.histo_days(),
                policy.lead_time(),
                config.histo_days,
                config.lead_time
            )));
        }
        if environment.horizon() < config.sim_days {
            return Err(SimulationError::Configuration(format!(
                "demand environment covers {} days, simulation needs {}",
                environment.horizon(),
                config.sim_days
            )));
        }

        Ok(Self {
            config,
            environment,
            policy,
            service_level,
            pipeline: OrderPipeline::new(config.lead_time),
            inventory: InventoryState::new(config.base_stock),
            tracker: PerformanceTracker::new(config.evaluation_window()),
            current_day: config.histo_days,
        })
    }

    pub fn current_day(&self) -> usize {
        self.current_day
    }

    pub fn is_finished(&self) -> bool {
        self.current_day >= self.config.sim_days
    }

    pub fn inventory(&self) -> &InventoryState {
        &self.inventory
    }

    pub fn pipeline(&self) -> &OrderPipeline {
        &self.pipeline
    }

    /// Runs every remaining day and closes the trial.
    pub fn run(mut self, trial: usize) -> Result<TrialSummary> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.finish(trial))
    }

    /// Advances one day: deliver, fulfill, write off, reorder, record.
    pub fn step(&mut self) -> Result<DayOutcome> {
        let day = self.current_day;

        // 1. Deliveries due today are available for today's demand.
        let delivered = self.pipeline.manage_order(day);
        self.inventory.receive(delivered);
        let stock_before_fulfillment = self.inventory.stock();

        // 2. Serve demand; the shortfall is lost.
        let fulfillment = self
            .inventory
            .fulfill(self.environment.realized_demand(day));

        // 3. Spoilage on what is left.
        let stock_before_writeoff = self.inventory.stock();
        let writeoff = self.inventory.apply_writeoff(self.config.write_off_rate);

        // 4. Reorder against post-write-off stock plus what is still in transit.
        let mut reorder_point = None;
        let mut order_placed = None;
        if day < self.config.last_order_day() {
            let rop = self
                .policy
                .compute_reorder_point(self.environment, day, self.service_level)?;
            let expected = self.inventory.stock() + self.pipeline.get_incoming_orders(day);
            if expected <= rop {
                let order = self.pipeline.place_order(day, rop - expected);
                order_placed = Some(order.quantity);
            }
            reorder_point = Some(rop);
        }

        // 5. Record
        let orders_in_flight = (1..=self.pipeline.lead_time())
            .map(|ahead| self.pipeline.arriving_on(day + ahead))
            .collect();
        self.tracker.record(PerformanceSample {
            day,
            demand: fulfillment.demand,
            fulfilled: fulfillment.fulfilled,
            writeoff,
            inventory_after: self.inventory.stock(),
            stockout: fulfillment.is_stockout(),
            orders_in_flight,
        });

        self.current_day += 1;

        Ok(DayOutcome {
            day,
            delivered,
            stock_before_fulfillment,
            fulfillment,
            stock_before_writeoff,
            writeoff,
            reorder_point,
            order_placed,
            stock_after: self.inventory.stock(),
        })
    }

    fn finish(self, trial: usize) -> TrialSummary {
        let summary = self.tracker.into_summary(
            trial,
            self.pipeline.orders_placed(),
            self.pipeline.total_placed(),
        );
        debug!(
            trial,
            policy = %self.policy.kind(),
            fill_rate = summary.fill_rate,
            stockouts = summary.stockout_count,
            writeoff = summary.total_writeoff,
            "trial finished"
        );
        summary
    }
}

/// Runs one complete trial.
pub fn run_trial(
    config: &SimulationConfig,
    environment: &DemandEnvironment,
    policy: Box<dyn ReorderPolicy>,
    service_level: f64,
    trial: usize,
) -> Result<TrialSummary> {
    InventorySimulation::new(config, environment, policy, service_level)?.run(trial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::distribution::DemandDistribution;
    use crate::strategy::implementations::MovingAveragePolicy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            sim_days: 30,
            histo_days: 10,
            lead_time: 2,
            write_off_rate: 0.0,
            ..SimulationConfig::default()
        }
    }

    fn constant_environment(days: usize, value: f64) -> DemandEnvironment {
        let dists = (0..days)
            .map(|_| DemandDistribution::point_mass(value).unwrap())
            .collect();
        DemandEnvironment::from_distributions(dists, &mut ChaCha8Rng::seed_from_u64(0)).unwrap()
    }

    #[test]
    fn test_first_controlled_day_orders_the_reorder_point() {
        let config = small_config();
        let env = constant_environment(30, 10.0);
        let mut sim = InventorySimulation::new(
            &config,
            &env,
            Box::new(MovingAveragePolicy::new(10, 2)),
            0.95,
        )
        .unwrap();

        assert_eq!(sim.current_day(), 10);
        let outcome = sim.step().unwrap();
        assert_eq!(outcome.day, 10);
        assert_eq!(outcome.fulfillment.fulfilled, 0.0);
        assert!(outcome.fulfillment.is_stockout());
        assert_eq!(outcome.reorder_point, Some(20.0));
        assert_eq!(outcome.order_placed, Some(20.0));
        assert_eq!(sim.pipeline().get_incoming_orders(10), 20.0);
    }

    #[test]
    fn test_delivery_is_available_the_day_it_arrives() {
        let config = small_config();
        let env = constant_environment(30, 10.0);
        let mut sim = InventorySimulation::new(
            &config,
            &env,
            Box::new(MovingAveragePolicy::new(10, 2)),
            0.95,
        )
        .unwrap();

        sim.step().unwrap(); // day 10, order 20 arriving day 12
        sim.step().unwrap(); // day 11
        let outcome = sim.step().unwrap(); // day 12
        assert_eq!(outcome.delivered, 20.0);
        assert_eq!(outcome.stock_before_fulfillment, 20.0);
        assert_eq!(outcome.fulfillment.fulfilled, 10.0);
    }

    #[test]
    fn test_no_orders_near_the_horizon() {
        let config = small_config();
        let env = constant_environment(30, 10.0);
        let mut sim = InventorySimulation::new(
            &config,
            &env,
            Box::new(MovingAveragePolicy::new(10, 2)),
            0.95,
        )
        .unwrap();

        while !sim.is_finished() {
            let outcome = sim.step().unwrap();
            if outcome.day >= config.last_order_day() {
                assert_eq!(outcome.reorder_point, None);
                assert_eq!(outcome.order_placed, None);
            }
        }
        assert_eq!(sim.pipeline().outstanding(), 0.0);
    }

    #[test]
    fn test_short_environment_is_rejected() {
        let config = small_config();
        let env = constant_environment(20, 10.0);
        let result = InventorySimulation::new(
            &config,
            &env,
            Box::new(MovingAveragePolicy::new(10, 2)),
            0.95,
        );
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_lead_time_longer_than_controlled_period_is_rejected() {
        let config = SimulationConfig {
            sim_days: 20,
            histo_days: 10,
            lead_time: 25,
            ..SimulationConfig::default()
        };
        let env = constant_environment(20, 10.0);
        let result = InventorySimulation::new(
            &config,
            &env,
            Box::new(MovingAveragePolicy::new(10, 25)),
            0.95,
        );
        assert!(matches!(result, Err(SimulationError::Configuration(_))));

        let result = run_trial(
            &config,
            &env,
            Box::new(MovingAveragePolicy::new(10, 25)),
            0.95,
            0,
        );
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_policy_windows_must_match_config() {
        let config = small_config();
        let env = constant_environment(30, 10.0);
        for policy in [MovingAveragePolicy::new(5, 2), MovingAveragePolicy::new(10, 3)] {
            let result = InventorySimulation::new(&config, &env, Box::new(policy), 0.95);
            assert!(matches!(result, Err(SimulationError::Configuration(_))));
        }
    }

    #[test]
    fn test_service_level_outside_unit_interval_is_rejected() {
        let config = small_config();
        let env = constant_environment(30, 10.0);
        for service_level in [0.0, 1.0, 1.5] {
            let result = InventorySimulation::new(
                &config,
                &env,
                Box::new(MovingAveragePolicy::new(10, 2)),
                service_level,
            );
            assert!(matches!(result, Err(SimulationError::Configuration(_))));
        }
    }
}
