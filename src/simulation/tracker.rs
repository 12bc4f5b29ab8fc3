// src/simulation/tracker.rs

use std::ops::RangeInclusive;

use serde::Serialize;

/// What happened on one evaluated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSample {
    pub day: usize,
    pub demand: f64,
    pub fulfilled: f64,
    pub writeoff: f64,
    pub inventory_after: f64,
    pub stockout: bool,
    /// Quantity due on day + 1, day + 2, ..., day + lead_time.
    pub orders_in_flight: Vec<f64>,
}

/// Outcome of one trial over the evaluation window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub trial: usize,
    pub total_demand: f64,
    pub total_fulfilled: f64,
    pub fill_rate: f64,
    pub total_writeoff: f64,
    pub stockout_count: usize,
    pub total_lost_sales: f64,
    pub avg_service_level: f64,
    pub avg_inventory_level: f64,
    pub days_evaluated: usize,
    pub orders_placed: usize,
    pub quantity_ordered: f64,
    pub daily_samples: Vec<PerformanceSample>,
}

/// Accumulates daily outcomes that fall inside the evaluation window.
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    window: RangeInclusive<usize>,
    total_demand: f64,
    total_fulfilled: f64,
    total_writeoff: f64,
    total_lost_sales: f64,
    stockout_count: usize,
    days_without_stockout: usize,
    samples: Vec<PerformanceSample>,
}

impl PerformanceTracker {
    pub fn new(window: RangeInclusive<usize>) -> Self {
        Self {
            window,
            total_demand: 0.0,
            total_fulfilled: 0.0,
            total_writeoff: 0.0,
            total_lost_sales: 0.0,
            stockout_count: 0,
            days_without_stockout: 0,
            samples: Vec::new(),
        }
    }

    pub fn in_window(&self, day: usize) -> bool {
        self.window.contains(&day)
    }

    /// Records `sample` if its day is evaluated; returns whether it was.
    pub fn record(&mut self, sample: PerformanceSample) -> bool {
        if !self.in_window(sample.day) {
            return false;
        }

        self.total_demand += sample.demand;
        self.total_fulfilled += sample.fulfilled;
        self.total_writeoff += sample.writeoff;
        self.total_lost_sales += (sample.demand - sample.fulfilled).max(0.0);

        if sample.stockout {
            self.stockout_count += 1;
        } else {
            self.days_without_stockout += 1;
        }

        self.samples.push(sample);
        true
    }

    pub fn days_evaluated(&self) -> usize {
        self.samples.len()
    }

    pub fn fill_rate(&self) -> f64 {
        if self.total_demand > 0.0 {
            1.0 - (self.total_demand - self.total_fulfilled) / self.total_demand
        } else {
            0.0
        }
    }

    pub fn avg_service_level(&self) -> f64 {
        match self.days_evaluated() {
            0 => 0.0,
            n => self.days_without_stockout as f64 / n as f64,
        }
    }

    pub fn avg_inventory_level(&self) -> f64 {
        match self.days_evaluated() {
            0 => 0.0,
            n => self.samples.iter().map(|s| s.inventory_after).sum::<f64>() / n as f64,
        }
    }

    /// Closes the trial. Order counters come from the pipeline, which the
    /// tracker never sees.
    pub fn into_summary(
        self,
        trial: usize,
        orders_placed: usize,
        quantity_ordered: f64,
    ) -> TrialSummary {
        TrialSummary {
            trial,
            total_demand: self.total_demand,
            total_fulfilled: self.total_fulfilled,
            fill_rate: self.fill_rate(),
            total_writeoff: self.total_writeoff,
            stockout_count: self.stockout_count,
            total_lost_sales: self.total_lost_sales,
            avg_service_level: self.avg_service_level(),
            avg_inventory_level: self.avg_inventory_level(),
            days_evaluated: self.days_evaluated(),
            orders_placed,
            quantity_ordered,
            daily_samples: self.samples,
        }
    }
}
