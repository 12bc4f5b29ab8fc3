// src/io/reporting.rs

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::demand::EnvironmentKind;
use crate::simulation::runner::{AggregateReport, ScenarioResult};
use crate::strategy::traits::PolicyKind;

/// One CSV row per trial.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRow {
    pub environment: EnvironmentKind,
    pub policy: PolicyKind,
    pub service_level: f64,
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
}

/// One CSV row per evaluated day of every trial.
#[derive(Debug, Clone, Serialize)]
pub struct DailyRow {
    pub environment: EnvironmentKind,
    pub policy: PolicyKind,
    pub service_level: f64,
    pub trial: usize,
    pub day: usize,
    pub demand: f64,
    pub fulfilled: f64,
    pub writeoff: f64,
    pub inventory_after: f64,
    pub stockout: bool,
    /// Sum over the next `lead_time` days; see `InFlightRow` for the split.
    pub orders_in_flight_total: f64,
}

/// Quantity due `days_ahead` days after `day`, one row per lead-time day.
#[derive(Debug, Clone, Serialize)]
pub struct InFlightRow {
    pub environment: EnvironmentKind,
    pub policy: PolicyKind,
    pub service_level: f64,
    pub trial: usize,
    pub day: usize,
    pub days_ahead: usize,
    pub quantity: f64,
}

/// Aggregate report flattened to `<field>_mean` / `<field>_std` columns.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    pub environment: EnvironmentKind,
    pub policy: PolicyKind,
    pub service_level: f64,
    pub trials: usize,
    pub total_demand_mean: f64,
    pub total_demand_std: f64,
    pub total_fulfilled_mean: f64,
    pub total_fulfilled_std: f64,
    pub fill_rate_mean: f64,
    pub fill_rate_std: f64,
    pub total_writeoff_mean: f64,
    pub total_writeoff_std: f64,
    pub stockout_count_mean: f64,
    pub stockout_count_std: f64,
    pub total_lost_sales_mean: f64,
    pub total_lost_sales_std: f64,
    pub avg_service_level_mean: f64,
    pub avg_service_level_std: f64,
    pub avg_inventory_level_mean: f64,
    pub avg_inventory_level_std: f64,
    pub orders_placed_mean: f64,
    pub orders_placed_std: f64,
    pub quantity_ordered_mean: f64,
    pub quantity_ordered_std: f64,
}

impl From<&AggregateReport> for AggregateRow {
    fn from(r: &AggregateReport) -> Self {
        Self {
            environment: r.environment,
            policy: r.policy,
            service_level: r.service_level,
            trials: r.trials,
            total_demand_mean: r.total_demand.mean,
            total_demand_std: r.total_demand.std_dev,
            total_fulfilled_mean: r.total_fulfilled.mean,
            total_fulfilled_std: r.total_fulfilled.std_dev,
            fill_rate_mean: r.fill_rate.mean,
            fill_rate_std: r.fill_rate.std_dev,
            total_writeoff_mean: r.total_writeoff.mean,
            total_writeoff_std: r.total_writeoff.std_dev,
            stockout_count_mean: r.stockout_count.mean,
            stockout_count_std: r.stockout_count.std_dev,
            total_lost_sales_mean: r.total_lost_sales.mean,
            total_lost_sales_std: r.total_lost_sales.std_dev,
            avg_service_level_mean: r.avg_service_level.mean,
            avg_service_level_std: r.avg_service_level.std_dev,
            avg_inventory_level_mean: r.avg_inventory_level.mean,
            avg_inventory_level_std: r.avg_inventory_level.std_dev,
            orders_placed_mean: r.orders_placed.mean,
            orders_placed_std: r.orders_placed.std_dev,
            quantity_ordered_mean: r.quantity_ordered.mean,
            quantity_ordered_std: r.quantity_ordered.std_dev,
        }
    }
}

pub fn trial_rows(results: &[ScenarioResult]) -> Vec<TrialRow> {
    results
        .iter()
        .flat_map(|result| {
            let scenario = result.scenario;
            result.trials.iter().map(move |t| TrialRow {
                environment: scenario.environment,
                policy: scenario.policy,
                service_level: scenario.service_level,
                trial: t.trial,
                total_demand: t.total_demand,
                total_fulfilled: t.total_fulfilled,
                fill_rate: t.fill_rate,
                total_writeoff: t.total_writeoff,
                stockout_count: t.stockout_count,
                total_lost_sales: t.total_lost_sales,
                avg_service_level: t.avg_service_level,
                avg_inventory_level: t.avg_inventory_level,
                days_evaluated: t.days_evaluated,
                orders_placed: t.orders_placed,
                quantity_ordered: t.quantity_ordered,
            })
        })
        .collect()
}

pub fn daily_rows(results: &[ScenarioResult]) -> Vec<DailyRow> {
    results
        .iter()
        .flat_map(|result| {
            let scenario = result.scenario;
            result.trials.iter().flat_map(move |t| {
                t.daily_samples.iter().map(move |s| DailyRow {
                    environment: scenario.environment,
                    policy: scenario.policy,
                    service_level: scenario.service_level,
                    trial: t.trial,
                    day: s.day,
                    demand: s.demand,
                    fulfilled: s.fulfilled,
                    writeoff: s.writeoff,
                    inventory_after: s.inventory_after,
                    stockout: s.stockout,
                    orders_in_flight_total: s.orders_in_flight.iter().sum(),
                })
            })
        })
        .collect()
}

pub fn in_flight_rows(results: &[ScenarioResult]) -> Vec<InFlightRow> {
    let mut rows = Vec::new();
    for result in results {
        let scenario = result.scenario;
        for t in &result.trials {
            for s in &t.daily_samples {
                for (i, quantity) in s.orders_in_flight.iter().enumerate() {
                    rows.push(InFlightRow {
                        environment: scenario.environment,
                        policy: scenario.policy,
                        service_level: scenario.service_level,
                        trial: t.trial,
                        day: s.day,
                        days_ahead: i + 1,
                        quantity: *quantity,
                    });
                }
            }
        }
    }
    rows
}

/// Writes serializable rows to a CSV file with a header line.
///
/// # Arguments
/// * `file_path` - The path to save the file (e.g., "results/trials.csv").
/// * `rows` - Records to write, one per line.
pub fn write_csv<P: AsRef<Path>, T: Serialize>(file_path: P, rows: &[T]) -> Result<()> {
    let path = file_path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!(rows = rows.len(), path = %path.display(), "CSV written");
    Ok(())
}

pub fn write_trial_summaries<P: AsRef<Path>>(
    file_path: P,
    results: &[ScenarioResult],
) -> Result<()> {
    write_csv(file_path, &trial_rows(results))
}

pub fn write_daily_samples<P: AsRef<Path>>(
    file_path: P,
    results: &[ScenarioResult],
) -> Result<()> {
    write_csv(file_path, &daily_rows(results))
}

pub fn write_orders_in_flight<P: AsRef<Path>>(
    file_path: P,
    results: &[ScenarioResult],
) -> Result<()> {
    write_csv(file_path, &in_flight_rows(results))
}

pub fn write_aggregate_reports<P: AsRef<Path>>(
    file_path: P,
    results: &[ScenarioResult],
) -> Result<()> {
    let rows: Vec<AggregateRow> = results
        .iter()
        .map(|r| AggregateRow::from(&r.report))
        .collect();
    write_csv(file_path, &rows)
}

/// Aggregate reports as pretty-printed JSON, keeping the nested field stats.
pub fn write_reports_json<P: AsRef<Path>>(file_path: P, results: &[ScenarioResult]) -> Result<()> {
    let path = file_path.as_ref();
    let reports: Vec<&AggregateReport> = results.iter().map(|r| &r.report).collect();

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &reports)?;

    info!(reports = reports.len(), path = %path.display(), "JSON written");
    Ok(())
}
