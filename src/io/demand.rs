// src/io/demand.rs

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::io::reporting::write_csv;
use crate::model::demand::DemandEnvironment;

/// One day of a demand realization, as exported for plotting.
#[derive(Debug, Clone, Serialize)]
pub struct DemandTraceRow {
    pub day: usize,
    pub realized_demand: u32,
    pub mean_estimate: f64,
    pub std_dev: f64,
}

pub fn demand_trace(environment: &DemandEnvironment) -> Vec<DemandTraceRow> {
    environment
        .days()
        .iter()
        .map(|d| DemandTraceRow {
            day: d.day,
            realized_demand: d.realized_demand,
            mean_estimate: d.mean_estimate,
            std_dev: d.distribution.std_dev(),
        })
        .collect()
}

/// Writes the realized demand and distribution moments of every day.
pub fn write_demand_trace<P: AsRef<Path>>(
    file_path: P,
    environment: &DemandEnvironment,
) -> Result<()> {
    write_csv(file_path, &demand_trace(environment))
}
