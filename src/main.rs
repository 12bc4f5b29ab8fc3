use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use safety_stock_sim::io::{demand, reporting};
use safety_stock_sim::simulation::runner::{build_environment, run_experiment};
use safety_stock_sim::SimulationConfig;
use tracing::info;

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    // 1. SETUP CONFIGURATION
    // Optional first argument: JSON config. Second: output directory.
    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimulationConfig::from_json_file(&path)?,
        None => SimulationConfig::default(),
    };
    config.validate()?;
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "results".to_string()));

    info!(
        sim_days = config.sim_days,
        histo_days = config.histo_days,
        lead_time = config.lead_time,
        trials = config.n_simulations,
        environments = config.environments.len(),
        policies = config.policies.len(),
        "simulating reorder policies across demand environments"
    );

    // 2. RUN EVERY SCENARIO
    let results = run_experiment(&config)?;

    // 3. EXPORT RESULTS
    fs::create_dir_all(&output_dir)?;
    reporting::write_trial_summaries(output_dir.join("trials.csv"), &results)?;
    reporting::write_daily_samples(output_dir.join("daily.csv"), &results)?;
    reporting::write_orders_in_flight(output_dir.join("in_flight.csv"), &results)?;
    reporting::write_aggregate_reports(output_dir.join("aggregate.csv"), &results)?;
    reporting::write_reports_json(output_dir.join("aggregate.json"), &results)?;

    // Demand seen by trial 0 of every environment; all policies shared it.
    for &kind in &config.environments {
        let environment = build_environment(&config, kind, 0)?;
        demand::write_demand_trace(output_dir.join(format!("demand_{kind}.csv")), &environment)?;
    }

    info!(scenarios = results.len(), output = %output_dir.display(), "simulation complete");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
