//! solvecam entrypoint: live camera view and plate-solve console for a
//! networked astro camera.

use anyhow::{Context, Result};
use clap::Parser;
use solvecam::config::AppConfig;
use solvecam::doctor::doctor_report;
use solvecam::telemetry::init_tracing;
use solvecam::{init_logging, log_debug, log_file_path, ui, App};

fn main() -> Result<()> {
    let mut config = AppConfig::parse();
    if config.doctor {
        println!("{}", doctor_report(&config, true).render());
        return Ok(());
    }

    config.validate()?;
    init_logging(&config);
    let trace_path = init_tracing(&config);
    log_debug("=== solvecam started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));
    if let Some(path) = trace_path {
        log_debug(&format!("Trace file: {path:?}"));
    }

    let mut app = App::new(config).context("failed to set up camera client")?;
    let result = ui::run_app(&mut app);
    let counters = app.solve_counters();
    log_debug(&format!(
        "=== solvecam exiting: {} attempts, {} solved, {} failed ===",
        counters.started, counters.solved, counters.failed
    ));
    result
}
