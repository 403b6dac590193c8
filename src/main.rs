//! # Stats Webserver - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, carga el dataset, arranca el pool de workers
//! y atiende requests hasta el graceful shutdown.

use stats_webserver::config::Config;
use stats_webserver::dataset::DataIngestor;
use stats_webserver::error::{Error, Result};
use stats_webserver::jobs::{JobManager, JobManagerConfig};
use stats_webserver::logging;
use stats_webserver::server::{AppState, Server};
use std::sync::Arc;

fn run(config: Config) -> Result<()> {
    config.validate().map_err(Error::Config)?;
    logging::init(&config)?;
    config.log_summary();

    let dataset = Arc::new(DataIngestor::load(&config.dataset_path)?);
    let jobs = JobManager::new(JobManagerConfig::from_config(&config))?;
    tracing::info!(workers = jobs.threads(), "job manager ready");

    let server = Server::new(config, AppState::new(jobs, dataset));
    server.run()?;

    Ok(())
}

fn main() {
    let config = Config::new();

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "fatal error");
        eprintln!("Error fatal: {}", e);
        std::process::exit(1);
    }
}
