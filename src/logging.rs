//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing` con dos salidas: stdout y el archivo de log
//! configurado (sin colores ANSI, en modo append). El nivel se controla
//! con `RUST_LOG`.

use crate::config::Config;
use std::fs::OpenOptions;
use std::io;
use std::sync::{Mutex, Once};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "stats_webserver=info";

static INITIALIZE_TRACING: Once = Once::new();

/// Instala el subscriber global. Las llamadas posteriores no hacen nada.
pub fn init(config: &Config) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    INITIALIZE_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let result = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init();

        if let Err(e) = result {
            eprintln!("tracing already initialized: {}", e);
        }
    });

    Ok(())
}
