//! # Stats Webserver
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que responde consultas estadísticas sobre un dataset
//! de nutrición y actividad física. Cada consulta se ejecuta como un job
//! asíncrono: el request recibe un ID al instante y el resultado se
//! consulta después.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y manejo del protocolo HTTP/1.0
//! - `server`: Servidor TCP, un thread por conexión
//! - `router`: Enrutamiento (método + path) a handlers
//! - `commands`: Endpoints de consultas estadísticas
//! - `jobs`: Cola FIFO, pool de workers, Result Store y ledger
//! - `dataset`: Carga del CSV y consultas analíticas
//! - `config`, `logging`, `error`: infraestructura
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use stats_webserver::config::Config;
//! use stats_webserver::dataset::DataIngestor;
//! use stats_webserver::jobs::{JobManager, JobManagerConfig};
//! use stats_webserver::server::{AppState, Server};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let dataset = Arc::new(DataIngestor::load(&config.dataset_path)?);
//! let jobs = JobManager::new(JobManagerConfig::from_config(&config))?;
//!
//! let server = Server::new(config, AppState::new(jobs, dataset));
//! server.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod router;
pub mod server;

pub use error::{Error, Result};
