//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./stats_webserver --port 5000 \
//!   --threads 8 \
//!   --results-dir ./results \
//!   --dataset ./nutrition_activity_obesity_usa_subset.csv
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! TP_NUM_OF_THREADS=8 HTTP_PORT=5000 ./stats_webserver
//! ```

use clap::Parser;
use std::num::NonZeroUsize;
use std::thread;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "stats_webserver")]
#[command(about = "Servidor HTTP/1.0 con motor de jobs para consultas estadísticas")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "5000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Workers ===
    /// Número de workers del pool (por defecto, los núcleos disponibles)
    #[arg(long, env = "TP_NUM_OF_THREADS")]
    pub threads: Option<usize>,

    /// Timeout del dequeue de cada worker en milisegundos
    #[arg(long = "poll-timeout-ms", default_value = "1000", env = "POLL_TIMEOUT_MS")]
    pub poll_timeout_ms: u64,

    // === Storage ===
    /// Directorio donde se persisten los resultados de los jobs
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: String,

    /// Ruta del CSV con el dataset
    #[arg(
        long = "dataset",
        default_value = "./nutrition_activity_obesity_usa_subset.csv",
        env = "DATASET_PATH"
    )]
    pub dataset_path: String,

    // === Logging ===
    /// Archivo de log (se agrega al final)
    #[arg(long = "log-file", default_value = "webserver.log", env = "LOG_FILE")]
    pub log_file: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use stats_webserver::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:5000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Número efectivo de workers: `--threads` o los núcleos disponibles
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port must be > 0".to_string());
        }
        if self.threads == Some(0) {
            return Err("Worker threads must be >= 1".to_string());
        }
        if self.poll_timeout_ms == 0 {
            return Err("Poll timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            threads = self.worker_threads(),
            poll_timeout_ms = self.poll_timeout_ms,
            results_dir = %self.results_dir,
            dataset = %self.dataset_path,
            log_file = %self.log_file,
            "configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            threads: None,
            poll_timeout_ms: 1000,
            results_dir: "./results".to_string(),
            dataset_path: "./nutrition_activity_obesity_usa_subset.csv".to_string(),
            log_file: "webserver.log".to_string(),
        }
    }
}
