//! # Estado Compartido
//! src/server/state.rs
//!
//! Todo lo que los handlers necesitan, compartido entre los threads de
//! conexión detrás de un `Arc`.

use crate::dataset::DataIngestor;
use crate::jobs::JobManager;
use std::sync::Arc;

pub struct AppState {
    pub jobs: JobManager,
    pub dataset: Arc<DataIngestor>,
}

impl AppState {
    pub fn new(jobs: JobManager, dataset: Arc<DataIngestor>) -> Self {
        Self { jobs, dataset }
    }
}
