//! # Motor de Jobs
//!
//! Ejecuta consultas largas fuera del thread de la conexión HTTP:
//!
//! - `queue`: cola FIFO compartida entre productores y workers
//! - `pool`: pool fijo de workers que consumen la cola
//! - `storage`: Result Store durable, un archivo por job
//! - `ledger`: contador de IDs y registro de jobs terminados
//! - `manager`: frontera con el servidor (submit, estado, shutdown)
//!
//! ## Endpoints
//!
//! - `GET /api/get_results/:job_id` - Estado y resultado de un job
//! - `GET /api/jobs` - Estado de todos los jobs emitidos
//! - `GET /api/num_jobs` - Jobs pendientes
//! - `GET /api/graceful_shutdown` - Drenar la cola y detener workers

pub mod handlers;
pub mod job;
pub mod ledger;
pub mod manager;
pub mod pool;
pub mod queue;
pub mod storage;

pub use job::{Job, JobId, JobStatus, WorkError, WorkResult};
pub use ledger::{JobCounter, JobLedger};
pub use manager::{JobManager, JobManagerConfig};
pub use pool::WorkerPool;
pub use queue::JobQueue;
pub use storage::{ResultStore, StoreError, StoredResult};
