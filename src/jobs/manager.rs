//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Frontera entre el servidor HTTP y el motor: asigna IDs, encola,
//! responde consultas de estado y coordina el graceful shutdown.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::jobs::job::{Job, JobId, JobStatus, WorkResult};
use crate::jobs::ledger::{JobCounter, JobLedger};
use crate::jobs::pool::WorkerPool;
use crate::jobs::queue::JobQueue;
use crate::jobs::storage::{ResultStore, StoredResult};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Razón reportada cuando un job falló y no quedó registro en disco
const UNPERSISTED: &str = "result could not be persisted";

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Número de workers del pool
    pub threads: usize,

    /// Directorio del Result Store
    pub results_dir: PathBuf,

    /// Timeout del dequeue de cada worker
    pub poll_timeout: Duration,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            results_dir: PathBuf::from("./results"),
            poll_timeout: Duration::from_millis(1000),
        }
    }
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            threads: config.worker_threads(),
            results_dir: PathBuf::from(&config.results_dir),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
        }
    }
}

/// Estado de submit: el contador y el flag comparten lock
struct Submission {
    counter: JobCounter,
    closed: bool,
}

/// Gestor central de jobs
pub struct JobManager {
    submission: Mutex<Submission>,

    /// Handle de la cola del pool, usado para encolar sin tomar el pool
    queue: JobQueue,

    pool: Mutex<WorkerPool>,
    store: ResultStore,
    ledger: JobLedger,
    shut_down: AtomicBool,
}

impl JobManager {
    /// Crea el Result Store y arranca el pool de workers
    pub fn new(config: JobManagerConfig) -> Result<Self> {
        let store = ResultStore::new(&config.results_dir)?;
        tracing::debug!(results_dir = %store.dir().display(), "result store opened");
        let ledger = JobLedger::new();
        let pool = WorkerPool::new(
            config.threads,
            store.clone(),
            ledger.clone(),
            config.poll_timeout,
        )?;

        Ok(Self {
            submission: Mutex::new(Submission {
                counter: JobCounter::new(),
                closed: false,
            }),
            queue: pool.queue().clone(),
            pool: Mutex::new(pool),
            store,
            ledger,
            shut_down: AtomicBool::new(false),
        })
    }

    fn submission(&self) -> MutexGuard<'_, Submission> {
        self.submission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Encola un nuevo job y retorna su ID.
    ///
    /// El ID se confirma solo después de encolar, con el lock tomado, así
    /// que los IDs son consecutivos y llegan a la cola en orden.
    pub fn submit<F>(&self, work: F) -> Result<JobId>
    where
        F: FnOnce() -> WorkResult + Send + 'static,
    {
        let mut submission = self.submission();
        if submission.closed {
            return Err(Error::ShuttingDown);
        }

        let id = submission.counter.peek();
        self.queue.enqueue(Job::new(id, work));
        submission.counter.advance();

        tracing::debug!(job_id = %id, "job submitted");
        Ok(id)
    }

    /// Mayor ID emitido hasta ahora
    pub fn highest_issued(&self) -> u64 {
        self.submission().counter.highest_issued()
    }

    /// Consulta el estado de un job.
    ///
    /// El Result Store solo se lee cuando el ledger marca el ID como
    /// terminado: el directorio puede traer registros de una ejecución
    /// anterior con los mismos IDs.
    pub fn status(&self, id: u64) -> Result<JobStatus> {
        if id == 0 || id > self.highest_issued() {
            return Ok(JobStatus::Invalid);
        }

        let id = JobId::new(id);
        if !self.ledger.is_complete(id) {
            return Ok(JobStatus::Running);
        }

        match self.store.get(id)? {
            Some(StoredResult::Failure(reason)) => Ok(JobStatus::Failed(reason)),
            Some(StoredResult::Payload(payload)) if !self.ledger.is_failed(id) => {
                Ok(JobStatus::Done(payload))
            }
            // Falló también la escritura del registro de falla
            _ => Ok(JobStatus::Failed(UNPERSISTED.to_string())),
        }
    }

    /// Jobs emitidos que aún no terminaron
    pub fn num_pending(&self) -> u64 {
        let highest = self.highest_issued();
        highest.saturating_sub(self.ledger.completed_count() as u64)
    }

    /// Estado resumido de cada ID emitido, según el ledger
    pub fn overview(&self) -> Vec<(JobId, &'static str)> {
        (1..=self.highest_issued())
            .map(JobId::new)
            .map(|id| {
                let label = if self.ledger.is_failed(id) {
                    "error"
                } else if self.ledger.is_complete(id) {
                    "done"
                } else {
                    "running"
                };
                (id, label)
            })
            .collect()
    }

    /// Indica si ya se pidió el shutdown
    pub fn is_shutting_down(&self) -> bool {
        self.submission().closed
    }

    /// Indica si el pool ya se detuvo por completo
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Graceful shutdown: deja de aceptar jobs, espera a que se drene la
    /// cola y detiene los workers.
    pub fn shutdown(&self) {
        self.submission().closed = true;

        let mut pool = self
            .pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.is_shut_down() {
            pool.shutdown();
            self.shut_down.store(true, Ordering::SeqCst);
        }
    }

    pub fn threads(&self) -> usize {
        self.pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::job::WorkError;
    use std::sync::mpsc;

    fn manager(threads: usize) -> (tempfile::TempDir, JobManager) {
        let dir = tempfile::tempdir().unwrap();
        let config = JobManagerConfig {
            threads,
            results_dir: dir.path().join("results"),
            poll_timeout: Duration::from_millis(20),
        };
        (dir, JobManager::new(config).unwrap())
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let (_dir, manager) = manager(2);

        let a = manager.submit(|| Ok("a".into())).unwrap();
        let b = manager.submit(|| Ok("b".into())).unwrap();

        assert_eq!(a, JobId::new(1));
        assert_eq!(b, JobId::new(2));
        assert_eq!(manager.highest_issued(), 2);
        manager.shutdown();
    }

    #[test]
    fn test_status_invalid_for_unissued_ids() {
        let (_dir, manager) = manager(1);

        assert_eq!(manager.status(0).unwrap(), JobStatus::Invalid);
        assert_eq!(manager.status(1).unwrap(), JobStatus::Invalid);

        manager.submit(|| Ok("x".into())).unwrap();
        assert_eq!(manager.status(2).unwrap(), JobStatus::Invalid);
        manager.shutdown();
    }

    #[test]
    fn test_status_running_then_done() {
        let (_dir, manager) = manager(1);
        let (release, gate) = mpsc::channel::<()>();

        let id = manager
            .submit(move || {
                gate.recv().map_err(|e| WorkError::Failed(e.to_string()))?;
                Ok("42".to_string())
            })
            .unwrap();

        assert_eq!(manager.status(id.get()).unwrap(), JobStatus::Running);
        assert_eq!(manager.num_pending(), 1);

        release.send(()).unwrap();
        manager.shutdown();

        assert_eq!(manager.status(id.get()).unwrap(), JobStatus::Done("42".into()));
        assert_eq!(manager.num_pending(), 0);
    }

    #[test]
    fn test_status_failed() {
        let (_dir, manager) = manager(1);

        let id = manager
            .submit(|| Err(WorkError::Failed("unknown question".into())))
            .unwrap();
        manager.shutdown();

        assert_eq!(
            manager.status(id.get()).unwrap(),
            JobStatus::Failed("unknown question".into())
        );
        assert_eq!(manager.overview(), vec![(id, "error")]);
    }

    #[test]
    fn test_store_failure_marks_job_failed_and_pool_continues() {
        let (dir, manager) = manager(1);
        let results = dir.path().join("results");

        // El primer job deja al store sin directorio: ni el payload ni el
        // registro de falla se pueden escribir
        let removed = results.clone();
        let first = manager
            .submit(move || {
                std::fs::remove_dir_all(&removed).map_err(|e| WorkError::Failed(e.to_string()))?;
                Ok("lost".to_string())
            })
            .unwrap();
        let restored = results.clone();
        let second = manager
            .submit(move || {
                std::fs::create_dir_all(&restored).map_err(|e| WorkError::Failed(e.to_string()))?;
                Ok("kept".to_string())
            })
            .unwrap();
        manager.shutdown();

        assert!(manager.is_shut_down());
        assert_eq!(
            manager.status(first.get()).unwrap(),
            JobStatus::Failed("result could not be persisted".into())
        );
        assert_eq!(
            manager.status(second.get()).unwrap(),
            JobStatus::Done("kept".into())
        );
        assert_eq!(manager.overview(), vec![(first, "error"), (second, "done")]);
        assert_eq!(manager.num_pending(), 0);
    }

    #[test]
    fn test_overview_labels() {
        let (_dir, manager) = manager(2);

        manager.submit(|| Ok("1".into())).unwrap();
        manager.submit(|| Ok("2".into())).unwrap();
        manager.shutdown();

        assert_eq!(
            manager.overview(),
            vec![(JobId::new(1), "done"), (JobId::new(2), "done")]
        );
    }

    #[test]
    fn test_submit_after_shutdown_rejected() {
        let (_dir, manager) = manager(1);

        manager.shutdown();

        assert!(manager.is_shutting_down());
        assert!(manager.is_shut_down());
        assert!(matches!(
            manager.submit(|| Ok(String::new())),
            Err(Error::ShuttingDown)
        ));
        assert_eq!(manager.highest_issued(), 0);
    }

    #[test]
    fn test_second_shutdown_is_noop() {
        let (_dir, manager) = manager(1);
        manager.shutdown();
        manager.shutdown();
        assert!(manager.is_shut_down());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.threads = Some(3);
        config.results_dir = "/tmp/results".to_string();
        config.poll_timeout_ms = 250;

        let manager_config = JobManagerConfig::from_config(&config);
        assert_eq!(manager_config.threads, 3);
        assert_eq!(manager_config.results_dir, PathBuf::from("/tmp/results"));
        assert_eq!(manager_config.poll_timeout, Duration::from_millis(250));
    }
}
