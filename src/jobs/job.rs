//! # Estructura de Job
//! src/jobs/job.rs
//!
//! Un job es un identificador más una unidad de trabajo diferida que
//! produce un payload (JSON ya serializado) o falla.

use std::fmt;
use thiserror::Error;

/// Identificador de un job.
///
/// Lo asigna el `JobManager` desde un contador monótono que empieza en 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Falla de una unidad de trabajo
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    /// La computación retornó un error
    #[error("{0}")]
    Failed(String),

    /// La computación hizo panic (capturado por el worker)
    #[error("job panicked: {0}")]
    Panicked(String),
}

pub type WorkResult = Result<String, WorkError>;

/// Unidad de trabajo: cualquier closure que produzca un payload
pub type Work = Box<dyn FnOnce() -> WorkResult + Send + 'static>;

/// Un job encolado
pub struct Job {
    id: JobId,
    work: Work,
}

impl Job {
    /// Crea un job a partir de cualquier closure compatible
    pub fn new<F>(id: JobId, work: F) -> Self
    where
        F: FnOnce() -> WorkResult + Send + 'static,
    {
        Self {
            id,
            work: Box::new(work),
        }
    }

    /// ID del job
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Consume el job y ejecuta su trabajo
    pub fn run(self) -> WorkResult {
        (self.work)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Estado de un job visto desde la consulta de status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// El ID nunca fue emitido
    Invalid,

    /// Emitido pero aún sin resultado (en cola o ejecutándose)
    Running,

    /// Completado con el payload exacto que produjo el trabajo
    Done(String),

    /// Completado con error; contiene el mensaje persistido
    Failed(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Invalid => "invalid",
            JobStatus::Running => "running",
            JobStatus::Done(_) => "done",
            JobStatus::Failed(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_run_returns_payload() {
        let job = Job::new(JobId::new(1), || Ok("42".to_string()));

        assert_eq!(job.id(), JobId::new(1));
        assert_eq!(job.run(), Ok("42".to_string()));
    }

    #[test]
    fn test_job_run_returns_error() {
        let job = Job::new(JobId::new(7), || Err(WorkError::Failed("boom".to_string())));

        assert_eq!(job.run(), Err(WorkError::Failed("boom".to_string())));
    }

    #[test]
    fn test_job_id_display() {
        assert_eq!(JobId::new(15).to_string(), "15");
        assert!(JobId::new(2) > JobId::new(1));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(JobStatus::Invalid.as_str(), "invalid");
        assert_eq!(JobStatus::Running.as_str(), "running");
        assert_eq!(JobStatus::Done("{}".into()).as_str(), "done");
        assert_eq!(JobStatus::Failed("x".into()).as_str(), "error");
    }
}
