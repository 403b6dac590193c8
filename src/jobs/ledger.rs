//! # Ledger de Jobs
//! src/jobs/ledger.rs
//!
//! Contador de IDs emitidos y registro de jobs completados.

use crate::jobs::job::JobId;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Contador de IDs, empieza en 1
///
/// No es atómico por sí mismo: el `JobManager` lo mantiene dentro de un
/// mutex durante todo el submit para que el orden de IDs coincida con el
/// orden de la cola.
#[derive(Debug)]
pub struct JobCounter {
    next: u64,
}

impl JobCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// ID que recibirá el próximo submit
    pub fn peek(&self) -> JobId {
        JobId::new(self.next)
    }

    /// Confirma el ID entregado por `peek`
    pub fn advance(&mut self) {
        self.next += 1;
    }

    /// Mayor ID emitido hasta ahora (0 si ninguno)
    pub fn highest_issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for JobCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct LedgerData {
    completed: BTreeSet<JobId>,
    failed: BTreeSet<JobId>,
}

/// Conjunto monótono de jobs completados (con o sin éxito)
#[derive(Debug, Clone, Default)]
pub struct JobLedger {
    inner: Arc<Mutex<LedgerData>>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerData> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registra un job terminado con éxito
    pub fn mark_complete(&self, id: JobId) {
        self.lock().completed.insert(id);
    }

    /// Registra un job terminado con error
    pub fn mark_failed(&self, id: JobId) {
        let mut data = self.lock();
        data.completed.insert(id);
        data.failed.insert(id);
    }

    pub fn is_complete(&self, id: JobId) -> bool {
        self.lock().completed.contains(&id)
    }

    pub fn is_failed(&self, id: JobId) -> bool {
        self.lock().failed.contains(&id)
    }

    pub fn completed_count(&self) -> usize {
        self.lock().completed.len()
    }
}
