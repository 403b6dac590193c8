//! # Cola FIFO de Jobs
//! src/jobs/queue.rs
//!
//! Cola thread-safe sin límite de capacidad. Además de entregar jobs en
//! orden de llegada, lleva la cuenta de los jobs no terminados para que
//! el shutdown pueda esperar a que la cola quede drenada.

use crate::jobs::job::Job;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Estado protegido por el mutex
struct QueueState {
    /// Jobs esperando a un worker
    jobs: VecDeque<Job>,

    /// Jobs encolados cuyo worker aún no llamó a `task_done`
    unfinished: usize,
}

/// Cola FIFO thread-safe
pub struct JobQueue {
    state: Arc<Mutex<QueueState>>,

    /// Notifica a los workers cuando hay nuevos jobs
    available: Arc<Condvar>,

    /// Notifica cuando `unfinished` llega a cero
    drained: Arc<Condvar>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                jobs: VecDeque::new(),
                unfinished: 0,
            })),
            available: Arc::new(Condvar::new()),
            drained: Arc::new(Condvar::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Un panic dentro de un job nunca ocurre con el lock tomado,
        // así que el estado sigue siendo consistente.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Encola un job al final. Nunca bloquea ni falla.
    pub fn enqueue(&self, job: Job) {
        let mut state = self.lock();
        state.jobs.push_back(job);
        state.unfinished += 1;

        self.available.notify_one();
    }

    /// Desencola el job más antiguo, esperando como máximo `timeout`.
    ///
    /// Retorna `None` si no llegó ningún job a tiempo; no es un error,
    /// el worker simplemente revisa su flag de shutdown y reintenta.
    pub fn dequeue(&self, timeout: Duration) -> Option<Job> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();

        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            state = match self.available.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Indica que un job previamente desencolado terminó de procesarse
    /// (ejecutado y persistido).
    pub fn task_done(&self) {
        let mut state = self.lock();
        state.unfinished = state.unfinished.saturating_sub(1);

        if state.unfinished == 0 {
            self.drained.notify_all();
        }
    }

    /// Bloquea hasta que todo job encolado haya sido desencolado y
    /// marcado con `task_done`.
    pub fn wait_drained(&self) {
        let mut state = self.lock();

        while state.unfinished > 0 {
            state = match self.drained.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Jobs encolados que todavía no terminaron (en cola + en ejecución)
    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for JobQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            available: Arc::clone(&self.available),
            drained: Arc::clone(&self.drained),
        }
    }
}
