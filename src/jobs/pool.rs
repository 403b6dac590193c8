//! # Pool de Workers
//! src/jobs/pool.rs
//!
//! Pool de tamaño fijo que comparte una `JobQueue`. Cada worker es un
//! thread del sistema que desencola con timeout, ejecuta el trabajo,
//! persiste el resultado y marca el job en el ledger.
//!
//! El timeout del dequeue es lo único que permite a un worker notar el
//! shutdown: no hay señal de cancelación sobre la cola.

use crate::jobs::job::{Job, JobId, WorkError, WorkResult};
use crate::jobs::ledger::JobLedger;
use crate::jobs::queue::JobQueue;
use crate::jobs::storage::ResultStore;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Todo lo que un worker necesita para procesar jobs
#[derive(Clone)]
struct WorkerContext {
    queue: JobQueue,
    store: ResultStore,
    ledger: JobLedger,
    poll_timeout: Duration,
}

/// Handle de un worker en ejecución
struct Worker {
    name: String,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(name: String, context: WorkerContext) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(&thread_name, &context, &flag))?;

        Ok(Self {
            name,
            shutdown,
            handle: Some(handle),
        })
    }

    fn request_stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(worker = %self.name, "worker thread panicked");
            }
        }
    }
}

/// Loop principal del worker: RUNNING hasta ver la cola vacía con el
/// flag de shutdown activo.
fn worker_loop(name: &str, context: &WorkerContext, shutdown: &AtomicBool) {
    tracing::debug!(worker = name, "worker started");

    loop {
        match context.queue.dequeue(context.poll_timeout) {
            Some(job) => {
                process(name, context, job);
                context.queue.task_done();
            }
            None => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }

    tracing::debug!(worker = name, "worker stopped");
}

/// Ejecuta un job y persiste su resultado. Ninguna falla sale de aquí.
fn process(name: &str, context: &WorkerContext, job: Job) {
    let id = job.id();
    tracing::debug!(worker = name, job_id = %id, "picked up job");

    match execute(job) {
        Ok(payload) => match context.store.put(id, &payload) {
            Ok(()) => {
                context.ledger.mark_complete(id);
                tracing::debug!(worker = name, job_id = %id, "job done");
            }
            Err(e) => {
                tracing::error!(worker = name, job_id = %id, error = %e, "cannot persist result");
                record_failure(context, id, &format!("cannot persist result: {}", e));
            }
        },
        Err(e) => {
            tracing::warn!(worker = name, job_id = %id, error = %e, "job failed");
            record_failure(context, id, &e.to_string());
        }
    }
}

fn record_failure(context: &WorkerContext, id: JobId, reason: &str) {
    if let Err(e) = context.store.put_failure(id, reason) {
        tracing::error!(job_id = %id, error = %e, "cannot persist failure record");
    }
    context.ledger.mark_failed(id);
}

/// Corre el trabajo capturando panics
fn execute(job: Job) -> WorkResult {
    match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
        Ok(result) => result,
        Err(payload) => Err(WorkError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Pool de workers de tamaño fijo
pub struct WorkerPool {
    queue: JobQueue,
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Crea el pool y arranca inmediatamente `threads` workers
    pub fn new(
        threads: usize,
        store: ResultStore,
        ledger: JobLedger,
        poll_timeout: Duration,
    ) -> io::Result<Self> {
        let queue = JobQueue::new();
        let context = WorkerContext {
            queue: queue.clone(),
            store,
            ledger,
            poll_timeout,
        };

        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(threads),
        };

        for i in 0..threads {
            // Si falla a mitad, Drop detiene los workers ya creados
            let worker = Worker::spawn(format!("worker-{}", i), context.clone())?;
            pool.workers.push(worker);
        }

        tracing::info!(threads, "worker pool started");
        Ok(pool)
    }

    /// Encola un job y retorna de inmediato
    pub fn submit(&self, job: Job) {
        self.queue.enqueue(job);
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Espera a que se drene la cola y detiene todos los workers.
    ///
    /// Los jobs enviados antes de la llamada quedan ejecutados y
    /// persistidos cuando retorna.
    pub fn shutdown(&mut self) {
        tracing::info!(pending = self.queue.unfinished(), "draining job queue");
        self.queue.wait_drained();
        self.stop_workers();
        tracing::info!("worker pool stopped");
    }

    fn stop_workers(&mut self) {
        for worker in &self.workers {
            worker.request_stop();
        }
        for worker in &mut self.workers {
            worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Los workers solo salen con la cola vacía, así que lo encolado
        // igual se ejecuta antes del join.
        self.stop_workers();
    }
}
