//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Implementa los endpoints de consulta y control del motor:
//! - /api/get_results/:job_id
//! - /api/jobs
//! - /api/num_jobs
//! - /api/graceful_shutdown

use crate::http::{Request, Response, StatusCode};
use crate::jobs::JobStatus;
use crate::server::AppState;
use serde_json::{json, Map, Value};

/// Handler para GET /api/get_results/:job_id
///
/// # Ejemplo de response
/// ```json
/// {"status": "done", "data": {"Ohio": 30.5}}
/// ```
pub fn get_results_handler(req: &Request, state: &AppState) -> Response {
    let job_id = match req.path_param("job_id").map(str::parse::<u64>) {
        Some(Ok(id)) => id,
        _ => {
            return Response::error(StatusCode::BadRequest, "Invalid job_id");
        }
    };

    let status = match state.jobs.status(job_id) {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(job_id, error = %e, "failed to read result");
            return Response::error(StatusCode::InternalServerError, &e.to_string());
        }
    };

    match status {
        JobStatus::Invalid => Response::json(&json!({
            "status": "error",
            "reason": "Invalid job_id"
        })),
        JobStatus::Running => Response::json(&json!({"status": "running"})),
        JobStatus::Done(payload) => {
            // Los resultados son JSON; cualquier otro payload se envía como string
            let data = serde_json::from_str(&payload).unwrap_or(Value::String(payload));
            Response::json(&json!({"status": "done", "data": data}))
        }
        JobStatus::Failed(reason) => Response::json(&json!({
            "status": "error",
            "reason": reason
        })),
    }
}

/// Handler para GET /api/jobs
///
/// # Ejemplo de response
/// ```json
/// {"status": "done", "data": [{"1": "done"}, {"2": "running"}]}
/// ```
pub fn jobs_handler(_req: &Request, state: &AppState) -> Response {
    let data: Vec<Value> = state
        .jobs
        .overview()
        .into_iter()
        .map(|(id, label)| {
            let mut entry = Map::new();
            entry.insert(id.to_string(), Value::from(label));
            Value::Object(entry)
        })
        .collect();

    Response::json(&json!({"status": "done", "data": data}))
}

/// Handler para GET /api/num_jobs
pub fn num_jobs_handler(_req: &Request, state: &AppState) -> Response {
    Response::json(&json!({"num_jobs": state.jobs.num_pending()}))
}

/// Handler para GET /api/graceful_shutdown
///
/// Bloquea hasta que la cola se drena y los workers terminan.
pub fn graceful_shutdown_handler(_req: &Request, state: &AppState) -> Response {
    tracing::info!("graceful shutdown requested");
    state.jobs.shutdown();
    Response::json(&json!({"status": "shutting down server"}))
}
