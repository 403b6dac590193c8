//! # Comandos Estadísticos
//! src/commands/stats.rs
//!
//! Endpoints POST que encolan una consulta sobre el dataset y responden
//! de inmediato con el ID del job:
//! - /api/states_mean, /api/state_mean
//! - /api/best5, /api/worst5
//! - /api/global_mean, /api/diff_from_mean, /api/state_diff_from_mean
//! - /api/mean_by_category, /api/state_mean_by_category
//!
//! Body esperado: `{"question": "...", "state": "..."}` (`state` solo
//! donde aplica).

use crate::dataset::Query;
use crate::error::Error;
use crate::http::{Request, Response, StatusCode};
use crate::jobs::WorkError;
use crate::server::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

/// Obtiene un campo string obligatorio del body JSON
fn required_field(body: &Value, name: &str) -> Result<String, Response> {
    body.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            Response::error(
                StatusCode::BadRequest,
                &format!("Missing required field: {}", name),
            )
        })
}

fn json_body(req: &Request) -> Result<Value, Response> {
    req.json_body()
        .map_err(|e| Response::error(StatusCode::BadRequest, &e.to_string()))
}

fn question(req: &Request) -> Result<String, Response> {
    required_field(&json_body(req)?, "question")
}

fn question_and_state(req: &Request) -> Result<(String, String), Response> {
    let body = json_body(req)?;
    Ok((
        required_field(&body, "question")?,
        required_field(&body, "state")?,
    ))
}

/// Encola la consulta y responde `{"status": "running", "job_id": N}`
fn submit(query: Query, state: &AppState) -> Response {
    let dataset = Arc::clone(&state.dataset);
    let name = query.name();

    let submitted = state
        .jobs
        .submit(move || dataset.run(&query).map_err(WorkError::from));

    match submitted {
        Ok(id) => {
            tracing::debug!(job_id = %id, query = name, "query queued");
            Response::json(&json!({"status": "running", "job_id": id.get()}))
        }
        Err(Error::ShuttingDown) => Response::json(&json!({"status": "server down"})),
        Err(e) => Response::error(StatusCode::InternalServerError, &e.to_string()),
    }
}

/// Handlers que solo reciben `question`
macro_rules! question_handler {
    ($(#[$doc:meta])* $name:ident => $variant:ident) => {
        $(#[$doc])*
        pub fn $name(req: &Request, state: &AppState) -> Response {
            match question(req) {
                Ok(question) => submit(Query::$variant { question }, state),
                Err(response) => response,
            }
        }
    };
}

/// Handlers que reciben `question` y `state`
macro_rules! state_handler {
    ($(#[$doc:meta])* $name:ident => $variant:ident) => {
        $(#[$doc])*
        pub fn $name(req: &Request, state: &AppState) -> Response {
            match question_and_state(req) {
                Ok((question, location)) => submit(
                    Query::$variant {
                        question,
                        state: location,
                    },
                    state,
                ),
                Err(response) => response,
            }
        }
    };
}

question_handler!(
    /// Handler para POST /api/states_mean
    states_mean_handler => StatesMean
);
state_handler!(
    /// Handler para POST /api/state_mean
    state_mean_handler => StateMean
);
question_handler!(
    /// Handler para POST /api/best5
    best5_handler => Best5
);
question_handler!(
    /// Handler para POST /api/worst5
    worst5_handler => Worst5
);
question_handler!(
    /// Handler para POST /api/global_mean
    global_mean_handler => GlobalMean
);
question_handler!(
    /// Handler para POST /api/diff_from_mean
    diff_from_mean_handler => DiffFromMean
);
state_handler!(
    /// Handler para POST /api/state_diff_from_mean
    state_diff_from_mean_handler => StateDiffFromMean
);
question_handler!(
    /// Handler para POST /api/mean_by_category
    mean_by_category_handler => MeanByCategory
);
state_handler!(
    /// Handler para POST /api/state_mean_by_category
    state_mean_by_category_handler => StateMeanByCategory
);
