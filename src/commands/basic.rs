//! # Comandos Básicos
//! src/commands/basic.rs
//!
//! - / y /index: listado de rutas registradas

use crate::http::{Request, Response};
use crate::router;
use crate::server::AppState;

/// Handler para GET / y GET /index
///
/// Devuelve un HTML mínimo con un `<p>` por ruta registrada.
pub fn index_handler(_req: &Request, _state: &AppState) -> Response {
    let mut body = String::from(
        "Hello, World!\n Interact with the webserver using one of the defined routes:\n",
    );

    for (method, pattern) in router::api_router().routes() {
        body.push_str(&format!(
            "<p>Endpoint: \"{}\" Methods: \"{}\"</p>",
            pattern,
            method.as_str()
        ));
    }

    Response::html(&body)
}
