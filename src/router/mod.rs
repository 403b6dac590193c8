//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler(&Request, &AppState) → Response
//! ```
//!
//! Los patrones admiten segmentos variables con `:nombre`
//! (ej: `/api/get_results/:job_id`). Si el path no coincide con ninguna
//! ruta se responde 404; si coincide pero con otro método, 405.

use crate::commands;
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::handlers as job_handlers;
use crate::server::AppState;
use std::collections::HashMap;

/// Un handler recibe el request y el estado compartido del servidor
pub type Handler = fn(&Request, &AppState) -> Response;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    handler: Handler,
}

impl Route {
    fn new(method: Method, pattern: &str, handler: Handler) -> Self {
        let segments = split_path(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            method,
            pattern: pattern.to_string(),
            segments,
            handler,
        }
    }

    /// Si el path coincide, retorna los parámetros capturados
    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        Some(params)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Router que mapea rutas a handlers
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use stats_webserver::http::{Method, Request, Response};
    /// use stats_webserver::router::Router;
    /// use stats_webserver::server::AppState;
    /// use serde_json::json;
    ///
    /// fn hello_handler(_req: &Request, _state: &AppState) -> Response {
    ///     Response::json(&json!({"message": "Hello"}))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", hello_handler);
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler) {
        self.routes.push(Route::new(method, pattern, handler));
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    pub fn route(&self, request: &Request, state: &AppState) -> Response {
        let path = request.path();
        let mut path_exists = false;

        for route in &self.routes {
            let Some(params) = route.matches(path) else {
                continue;
            };

            if route.method != request.method() {
                path_exists = true;
                continue;
            }

            let request = request.with_path_params(params);
            let mut response = (route.handler)(&request, state);
            self.add_common_headers(&mut response);
            return response;
        }

        let mut response = if path_exists {
            Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method {} not allowed for {}", request.method().as_str(), path),
            )
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        };
        self.add_common_headers(&mut response);
        response
    }

    /// Lista `(método, patrón)` de las rutas registradas, en orden de registro
    pub fn routes(&self) -> Vec<(Method, &str)> {
        self.routes
            .iter()
            .map(|route| (route.method, route.pattern.as_str()))
            .collect()
    }

    fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Server", "StatsWebserver/0.1");
        response.add_header("Connection", "close");
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Router con todos los endpoints de la API
pub fn api_router() -> Router {
    let mut router = Router::new();

    router.register(Method::POST, "/api/states_mean", commands::states_mean_handler);
    router.register(Method::POST, "/api/state_mean", commands::state_mean_handler);
    router.register(Method::POST, "/api/best5", commands::best5_handler);
    router.register(Method::POST, "/api/worst5", commands::worst5_handler);
    router.register(Method::POST, "/api/global_mean", commands::global_mean_handler);
    router.register(Method::POST, "/api/diff_from_mean", commands::diff_from_mean_handler);
    router.register(
        Method::POST,
        "/api/state_diff_from_mean",
        commands::state_diff_from_mean_handler,
    );
    router.register(Method::POST, "/api/mean_by_category", commands::mean_by_category_handler);
    router.register(
        Method::POST,
        "/api/state_mean_by_category",
        commands::state_mean_by_category_handler,
    );

    router.register(Method::GET, "/api/get_results/:job_id", job_handlers::get_results_handler);
    router.register(Method::GET, "/api/jobs", job_handlers::jobs_handler);
    router.register(Method::GET, "/api/num_jobs", job_handlers::num_jobs_handler);
    router.register(
        Method::GET,
        "/api/graceful_shutdown",
        job_handlers::graceful_shutdown_handler,
    );

    router.register(Method::GET, "/", commands::index_handler);
    router.register(Method::GET, "/index", commands::index_handler);

    router
}
