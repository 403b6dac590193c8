//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.0 y convertirlas a bytes.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use stats_webserver::http::{Response, StatusCode};
//! use serde_json::json;
//!
//! let response = Response::json(&json!({"status": "running", "job_id": 1}));
//! assert_eq!(response.status(), StatusCode::Ok);
//!
//! let bytes = response.to_bytes();
//! // Ahora puedes enviar `bytes` por el socket
//! ```

use super::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Usamos HashMap para evitar duplicados
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body y calcula `Content-Length`
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.headers.insert(
            "Content-Length".to_string(),
            self.body.len().to_string(),
        );
        self
    }

    /// Respuesta JSON 200 OK
    pub fn json(value: &Value) -> Self {
        Self::json_with_status(StatusCode::Ok, value)
    }

    /// Respuesta JSON con un código arbitrario
    pub fn json_with_status(status: StatusCode, value: &Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(&value.to_string())
    }

    /// Respuesta HTML 200 OK
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(body)
    }

    /// Respuesta de error con formato `{"status": "error", "reason": "..."}`
    ///
    /// # Ejemplo
    /// ```
    /// use stats_webserver::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::BadRequest, "Missing field: question");
    /// assert_eq!(response.status(), StatusCode::BadRequest);
    /// ```
    pub fn error(status: StatusCode, reason: &str) -> Self {
        Self::json_with_status(status, &json!({"status": "error", "reason": reason}))
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parsea el body como JSON (útil en tests)
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_with_body() {
        let response = Response::new(StatusCode::Ok).with_body("Hello World");

        assert_eq!(response.body(), b"Hello World");
        assert_eq!(response.headers().get("Content-Length"), Some(&"11".to_string()));
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(&json!({"num_jobs": 0}));

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(
            response.headers().get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(response.body(), br#"{"num_jobs":0}"#);
    }

    #[test]
    fn test_error_response_escapes_reason() {
        let response = Response::error(StatusCode::BadRequest, r#"bad "quote""#);

        assert_eq!(response.status(), StatusCode::BadRequest);
        let body = response.body_json().unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["reason"], r#"bad "quote""#);
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_body("Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_empty_body_response() {
        let text = String::from_utf8(Response::new(StatusCode::Ok).to_bytes()).unwrap();
        assert!(text.ends_with("\r\n\r\n"));
    }
}
