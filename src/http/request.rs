//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 desde cero. Los endpoints de la API reciben JSON en el
//! body, así que además de la request line y los headers se conserva el
//! body completo según `Content-Length`.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /api/states_mean HTTP/1.0\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 27\r\n
//! \r\n
//! {"question": "Percent..."}
//! ```

use serde_json::Value;
use std::collections::HashMap;

/// Separador entre headers y body
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Consultas de estado y resultados
    GET,

    /// POST - Envío de una consulta con body JSON
    POST,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no es soportado
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, POST)
    method: Method,

    /// Path sin query string (ej: "/api/get_results/3")
    path: String,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Parámetros extraídos del path por el router (ej: {"job_id": "3"})
    path_params: HashMap<String, String>,

    /// Body crudo, vacío si no hay `Content-Length`
    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Formato inválido de la request line
    InvalidRequestLine,

    /// Método HTTP no soportado
    UnsupportedMethod(String),

    /// Versión HTTP incorrecta (debe ser HTTP/1.0 o HTTP/1.1)
    InvalidHttpVersion(String),

    /// Header sin el separador `:`
    InvalidHeader(String),

    /// Request vacío
    EmptyRequest,

    /// El body no es JSON válido
    InvalidJson(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidHttpVersion(v) => write!(f, "Invalid HTTP version: {}", v),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::EmptyRequest => write!(f, "Empty request"),
            ParseError::InvalidJson(e) => write!(f, "Invalid JSON body: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Posición donde termina la sección de headers (incluyendo `\r\n\r\n`)
pub fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}

/// Lee `Content-Length` de un bloque de headers crudo (0 si no está)
pub fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use stats_webserver::http::Request;
    ///
    /// let raw = b"GET /api/num_jobs HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/api/num_jobs");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let (head, body) = match header_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;
        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;
        let (method, path) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            path_params: HashMap::new(),
            body: body.to_vec(),
        })
    }

    /// Formato: `POST /path HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        // La API no usa query strings; se descartan
        let path = parts[1]
            .split_once('?')
            .map_or(parts[1], |(path, _)| path)
            .to_string();

        let version = parts[2];
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        Ok((method, path))
    }

    /// Cada header tiene formato: "Name: Value"
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    /// Copia del request con los parámetros de path resueltos por el router
    pub fn with_path_params(&self, params: HashMap<String, String>) -> Self {
        Self {
            path_params: params,
            ..self.clone()
        }
    }

    /// Obtiene el método HTTP
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path (sin query string)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Obtiene un parámetro de path, ej: `:job_id`
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(|s| s.as_str())
    }

    /// Obtiene el body crudo
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parsea el body como JSON
    pub fn json_body(&self) -> Result<Value, ParseError> {
        serde_json::from_slice(&self.body).map_err(|e| ParseError::InvalidJson(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_strips_query_string() {
        let raw = b"GET /api/jobs?verbose=1 HTTP/1.1\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/api/jobs");
    }

    #[test]
    fn test_parse_headers_case_insensitive() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:5000\r\nContent-Type: application/json\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("host"), Some("localhost:5000"));
        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_parse_post_json_body() {
        let raw = b"POST /api/state_mean HTTP/1.0\r\nContent-Length: 37\r\n\r\n{\"question\": \"q\", \"state\": \"Ohio\"}";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::POST);
        let json = request.json_body().unwrap();
        assert_eq!(json["question"], "q");
        assert_eq!(json["state"], "Ohio");
    }

    #[test]
    fn test_invalid_json_body() {
        let raw = b"POST /api/best5 HTTP/1.0\r\n\r\nnot json";
        let request = Request::parse(raw).unwrap();

        assert!(matches!(request.json_body(), Err(ParseError::InvalidJson(_))));
    }

    #[test]
    fn test_unsupported_method() {
        let raw = b"DELETE / HTTP/1.0\r\n\r\n";
        let result = Request::parse(raw);
        assert!(matches!(result, Err(ParseError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_invalid_version() {
        let raw = b"GET / HTTP/2.0\r\n\r\n";
        let result = Request::parse(raw);
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        let result = Request::parse(b"");
        assert!(matches!(result, Err(ParseError::EmptyRequest)));
    }

    #[test]
    fn test_invalid_request_line() {
        let raw = b"GET\r\n\r\n";
        let result = Request::parse(raw);
        assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
    }

    #[test]
    fn test_header_end_and_content_length() {
        let raw = b"POST / HTTP/1.0\r\ncontent-length: 12\r\n\r\n{\"a\": true}";

        let end = header_end(raw).unwrap();
        assert_eq!(&raw[end..], b"{\"a\": true}");
        assert_eq!(content_length(&raw[..end]), 12);
        assert_eq!(header_end(b"GET / HTTP/1.0\r\n"), None);
        assert_eq!(content_length(b"GET / HTTP/1.0\r\n\r\n"), 0);
    }

    #[test]
    fn test_path_params() {
        let request = Request::parse(b"GET /api/get_results/3 HTTP/1.0\r\n\r\n").unwrap();
        let mut params = HashMap::new();
        params.insert("job_id".to_string(), "3".to_string());

        let request = request.with_path_params(params);
        assert_eq!(request.path_param("job_id"), Some("3"));
        assert_eq!(request.path_param("other"), None);
    }
}
