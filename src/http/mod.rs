//! # Módulo HTTP
//!
//! Implementación mínima del protocolo HTTP/1.0:
//!
//! - Parsing de requests (request line, headers y body JSON)
//! - Construcción de responses
//! - Códigos de estado
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 34\r\n
//! \r\n
//! {"status":"running","job_id":1}
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
