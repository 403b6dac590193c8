//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor TCP que maneja múltiples conexiones simultáneas usando
//! threads. Cada conexión se procesa en su propio thread; el listener es
//! no bloqueante para poder salir del loop tras el graceful shutdown.

use crate::config::Config;
use crate::http::request::{content_length, header_end};
use crate::http::{Request, Response, StatusCode};
use crate::router::{self, Router};
use crate::server::AppState;
use serde_json::json;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pausa entre intentos de accept cuando no hay conexiones pendientes
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Tiempo máximo esperando bytes del cliente
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Límite de tamaño de un request (headers + body)
const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Endpoints que siguen respondiendo durante el shutdown
const SHUTDOWN_EXEMPT: &[&str] = &["/api/num_jobs", "/api/graceful_shutdown"];

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    config: Config,
    router: Arc<Router>,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: Config, state: AppState) -> Self {
        Self {
            config,
            router: Arc::new(router::api_router()),
            state: Arc::new(state),
        }
    }

    /// Escucha en la dirección configurada hasta el graceful shutdown
    pub fn run(&self) -> io::Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)?;
        tracing::info!(%address, "server listening");

        self.serve(listener)
    }

    /// Acepta conexiones de un listener ya abierto.
    ///
    /// Retorna cuando el pool de workers terminó su shutdown y todas las
    /// conexiones en curso respondieron.
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        listener.set_nonblocking(true)?;
        let mut connections: Vec<JoinHandle<()>> = Vec::new();

        while !self.state.jobs.is_shut_down() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    connections.retain(|handle| !handle.is_finished());
                    connections.push(self.spawn_connection(stream, peer)?);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                }
            }
        }

        for handle in connections {
            if handle.join().is_err() {
                tracing::error!("connection thread panicked");
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) -> io::Result<JoinHandle<()>> {
        // El stream aceptado hereda el modo no bloqueante del listener
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let router = Arc::clone(&self.router);
        let state = Arc::clone(&self.state);

        thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                if let Err(e) = handle_connection(stream, &router, &state) {
                    tracing::warn!(%peer, error = %e, "connection error");
                }
            })
    }
}

/// Lo leído de una conexión
enum Incoming {
    /// Request completo; vacío si el cliente cerró sin enviar nada
    Complete(Vec<u8>),

    /// Headers o `Content-Length` por encima de `MAX_REQUEST_SIZE`
    TooLarge,
}

/// Lee un request completo: headers y luego el body según `Content-Length`
fn read_request(stream: &mut TcpStream) -> io::Result<Incoming> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut expected = None;

    loop {
        if let Some(total) = expected {
            if buffer.len() >= total {
                break;
            }
        }

        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);

        if buffer.len() > MAX_REQUEST_SIZE {
            return Ok(Incoming::TooLarge);
        }

        if expected.is_none() {
            if let Some(end) = header_end(&buffer) {
                // Se rechaza sin esperar un body que nunca va a caber
                match end.checked_add(content_length(&buffer[..end])) {
                    Some(total) if total <= MAX_REQUEST_SIZE => expected = Some(total),
                    _ => return Ok(Incoming::TooLarge),
                }
            }
        }
    }

    Ok(Incoming::Complete(buffer))
}

/// Respuesta para requests que llegan durante el shutdown
fn server_down(request: &Request, state: &AppState) -> Option<Response> {
    let path = request.path();
    if !state.jobs.is_shutting_down()
        || !path.starts_with("/api/")
        || SHUTDOWN_EXEMPT.contains(&path)
    {
        return None;
    }

    tracing::error!("{} {} - server down", request.method().as_str(), path);
    Some(Response::json(&json!({"status": "server down"})))
}

pub(crate) fn dispatch(request: &Request, router: &Router, state: &AppState) -> Response {
    if let Some(response) = server_down(request, state) {
        return response;
    }

    tracing::info!("{} {}", request.method().as_str(), request.path());
    router.route(request, state)
}

fn handle_connection(mut stream: TcpStream, router: &Router, state: &AppState) -> io::Result<()> {
    let start = Instant::now();

    let raw = match read_request(&mut stream)? {
        Incoming::Complete(raw) => raw,
        Incoming::TooLarge => {
            tracing::warn!(limit = MAX_REQUEST_SIZE, "request too large");
            let response = Response::error(StatusCode::PayloadTooLarge, "Request too large");
            stream.write_all(&response.to_bytes())?;
            return stream.flush();
        }
    };
    if raw.is_empty() {
        tracing::debug!("connection closed without data");
        return Ok(());
    }

    let response = match Request::parse(&raw) {
        Ok(request) => dispatch(&request, router, state),
        Err(e) => {
            tracing::warn!(error = %e, "malformed request");
            Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e))
        }
    };

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    tracing::debug!(
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "response sent"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataIngestor;
    use crate::jobs::{JobManager, JobManagerConfig};

    fn state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let config = JobManagerConfig {
            threads: 2,
            results_dir: dir.path().to_path_buf(),
            poll_timeout: Duration::from_millis(20),
        };
        Arc::new(AppState::new(
            JobManager::new(config).unwrap(),
            Arc::new(DataIngestor::default()),
        ))
    }

    /// Atiende una sola conexión y retorna la respuesta cruda
    fn roundtrip(state: Arc<AppState>, raw: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &router::api_router(), &state).unwrap();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();

        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_handle_connection_num_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let text = roundtrip(state(&dir), b"GET /api/num_jobs HTTP/1.0\r\n\r\n");

        assert!(text.starts_with("HTTP/1.0 200 OK"));
        assert!(text.ends_with(r#"{"num_jobs":0}"#));
    }

    #[test]
    fn test_handle_connection_waits_for_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn({
            let state = Arc::clone(&state);
            move || {
                let (stream, _) = listener.accept().unwrap();
                handle_connection(stream, &router::api_router(), &state).unwrap();
            }
        });

        // Headers y body en escrituras separadas, sin cerrar el socket
        let body = br#"{"question": "q"}"#;
        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(
                format!(
                    "POST /api/global_mean HTTP/1.0\r\nContent-Length: {}\r\n\r\n",
                    body.len()
                )
                .as_bytes(),
            )
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        client.write_all(body).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();

        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains(r#""status":"running""#));
        assert!(text.contains(r#""job_id":1"#));
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let text = roundtrip(state(&dir), b"\x00\x01\x02\x03garbage\r\n\r\n");

        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("Invalid request"));
    }

    #[test]
    fn test_handle_connection_overflowing_content_length() {
        let dir = tempfile::tempdir().unwrap();
        let text = roundtrip(
            state(&dir),
            b"POST /api/best5 HTTP/1.0\r\nContent-Length: 18446744073709551615\r\n\r\n",
        );

        assert!(text.starts_with("HTTP/1.0 413 Payload Too Large"));
    }

    #[test]
    fn test_handle_connection_rejects_oversized_body_without_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        let raw = format!(
            "POST /api/best5 HTTP/1.0\r\nContent-Length: {}\r\n\r\n",
            MAX_REQUEST_SIZE * 2
        );

        let text = roundtrip(state(&dir), raw.as_bytes());

        assert!(text.contains("413 Payload Too Large"));
        assert!(start.elapsed() < READ_TIMEOUT);
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &router::api_router(), &state).unwrap();
        });

        drop(TcpStream::connect(addr).unwrap());
        server.join().unwrap();
    }

    #[test]
    fn test_server_down_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.jobs.shutdown();
        let router = router::api_router();

        let request = Request::parse(b"GET /api/jobs HTTP/1.0\r\n\r\n").unwrap();
        let response = dispatch(&request, &router, &state);
        assert_eq!(response.body_json().unwrap(), json!({"status": "server down"}));

        let request = Request::parse(b"GET /api/num_jobs HTTP/1.0\r\n\r\n").unwrap();
        let response = dispatch(&request, &router, &state);
        assert_eq!(response.body_json().unwrap(), json!({"num_jobs": 0}));

        let request = Request::parse(b"GET /index HTTP/1.0\r\n\r\n").unwrap();
        let response = dispatch(&request, &router, &state);
        assert_eq!(response.status(), StatusCode::Ok);
    }

    #[test]
    fn test_serve_exits_after_graceful_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::new(Config::default(), {
            let config = JobManagerConfig {
                threads: 2,
                results_dir: dir.path().to_path_buf(),
                poll_timeout: Duration::from_millis(20),
            };
            AppState::new(
                JobManager::new(config).unwrap(),
                Arc::new(DataIngestor::default()),
            )
        });

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let serving = thread::spawn(move || server.serve(listener));

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(b"GET /api/graceful_shutdown HTTP/1.0\r\n\r\n")
            .unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();

        assert!(String::from_utf8_lossy(&buf).contains("shutting down server"));
        serving.join().unwrap().unwrap();
    }
}
