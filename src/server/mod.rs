//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea requests HTTP
//! 4. Despacha al router y envía la response
//!
//! El loop de accept termina cuando el Job Manager completa el
//! graceful shutdown.

pub mod state;
pub mod tcp;

pub use state::AppState;
pub use tcp::Server;
