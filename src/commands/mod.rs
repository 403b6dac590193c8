//! # Comandos del Servidor
//!
//! Handlers HTTP que no pertenecen al motor de jobs.
//!
//! ## Categorías de comandos
//!
//! - **basic**: índice de rutas
//! - **stats**: consultas estadísticas sobre el dataset (se ejecutan como jobs)
//!
//! Cada comando es una función handler que recibe un Request y el
//! estado compartido y retorna una Response.

pub mod basic;
pub mod stats;

pub use basic::*;
pub use stats::*;
