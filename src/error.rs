//! # Errores del Servidor
//! src/error.rs

use crate::jobs::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset error: {0}")]
    Dataset(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("server is shutting down")]
    ShuttingDown,
}

pub type Result<T> = std::result::Result<T, Error>;
