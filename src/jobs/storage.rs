//! # Persistencia de Resultados
//! src/jobs/storage.rs
//!
//! Un archivo por job dentro del directorio de resultados, nombrado con el
//! ID en decimal. El contenido es el payload literal, sin framing.
//! Los jobs fallidos dejan en su lugar `<id>.error` con el mensaje.

use crate::jobs::job::JobId;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensión del registro de falla
const FAILURE_EXTENSION: &str = "error";

/// Errores de I/O del Result Store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot create results directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on result {id}: {source}")]
    Io {
        id: JobId,
        #[source]
        source: io::Error,
    },
}

/// Lo que hay persistido para un ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredResult {
    /// Salida de un job terminado con éxito
    Payload(String),

    /// Mensaje de un job fallido
    Failure(String),
}

/// Storage durable de resultados, un registro por job
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    /// Abre (o crea) el directorio de resultados
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        Ok(Self { dir })
    }

    /// Directorio del store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, id: JobId) -> PathBuf {
        self.dir.join(id.to_string())
    }

    fn failure_path(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, FAILURE_EXTENSION))
    }

    /// Persiste el payload de un job.
    ///
    /// Un `.error` previo con el mismo ID (de otra ejecución) se elimina.
    pub fn put(&self, id: JobId, payload: &str) -> Result<(), StoreError> {
        self.write_atomic(id, &self.payload_path(id), payload)?;
        self.remove_stale(id, &self.failure_path(id))
    }

    /// Persiste el registro de falla de un job y elimina un payload previo
    pub fn put_failure(&self, id: JobId, reason: &str) -> Result<(), StoreError> {
        self.write_atomic(id, &self.failure_path(id), reason)?;
        self.remove_stale(id, &self.payload_path(id))
    }

    fn remove_stale(&self, id: JobId, path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { id, source }),
        }
    }

    /// Escribe en un archivo temporal, fuerza a disco y renombra.
    ///
    /// Un lector concurrente nunca ve un registro a medio escribir.
    fn write_atomic(&self, id: JobId, path: &Path, contents: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { id, source };

        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        fs::rename(&temp_path, path).map_err(io_err)?;

        Ok(())
    }

    /// Obtiene lo persistido para un job, `None` si aún no hay nada
    pub fn get(&self, id: JobId) -> Result<Option<StoredResult>, StoreError> {
        if let Some(payload) = self.read(id, &self.payload_path(id))? {
            return Ok(Some(StoredResult::Payload(payload)));
        }

        Ok(self
            .read(id, &self.failure_path(id))?
            .map(StoredResult::Failure))
    }

    fn read(&self, id: JobId, path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { id, source }),
        }
    }
}
