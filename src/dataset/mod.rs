//! # Dataset de Nutrición y Actividad Física
//! src/dataset/mod.rs
//!
//! Carga el CSV una sola vez al arrancar. Las consultas (ver `queries`)
//! leen los registros sin mutarlos, así que el ingestor se comparte
//! entre workers detrás de un `Arc`.

pub mod queries;

pub use queries::{Query, QueryError};

use serde::Deserialize;
use std::io;
use std::path::Path;

/// Fila del dataset; el resto de columnas se ignora
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    #[serde(rename = "Question")]
    pub question: String,

    /// Estado (ej: "Ohio")
    #[serde(rename = "LocationDesc")]
    pub location: String,

    /// Valor vacío o no numérico se trata como ausente
    #[serde(rename = "Data_Value", default, deserialize_with = "csv::invalid_option")]
    pub value: Option<f64>,

    #[serde(rename = "StratificationCategory1", default)]
    pub category: Option<String>,

    #[serde(rename = "Stratification1", default)]
    pub stratification: Option<String>,
}

/// Dataset en memoria
#[derive(Debug, Clone, Default)]
pub struct DataIngestor {
    records: Vec<Record>,
}

impl DataIngestor {
    /// Carga el dataset desde un archivo CSV
    pub fn load(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let reader = csv::Reader::from_path(path.as_ref())?;
        let ingestor = Self::from_csv(reader)?;

        tracing::info!(
            path = %path.as_ref().display(),
            records = ingestor.len(),
            "dataset loaded"
        );
        Ok(ingestor)
    }

    /// Carga el dataset desde cualquier lector (útil en tests)
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, csv::Error> {
        let records = reader
            .deserialize()
            .collect::<Result<Vec<Record>, _>>()?;

        Ok(Self { records })
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
YearStart,LocationDesc,Question,Data_Value,StratificationCategory1,Stratification1
2011,Ohio,Q1,30.5,Age (years),18 - 24
2012,Ohio,Q1,,Gender,Male
2013,Iowa,Q2,n/a,,
";

    #[test]
    fn test_from_reader_parses_known_columns() {
        let ingestor = DataIngestor::from_reader(CSV.as_bytes()).unwrap();

        assert_eq!(ingestor.len(), 3);
        let first = &ingestor.records()[0];
        assert_eq!(first.location, "Ohio");
        assert_eq!(first.question, "Q1");
        assert_eq!(first.value, Some(30.5));
        assert_eq!(first.category.as_deref(), Some("Age (years)"));
        assert_eq!(first.stratification.as_deref(), Some("18 - 24"));
    }

    #[test]
    fn test_missing_or_invalid_values_are_none() {
        let ingestor = DataIngestor::from_reader(CSV.as_bytes()).unwrap();

        assert_eq!(ingestor.records()[1].value, None);
        assert_eq!(ingestor.records()[2].value, None);
        assert_eq!(ingestor.records()[2].category, None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DataIngestor::load(dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, CSV).unwrap();

        let ingestor = DataIngestor::load(&path).unwrap();
        assert!(!ingestor.is_empty());
    }
}
