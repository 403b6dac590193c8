//! # Consultas Analíticas
//! src/dataset/queries.rs
//!
//! Cada consulta filtra por pregunta (y a veces por estado), agrupa y
//! promedia `Data_Value`. El resultado es un string JSON que el worker
//! guarda tal cual en el Result Store.
//!
//! Las salidas "tabulares" (agrupadas) redondean a 10 decimales; las de
//! un solo valor (`state_mean`, `global_mean`, `state_diff_from_mean`)
//! conservan la precisión completa.

use super::{DataIngestor, Record};
use crate::jobs::WorkError;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// Preguntas donde un valor menor es mejor
pub const QUESTIONS_BEST_IS_MIN: &[&str] = &[
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

/// Preguntas donde un valor mayor es mejor
pub const QUESTIONS_BEST_IS_MAX: &[&str] = &[
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic physical activity and engage in muscle-strengthening activities on 2 or more days a week",
    "Percent of adults who achieve at least 300 minutes a week of moderate-intensity aerobic physical activity or 150 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who engage in muscle-strengthening activities on 2 or more days a week",
];

const TOP_N: usize = 5;
const DECIMALS: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown question: {0}")]
    UnknownQuestion(String),
}

impl From<QueryError> for WorkError {
    fn from(err: QueryError) -> Self {
        WorkError::Failed(err.to_string())
    }
}

/// Consulta pendiente de ejecutar; la construye el handler HTTP y la
/// ejecuta un worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    StatesMean { question: String },
    StateMean { question: String, state: String },
    Best5 { question: String },
    Worst5 { question: String },
    GlobalMean { question: String },
    DiffFromMean { question: String },
    StateDiffFromMean { question: String, state: String },
    MeanByCategory { question: String },
    StateMeanByCategory { question: String, state: String },
}

impl Query {
    pub fn name(&self) -> &'static str {
        match self {
            Query::StatesMean { .. } => "states_mean",
            Query::StateMean { .. } => "state_mean",
            Query::Best5 { .. } => "best5",
            Query::Worst5 { .. } => "worst5",
            Query::GlobalMean { .. } => "global_mean",
            Query::DiffFromMean { .. } => "diff_from_mean",
            Query::StateDiffFromMean { .. } => "state_diff_from_mean",
            Query::MeanByCategory { .. } => "mean_by_category",
            Query::StateMeanByCategory { .. } => "state_mean_by_category",
        }
    }
}

/// Acumulador de promedio que ignora valores ausentes
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

impl DataIngestor {
    /// Ejecuta una consulta y devuelve el JSON resultante
    pub fn run(&self, query: &Query) -> Result<String, QueryError> {
        let value = match query {
            Query::StatesMean { question } => self.states_mean(question)?,
            Query::StateMean { question, state } => self.state_mean(question, state)?,
            Query::Best5 { question } => self.best5(question)?,
            Query::Worst5 { question } => self.worst5(question)?,
            Query::GlobalMean { question } => self.global_mean(question)?,
            Query::DiffFromMean { question } => self.diff_from_mean(question)?,
            Query::StateDiffFromMean { question, state } => {
                self.state_diff_from_mean(question, state)?
            }
            Query::MeanByCategory { question } => self.mean_by_category(question)?,
            Query::StateMeanByCategory { question, state } => {
                self.state_mean_by_category(question, state)?
            }
        };

        Ok(value.to_string())
    }

    /// Promedio por estado, ordenado ascendente por valor
    pub fn states_mean(&self, question: &str) -> Result<Value, QueryError> {
        let mut means = self.means_by_state(question)?;
        sort_by_value(&mut means, true);
        Ok(series(means))
    }

    pub fn state_mean(&self, question: &str, state: &str) -> Result<Value, QueryError> {
        let mean = self.state_mean_value(question, state)?;
        Ok(single(state, mean))
    }

    /// Los 5 mejores estados; el sentido depende de la pregunta
    pub fn best5(&self, question: &str) -> Result<Value, QueryError> {
        let ascending = QUESTIONS_BEST_IS_MIN.contains(&question);
        self.top_states(question, ascending)
    }

    pub fn worst5(&self, question: &str) -> Result<Value, QueryError> {
        let ascending = QUESTIONS_BEST_IS_MAX.contains(&question);
        self.top_states(question, ascending)
    }

    pub fn global_mean(&self, question: &str) -> Result<Value, QueryError> {
        let mean = self.global_mean_value(question)?;
        Ok(single("global_mean", mean))
    }

    /// `global - media_del_estado` para cada estado (orden alfabético)
    pub fn diff_from_mean(&self, question: &str) -> Result<Value, QueryError> {
        let global = self.global_mean_value(question)?;
        let diffs = self
            .means_by_state(question)?
            .into_iter()
            .map(|(state, mean)| (state, difference(global, mean)))
            .collect();

        Ok(series(diffs))
    }

    pub fn state_diff_from_mean(&self, question: &str, state: &str) -> Result<Value, QueryError> {
        let global = self.global_mean_value(question)?;
        let mean = self.state_mean_value(question, state)?;
        Ok(single(state, difference(global, mean)))
    }

    /// Promedio por (estado, categoría, estratificación)
    pub fn mean_by_category(&self, question: &str) -> Result<Value, QueryError> {
        let mut groups: BTreeMap<(&str, &str, &str), Mean> = BTreeMap::new();

        for record in self.rows(question)? {
            if let (Some(category), Some(stratification)) =
                (record.category.as_deref(), record.stratification.as_deref())
            {
                groups
                    .entry((record.location.as_str(), category, stratification))
                    .or_default()
                    .push(record.value);
            }
        }

        let means = groups
            .into_iter()
            .map(|((state, category, stratification), mean)| {
                (tuple_key(&[state, category, stratification]), mean.value())
            })
            .collect();

        Ok(series(means))
    }

    /// Promedio por (categoría, estratificación) dentro de un estado
    pub fn state_mean_by_category(&self, question: &str, state: &str) -> Result<Value, QueryError> {
        let mut groups: BTreeMap<(&str, &str), Mean> = BTreeMap::new();

        for record in self.rows(question)?.filter(|r| r.location == state) {
            if let (Some(category), Some(stratification)) =
                (record.category.as_deref(), record.stratification.as_deref())
            {
                groups
                    .entry((category, stratification))
                    .or_default()
                    .push(record.value);
            }
        }

        let means = groups
            .into_iter()
            .map(|((category, stratification), mean)| {
                (tuple_key(&[category, stratification]), mean.value())
            })
            .collect();

        let mut object = Map::new();
        object.insert(state.to_string(), series(means));
        Ok(Value::Object(object))
    }

    /// Filas de una pregunta; error si la pregunta no aparece en el dataset
    fn rows<'a>(
        &'a self,
        question: &'a str,
    ) -> Result<impl Iterator<Item = &'a Record> + 'a, QueryError> {
        if !self.records().iter().any(|r| r.question == question) {
            return Err(QueryError::UnknownQuestion(question.to_string()));
        }

        Ok(self.records().iter().filter(move |r| r.question == question))
    }

    fn means_by_state(&self, question: &str) -> Result<Vec<(String, Option<f64>)>, QueryError> {
        let mut groups: BTreeMap<&str, Mean> = BTreeMap::new();

        for record in self.rows(question)? {
            groups
                .entry(record.location.as_str())
                .or_default()
                .push(record.value);
        }

        Ok(groups
            .into_iter()
            .map(|(state, mean)| (state.to_string(), mean.value()))
            .collect())
    }

    fn state_mean_value(&self, question: &str, state: &str) -> Result<Option<f64>, QueryError> {
        let mut mean = Mean::default();
        for record in self.rows(question)?.filter(|r| r.location == state) {
            mean.push(record.value);
        }
        Ok(mean.value())
    }

    fn global_mean_value(&self, question: &str) -> Result<Option<f64>, QueryError> {
        let mut mean = Mean::default();
        for record in self.rows(question)? {
            mean.push(record.value);
        }
        Ok(mean.value())
    }

    fn top_states(&self, question: &str, ascending: bool) -> Result<Value, QueryError> {
        let mut means = self.means_by_state(question)?;
        sort_by_value(&mut means, ascending);
        means.truncate(TOP_N);
        Ok(series(means))
    }
}

fn difference(global: Option<f64>, mean: Option<f64>) -> Option<f64> {
    Some(global? - mean?)
}

/// Orden estable por valor; los ausentes siempre al final
fn sort_by_value(entries: &mut [(String, Option<f64>)], ascending: bool) {
    entries.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMALS);
    (value * factor).round() / factor
}

fn number(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// Objeto `{clave: valor}` en orden de inserción, con valores redondeados
fn series(entries: Vec<(String, Option<f64>)>) -> Value {
    let object: Map<String, Value> = entries
        .into_iter()
        .map(|(key, value)| (key, number(value.map(round))))
        .collect();

    Value::Object(object)
}

fn single(key: &str, value: Option<f64>) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), number(value));
    Value::Object(object)
}

/// Clave compuesta con formato de tupla: `('Ohio', 'Gender', 'Male')`
fn tuple_key(parts: &[&str]) -> String {
    let quoted: Vec<String> = parts.iter().map(|part| quote(part)).collect();
    format!("({})", quoted.join(", "))
}

/// Cita un texto como lo hace la representación de strings de Python:
/// comillas dobles solo si el texto tiene `'` y no tiene `"`
fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}
