//! Shared domain types.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::AppError;

/// One data point as returned by the SGS API.
///
/// Both fields are strings on the wire: `data` is `DD/MM/YYYY` and `valor`
/// is a decimal number such as `"11.75"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawObservation {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "valor")]
    pub value: String,
}

impl RawObservation {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
        }
    }
}

/// A cleaned observation ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub reference_date: NaiveDate,
    pub indicator: String,
    pub value: f64,
    pub extracted_at: NaiveDateTime,
}

/// Human-readable indicator name bound to an SGS series code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSeries {
    pub name: String,
    pub code: u32,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }
}

/// Result of a single pipeline stage.
///
/// `Empty` is the recoverable "nothing to do" case; `Failed` carries the
/// cause so the orchestrator can log it and decide whether to continue.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Ready(T),
    Empty,
    Failed(AppError),
}

impl<T> From<Result<T, AppError>> for StageOutcome<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err),
        }
    }
}

/// What the loader did with one indicator's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorLoad {
    Inserted { indicator: String, rows: usize },
    Skipped { indicator: String, since: NaiveDate },
}

/// Per-indicator results of one load call, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub indicators: Vec<IndicatorLoad>,
}

impl LoadReport {
    pub fn inserted_rows(&self) -> usize {
        self.indicators
            .iter()
            .map(|load| match load {
                IndicatorLoad::Inserted { rows, .. } => *rows,
                IndicatorLoad::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.indicators
            .iter()
            .filter(|load| matches!(load, IndicatorLoad::Skipped { .. }))
            .count()
    }
}

/// Aggregate of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub inserted_rows: usize,
    pub skipped: usize,
    pub empty: usize,
    pub failed: usize,
}
