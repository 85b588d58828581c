//! Normalization of raw SGS observations.

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::domain::{NormalizedRecord, RawObservation};
use crate::error::AppError;

const SGS_DATE_FORMAT: &str = "%d/%m/%Y";

/// Normalize a raw payload, stamping every record with the current local time.
pub fn transform(raw: &[RawObservation], indicator: &str) -> Result<Vec<NormalizedRecord>, AppError> {
    transform_at(raw, indicator, Local::now().naive_local())
}

/// Normalize a raw payload with an explicit extraction timestamp.
///
/// Output order matches input order. Any malformed row fails the batch.
pub fn transform_at(
    raw: &[RawObservation],
    indicator: &str,
    extracted_at: NaiveDateTime,
) -> Result<Vec<NormalizedRecord>, AppError> {
    raw.iter()
        .enumerate()
        .map(|(i, obs)| -> Result<NormalizedRecord, AppError> {
            let reference_date = NaiveDate::parse_from_str(obs.date.trim(), SGS_DATE_FORMAT)
                .map_err(|e| AppError::payload(format!("{indicator} row {i}: invalid date '{}': {e}", obs.date)))?;
            let value = parse_value(&obs.value).ok_or_else(|| {
                AppError::payload(format!("{indicator} row {i}: invalid value '{}'", obs.value))
            })?;
            Ok(NormalizedRecord {
                reference_date,
                indicator: indicator.to_string(),
                value,
                extracted_at,
            })
        })
        .collect()
}

fn parse_value(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}
