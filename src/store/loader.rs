//! Existence-checked loading of normalized records.
//!
//! Duplicate protection is coarse: an indicator's batch is skipped when the
//! store already holds any row for it dated on or after the batch's minimum
//! reference date. The table's `UNIQUE(data_referencia, indicador)`
//! constraint is the backstop for anything that slips through.

use chrono::NaiveDate;
use rusqlite::{Connection, params};

use crate::domain::{IndicatorLoad, LoadReport, NormalizedRecord};
use crate::error::AppError;
use crate::store::{Store, TABLE};

/// Whether any row exists for `indicator` with a reference date `>= since`.
pub fn has_rows_since(conn: &Connection, indicator: &str, since: NaiveDate) -> Result<bool, AppError> {
    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {TABLE} WHERE indicador = ?1 AND data_referencia >= ?2)"),
        params![indicator, since],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Existence check that fails open: a query error counts as "no data".
fn existing_data(conn: &Connection, indicator: &str, since: NaiveDate) -> bool {
    match has_rows_since(conn, indicator, since) {
        Ok(exists) => exists,
        Err(e) => {
            tracing::warn!(indicator, error = %e, "failed to check existing data");
            false
        }
    }
}

/// Append records to the store, skipping indicators whose period is already loaded.
///
/// The period boundary is the minimum reference date across *all* input
/// records, not per indicator. Each indicator is written in its own
/// transaction; the first store error aborts the load.
pub fn load_records(store: &mut Store, records: &[NormalizedRecord]) -> Result<LoadReport, AppError> {
    let Some(since) = records.iter().map(|r| r.reference_date).min() else {
        tracing::warn!("no records to load");
        return Ok(LoadReport::default());
    };

    let mut report = LoadReport::default();
    for indicator in distinct_indicators(records) {
        if existing_data(store.connection(), indicator, since) {
            tracing::info!(indicator, %since, "data already present from this date, skipping load");
            report.indicators.push(IndicatorLoad::Skipped {
                indicator: indicator.to_string(),
                since,
            });
            continue;
        }

        let batch: Vec<&NormalizedRecord> = records.iter().filter(|r| r.indicator == indicator).collect();
        let rows = append(store.connection_mut(), &batch)?;
        tracing::info!(indicator, rows, "rows inserted");
        report.indicators.push(IndicatorLoad::Inserted {
            indicator: indicator.to_string(),
            rows,
        });
    }

    Ok(report)
}

fn distinct_indicators(records: &[NormalizedRecord]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for r in records {
        if !seen.contains(&r.indicator.as_str()) {
            seen.push(&r.indicator);
        }
    }
    seen
}

fn append(conn: &mut Connection, batch: &[&NormalizedRecord]) -> Result<usize, AppError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {TABLE} (data_referencia, indicador, valor, data_extracao) VALUES (?1, ?2, ?3, ?4)"
        ))?;
        for r in batch {
            stmt.execute(params![r.reference_date, r.indicator, round4(r.value), r.extracted_at])?;
        }
    }
    tx.commit()?;
    Ok(batch.len())
}

// Column is NUMERIC(10,4).
fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
