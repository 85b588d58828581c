//! Shared ETL pipeline logic used by both one-shot and scheduled modes.
//!
//! Provision -> for each configured indicator: extract -> transform -> load
//!
//! Every stage reports a `StageOutcome`; this module decides what to do with
//! it. Stage failures are logged and the loop moves on to the next indicator.

use crate::config::EtlConfig;
use crate::data::{SeriesSource, transform};
use crate::domain::{IndicatorSeries, LoadReport, NormalizedRecord, RawObservation, RunSummary, StageOutcome};
use crate::error::AppError;
use crate::store::{Store, load_records, provision};

pub struct Pipeline<'a, S: SeriesSource> {
    config: &'a EtlConfig,
    source: S,
}

impl<'a, S: SeriesSource> Pipeline<'a, S> {
    pub fn new(config: &'a EtlConfig, source: S) -> Self {
        Self { config, source }
    }

    /// One guarded run against the configured store.
    ///
    /// Never propagates: a failure to open the store is logged and ends the
    /// run with `None`.
    pub fn run(&self) -> Option<RunSummary> {
        tracing::info!("starting ETL pipeline");

        match self.open_and_run() {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!(error = %e, "pipeline run aborted");
                None
            }
        }
    }

    fn open_and_run(&self) -> Result<RunSummary, AppError> {
        let mut store = Store::open(&self.config.database_url)?;
        Ok(self.run_with_store(&mut store))
    }

    /// Run every configured indicator against an already open store.
    pub fn run_with_store(&self, store: &mut Store) -> RunSummary {
        if let Err(e) = provision(store.connection()) {
            tracing::error!(error = %e, "failed to create table");
        }

        let mut summary = RunSummary::default();
        for series in &self.config.series {
            tracing::info!(indicator = %series.name, code = series.code, "processing");
            summary.processed += 1;

            let raw = match extract(&self.source, series) {
                StageOutcome::Ready(raw) => raw,
                StageOutcome::Empty => {
                    summary.empty += 1;
                    continue;
                }
                StageOutcome::Failed(e) => {
                    tracing::error!(code = series.code, error = %e, "failed to extract series");
                    summary.failed += 1;
                    continue;
                }
            };

            let records = match normalize(&raw, series) {
                StageOutcome::Ready(records) => records,
                StageOutcome::Empty => {
                    summary.empty += 1;
                    continue;
                }
                StageOutcome::Failed(e) => {
                    tracing::error!(indicator = %series.name, error = %e, "failed to transform series");
                    summary.failed += 1;
                    continue;
                }
            };

            match load(store, &records) {
                StageOutcome::Ready(report) => {
                    summary.inserted_rows += report.inserted_rows();
                    summary.skipped += report.skipped();
                }
                StageOutcome::Empty => summary.empty += 1,
                StageOutcome::Failed(e) => {
                    tracing::error!(indicator = %series.name, error = %e, "failed to load into store");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            inserted = summary.inserted_rows,
            skipped = summary.skipped,
            failed = summary.failed,
            "pipeline finished"
        );
        summary
    }
}

fn extract<S: SeriesSource>(source: &S, series: &IndicatorSeries) -> StageOutcome<Vec<RawObservation>> {
    match source.fetch_series(series.code) {
        Ok(raw) if raw.is_empty() => {
            tracing::warn!(code = series.code, "series returned no observations");
            StageOutcome::Empty
        }
        result => result.into(),
    }
}

fn normalize(raw: &[RawObservation], series: &IndicatorSeries) -> StageOutcome<Vec<NormalizedRecord>> {
    match transform(raw, &series.name) {
        Ok(records) if records.is_empty() => StageOutcome::Empty,
        result => result.into(),
    }
}

fn load(store: &mut Store, records: &[NormalizedRecord]) -> StageOutcome<LoadReport> {
    load_records(store, records).into()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In-memory series source keyed by code; unknown codes fail.
    #[derive(Default)]
    struct StaticSource {
        series: HashMap<u32, Vec<RawObservation>>,
    }

    impl StaticSource {
        fn with(mut self, code: u32, rows: &[(&str, &str)]) -> Self {
            let raw = rows.iter().map(|(d, v)| RawObservation::new(*d, *v)).collect();
            self.series.insert(code, raw);
            self
        }
    }

    impl SeriesSource for StaticSource {
        fn fetch_series(&self, code: u32) -> Result<Vec<RawObservation>, AppError> {
            self.series
                .get(&code)
                .cloned()
                .ok_or_else(|| AppError::payload(format!("no fixture for series {code}")))
        }
    }

    fn config(series: Vec<IndicatorSeries>) -> EtlConfig {
        EtlConfig {
            database_url: "sqlite://:memory:".into(),
            series,
            ..EtlConfig::default()
        }
    }

    #[test]
    fn loads_every_configured_indicator() {
        let config = config(EtlConfig::default().series);
        let source = StaticSource::default()
            .with(4189, &[("02/01/2024", "11.75"), ("03/01/2024", "11.75")])
            .with(433, &[("01/01/2024", "0.42")]);
        let mut store = Store::open_in_memory().unwrap();

        let summary = Pipeline::new(&config, source).run_with_store(&mut store);

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.inserted_rows, 3);
        assert_eq!(store.count_indicator("SELIC_META_ANUAL").unwrap(), 2);
        assert_eq!(store.count_indicator("IPCA_MENSAL").unwrap(), 1);
    }

    #[test]
    fn extraction_failure_does_not_stop_later_indicators() {
        let config = config(vec![
            IndicatorSeries::new("MISSING", 1),
            IndicatorSeries::new("IPCA_MENSAL", 433),
        ]);
        let source = StaticSource::default().with(433, &[("01/01/2024", "0.42")]);
        let mut store = Store::open_in_memory().unwrap();

        let summary = Pipeline::new(&config, source).run_with_store(&mut store);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.inserted_rows, 1);
        assert_eq!(store.count_rows().unwrap(), 1);
    }

    #[test]
    fn malformed_payload_is_isolated() {
        let config = config(EtlConfig::default().series);
        let source = StaticSource::default()
            .with(4189, &[("02/01/2024", "not-a-number")])
            .with(433, &[("01/01/2024", "0.42")]);
        let mut store = Store::open_in_memory().unwrap();

        let summary = Pipeline::new(&config, source).run_with_store(&mut store);

        assert_eq!(summary.failed, 1);
        assert_eq!(store.count_indicator("SELIC_META_ANUAL").unwrap(), 0);
        assert_eq!(store.count_indicator("IPCA_MENSAL").unwrap(), 1);
    }

    #[test]
    fn empty_series_counts_as_empty_not_failed() {
        let config = config(vec![IndicatorSeries::new("IPCA_MENSAL", 433)]);
        let source = StaticSource::default().with(433, &[]);
        let mut store = Store::open_in_memory().unwrap();

        let summary = Pipeline::new(&config, source).run_with_store(&mut store);

        assert_eq!(summary.empty, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.count_rows().unwrap(), 0);
    }

    #[test]
    fn second_run_skips_already_loaded_indicators() {
        let config = config(EtlConfig::default().series);
        let mut store = Store::open_in_memory().unwrap();
        let rows: &[(&str, &str)] = &[("01/01/2024", "0.42"), ("01/02/2024", "0.83")];
        let pipeline = Pipeline::new(&config, StaticSource::default().with(4189, rows).with(433, rows));

        let first = pipeline.run_with_store(&mut store);
        let second = pipeline.run_with_store(&mut store);

        assert_eq!(first.inserted_rows, 4);
        assert_eq!(second.inserted_rows, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.count_rows().unwrap(), 4);
    }

    #[test]
    fn provisioning_failure_does_not_abort_run() {
        let config = config(EtlConfig::default().series);
        let source = StaticSource::default()
            .with(4189, &[("02/01/2024", "11.75")])
            .with(433, &[("01/01/2024", "0.42")]);
        let mut store = Store::open_in_memory().unwrap();
        store.connection().execute_batch("PRAGMA query_only = ON").unwrap();

        let summary = Pipeline::new(&config, source).run_with_store(&mut store);

        assert_eq!(summary.processed, config.series.len());
        assert_eq!(summary.failed, config.series.len());
        assert_eq!(summary.inserted_rows, 0);
    }

    #[test]
    fn unopenable_store_ends_run_without_panicking() {
        let config = EtlConfig {
            database_url: "sqlite://".into(),
            ..EtlConfig::default()
        };
        let pipeline = Pipeline::new(&config, StaticSource::default());
        assert_eq!(pipeline.run(), None);
    }
}
