//! Process-wide configuration.
//!
//! Built once at startup from defaults, `.env`, and the environment, then
//! passed by reference into the pipeline. Nothing mutates it afterwards.

use std::time::Duration;

use crate::data::bcb::DEFAULT_BASE_URL;
use crate::domain::IndicatorSeries;
use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://bd_pipeline_etl.db";
pub const DEFAULT_INTERVAL_HOURS: u64 = 48;
pub const DEFAULT_POLL_MINUTES: u64 = 60;

const ENV_API_BASE_URL: &str = "BCB_API_BASE_URL";
const ENV_DATABASE_URL: &str = "BCB_DATABASE_URL";
const ENV_SERIES: &str = "BCB_SERIES";
const ENV_INTERVAL_HOURS: &str = "BCB_INTERVAL_HOURS";
const ENV_POLL_MINUTES: &str = "BCB_POLL_MINUTES";

/// Recurring-mode timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Time between the end of one run and the next run.
    pub interval: Duration,
    /// How often the scheduler wakes up to check whether a run is due.
    pub poll: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_HOURS * 3600),
            poll: Duration::from_secs(DEFAULT_POLL_MINUTES * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub api_base_url: String,
    pub database_url: String,
    /// Indicators in processing order.
    pub series: Vec<IndicatorSeries>,
    pub schedule: ScheduleConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            series: vec![
                IndicatorSeries::new("SELIC_META_ANUAL", 4189),
                IndicatorSeries::new("IPCA_MENSAL", 433),
            ],
            schedule: ScheduleConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = non_empty(lookup(ENV_API_BASE_URL)) {
            config.api_base_url = url;
        }
        if let Some(url) = non_empty(lookup(ENV_DATABASE_URL)) {
            config.database_url = url;
        }
        if let Some(spec) = non_empty(lookup(ENV_SERIES)) {
            config.series = parse_series(&spec)?;
        }
        if let Some(raw) = non_empty(lookup(ENV_INTERVAL_HOURS)) {
            config.schedule.interval = parse_duration(ENV_INTERVAL_HOURS, &raw, 3600)?;
        }
        if let Some(raw) = non_empty(lookup(ENV_POLL_MINUTES)) {
            config.schedule.poll = parse_duration(ENV_POLL_MINUTES, &raw, 60)?;
        }

        Ok(config)
    }
}

/// Parse `NAME:CODE,NAME:CODE`, keeping the given order.
pub fn parse_series(spec: &str) -> Result<Vec<IndicatorSeries>, AppError> {
    let mut series: Vec<IndicatorSeries> = Vec::new();

    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, code) = entry
            .split_once(':')
            .ok_or_else(|| AppError::config(format!("series entry '{entry}' must be NAME:CODE")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::config(format!("series entry '{entry}' has an empty name")));
        }
        let code: u32 = code
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("series entry '{entry}' has a non-numeric code")))?;
        if series.iter().any(|s| s.name == name) {
            return Err(AppError::config(format!("indicator '{name}' is configured twice")));
        }
        series.push(IndicatorSeries::new(name, code));
    }

    if series.is_empty() {
        return Err(AppError::config("no series configured"));
    }
    Ok(series)
}

/// Positive count of `unit_secs`-long units, rejecting values whose seconds overflow.
fn parse_duration(key: &str, raw: &str, unit_secs: u64) -> Result<Duration, AppError> {
    let units = match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => v,
        _ => return Err(AppError::config(format!("{key} must be a positive integer, got '{raw}'"))),
    };
    units
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| AppError::config(format!("{key} is too large, got '{raw}'")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
