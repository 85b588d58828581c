//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw API observations (`RawObservation`) and normalized rows (`NormalizedRecord`)
//! - the indicator → series code mapping (`IndicatorSeries`)
//! - stage and run results (`StageOutcome`, `LoadReport`, `RunSummary`)

pub mod types;

pub use types::*;
