//! Extraction and normalization of SGS series.

pub mod bcb;
pub mod transform;

pub use bcb::{BcbClient, SeriesSource};
pub use transform::transform;
