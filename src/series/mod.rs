//! Time-series aggregation engine.
//!
//! - `types`: raw samples and the `Series` container
//! - `resample`: day bucketing, gap filling, smoothing, cumulation
//! - `combine`: index-wise combination and multi-series aggregation

pub mod combine;
pub mod resample;
pub mod types;

pub use combine::combine_by_index;
pub use resample::{DaySeries, SeriesAggregator, round_day};
pub use types::{Point, Series, points_from};
