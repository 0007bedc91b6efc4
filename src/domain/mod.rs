//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - series classification enums (`Category`, `AggregationPolicy`)
//! - the game's regions and their display colors (`Region`)
//! - game lead times and dashboard defaults
//! - the dashboard run configuration (`DashboardConfig`)

pub mod types;

pub use types::*;
