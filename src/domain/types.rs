//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory by the aggregation engine
//! - parsed from CLI flags and CSV inputs
//! - written back out to summaries and exports

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Informational series category (never used in the math).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Cash,
    Demand,
    Wip,
    Inventory,
    Aggregate,
    Cumulated,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cash => "CASH",
            Category::Demand => "DEMAND",
            Category::Wip => "WIP",
            Category::Inventory => "INVENTORY",
            Category::Aggregate => "AGGREGATE",
            Category::Cumulated => "CUMULATED",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How several samples collapse to one value.
///
/// Used both for same-day samples inside one series and for same-index values
/// across several series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    Max,
    Min,
    Sum,
    Last,
    #[default]
    Avg,
}

/// The five regions of the game, in the game's own order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Calopeia,
    Sorange,
    Tyran,
    Entworpe,
    Fardo,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Calopeia,
        Region::Sorange,
        Region::Tyran,
        Region::Entworpe,
        Region::Fardo,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Region::Calopeia => "Calopeia",
            Region::Sorange => "Sorange",
            Region::Tyran => "Tyran",
            Region::Entworpe => "Entworpe",
            Region::Fardo => "Fardo",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Region::Calopeia => "#000000",
            Region::Sorange => "#ff0000",
            Region::Tyran => "#00ff00",
            Region::Entworpe => "#0000ff",
            Region::Fardo => "#00ffff",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Region> {
        let name = name.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.display_name().eq_ignore_ascii_case(name))
    }
}

/// Color used when no region name is contained in a series label.
pub const DEFAULT_COLOR: &str = "y";

/// Pick a display color from the first region name contained in `name`.
pub fn default_color(name: &str) -> &'static str {
    Region::ALL
        .into_iter()
        .find(|r| name.contains(r.display_name()))
        .map(Region::color)
        .unwrap_or(DEFAULT_COLOR)
}

/// Lead times of the game, in simulated days.
pub mod lead_times {
    pub const FACTORY_INVESTMENT_DAYS: f64 = 90.0;
    pub const WAREHOUSE_INVESTMENT_DAYS: f64 = 60.0;
    pub const SHIPPING_TRUCK_DAYS: f64 = 7.0;
    pub const SHIPPING_MAIL_DAYS: f64 = 1.0;
}

/// Default length of the rolling dashboard window (days).
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Default centered smoothing window for demand panels (days).
pub const DEFAULT_SMOOTHING_DAYS: u32 = 14;

/// Cash series are published in thousands.
pub const CASH_MULTIPLIER: f64 = 1000.0;

/// A full dashboard run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags plus `.env` / environment defaults.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Force the displayed day instead of reading it from `general.csv`.
    pub displayed_day: Option<i64>,
    /// Rolling window length (days) shown on every panel.
    pub last_x_days: u32,
    pub smoothing_days: u32,
    pub refresh_secs: u64,
    /// Keep refreshing until interrupted.
    pub watch: bool,
    /// Write summaries, series exports and team histories.
    pub persist: bool,
    /// Only record team standings each tick.
    pub cash_only: bool,
    /// Read inputs but never write anything (team histories are read-only).
    pub replay: bool,
    /// Our own team; never recorded in the standing histories.
    pub own_team: Option<String>,
    pub cash_multiplier: f64,
}

impl DashboardConfig {
    /// Persistence is off in replay mode regardless of `persist`.
    pub fn writes_enabled(&self) -> bool {
        self.persist && !self.replay
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("outputs"),
            displayed_day: None,
            last_x_days: DEFAULT_WINDOW_DAYS,
            smoothing_days: DEFAULT_SMOOTHING_DAYS,
            refresh_secs: 60,
            watch: false,
            persist: true,
            cash_only: false,
            replay: false,
            own_team: None,
            cash_multiplier: CASH_MULTIPLIER,
        }
    }
}
