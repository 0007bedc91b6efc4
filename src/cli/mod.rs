//! Command-line parsing for the supply-chain game dashboard.
//!
//! Argument parsing and command dispatch stay separate from the aggregation
//! code; `app` turns these structs into configs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AggregationPolicy, DEFAULT_SMOOTHING_DAYS, DEFAULT_WINDOW_DAYS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "scg", version, about = "Supply chain game dashboard and series toolkit")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh the dashboard from an input directory (default command).
    Dashboard(DashboardArgs),
    /// Resample one series to whole days.
    Resample(ResampleArgs),
    /// Combine several series into one.
    Aggregate(AggregateArgs),
    /// Centered moving mean of one series.
    Smooth(SmoothArgs),
    /// Running total of one series.
    Cumulate(CumulateArgs),
    /// Write a synthetic input directory.
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    /// Input directory (defaults to `SCG_INPUT_DIR`, then `data`).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output directory (defaults to `SCG_OUTPUT_DIR`, then `outputs`).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Force the displayed day instead of reading `general.csv`.
    #[arg(long)]
    pub day: Option<i64>,

    /// Rolling window length in days.
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub days: u32,

    /// Smoothing window for the demand panel, in days.
    #[arg(long, default_value_t = DEFAULT_SMOOTHING_DAYS)]
    pub smoothing: u32,

    /// Seconds between refreshes in `--watch` mode.
    #[arg(long, default_value_t = 60)]
    pub refresh: u64,

    /// Keep refreshing until interrupted.
    #[arg(long)]
    pub watch: bool,

    /// Do not write summaries, exports or team histories.
    #[arg(long)]
    pub no_persist: bool,

    /// Only record team standings each tick.
    #[arg(long)]
    pub cash_only: bool,

    /// Read the inputs without persisting anything.
    #[arg(long)]
    pub replay: bool,
}

/// Input selection shared by the single-series subcommands.
#[derive(Debug, Args, Clone)]
pub struct SeriesInput {
    /// `series,day,value` (or `day,value`) CSV file.
    #[arg(long)]
    pub csv: PathBuf,

    /// Series label to use (defaults to the first one in the file).
    #[arg(long)]
    pub series: Option<String>,

    /// First day of the window.
    #[arg(long, allow_negative_numbers = true)]
    pub from_day: i64,
}

#[derive(Debug, Args, Clone)]
pub struct ResampleArgs {
    #[command(flatten)]
    pub input: SeriesInput,

    #[arg(long, value_enum, default_value_t = AggregationPolicy::Avg)]
    pub policy: AggregationPolicy,

    /// Carry the previous value into days without samples.
    #[arg(long)]
    pub fill_gaps: bool,

    /// Length of the zero window returned when nothing is on or after `--from-day`.
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window: u32,

    /// Write the result as `day,value` CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AggregateArgs {
    /// `series,day,value` or `group,series,day,value` CSV file.
    #[arg(long)]
    pub csv: PathBuf,

    /// Only combine the series of this group.
    #[arg(long)]
    pub group: Option<String>,

    /// Name of the combined series.
    #[arg(long)]
    pub name: String,

    #[arg(long, allow_negative_numbers = true)]
    pub from_day: i64,

    /// Policy across series.
    #[arg(long, value_enum, default_value_t = AggregationPolicy::Sum)]
    pub between: AggregationPolicy,

    /// Policy within one day of one series (ignored with `--matching`).
    #[arg(long, value_enum, default_value_t = AggregationPolicy::Avg)]
    pub within: AggregationPolicy,

    /// The series already share their day axis.
    #[arg(long)]
    pub matching: bool,

    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SmoothArgs {
    #[command(flatten)]
    pub input: SeriesInput,

    #[arg(long, default_value_t = DEFAULT_SMOOTHING_DAYS)]
    pub window: u32,

    #[arg(long, value_enum, default_value_t = AggregationPolicy::Avg)]
    pub policy: AggregationPolicy,

    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CumulateArgs {
    #[command(flatten)]
    pub input: SeriesInput,

    /// Name of the cumulated series.
    #[arg(long, default_value = "Cumulated")]
    pub name: String,

    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Directory to write the synthetic input files into.
    #[arg(long, default_value = "data")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of simulated days.
    #[arg(long, default_value_t = 120)]
    pub days: u32,
}
