//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and `.env` defaults
//! - sets up logging
//! - runs dashboard refreshes (once or in a loop)
//! - runs the single-series subcommands and the demo generator

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{AggregateArgs, Command, CumulateArgs, DashboardArgs, DemoArgs, ResampleArgs, SeriesInput, SmoothArgs};
use crate::domain::{Category, DashboardConfig};
use crate::error::AppError;
use crate::io::ingest::{load_series_groups, load_snapshot};
use crate::io::standing::{PersistMode, StandingBook};
use crate::report::format::format_points;
use crate::series::{DaySeries, Series, SeriesAggregator};

pub mod pipeline;

use pipeline::{DashboardOutput, RefreshState, TEAMS_DIR};

pub const ENV_OWN_TEAM: &str = "SCG_OWN_TEAM";
pub const ENV_INPUT_DIR: &str = "SCG_INPUT_DIR";
pub const ENV_OUTPUT_DIR: &str = "SCG_OUTPUT_DIR";

/// Entry point for the `scg` binary.
pub fn run() -> Result<(), AppError> {
    // `scg` and `scg --watch` behave like `scg dashboard ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    match cli.command {
        Command::Dashboard(args) => handle_dashboard(args),
        Command::Resample(args) => handle_resample(args),
        Command::Aggregate(args) => handle_aggregate(args),
        Command::Smooth(args) => handle_smooth(args),
        Command::Cumulate(args) => handle_cumulate(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("warn,scg_dash={default_level}")));

    // A second init (tests, embedding) is not an error worth failing over.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let config = dashboard_config_from_args(&args, |key| std::env::var(key).ok());
    let mode = persist_mode(&config);
    let mut book = StandingBook::new(config.output_dir.join(TEAMS_DIR), config.own_team.clone(), mode);
    let mut state = RefreshState::default();

    tracing::info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        ?mode,
        watch = config.watch,
        "starting dashboard"
    );

    loop {
        match refresh_once(&config, &mut book, &mut state) {
            Ok(Some(output)) => println!("{}", output.dashboard.render()),
            Ok(None) => {}
            // A broken tick in watch mode is retried on the next one.
            Err(err) if config.watch => tracing::error!(tick = state.ticks, "refresh failed: {err}"),
            Err(err) => return Err(err),
        }

        if !config.watch {
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(config.refresh_secs));
    }
}

/// One refresh tick. Returns `None` in cash-only mode.
pub fn refresh_once(
    config: &DashboardConfig,
    book: &mut StandingBook,
    state: &mut RefreshState,
) -> Result<Option<DashboardOutput>, AppError> {
    state.begin_tick();
    let snapshot = load_snapshot(&config.input_dir)?;
    let day = pipeline::current_day(&snapshot, config);

    pipeline::record_standings(book, &snapshot, day)?;
    if config.cash_only {
        tracing::info!(day, teams = book.teams().len(), "standings recorded");
        return Ok(None);
    }

    let output = pipeline::build_dashboard(&snapshot, book, config, &state.stamp());
    if config.writes_enabled() {
        pipeline::write_outputs(&config.output_dir, &output)?;
    }
    tracing::info!(day, tick = state.ticks, row_errors = snapshot.row_errors.len(), "dashboard refreshed");
    Ok(Some(output))
}

pub fn persist_mode(config: &DashboardConfig) -> PersistMode {
    if config.replay {
        PersistMode::ReadOnly
    } else if config.persist {
        PersistMode::Persist
    } else {
        PersistMode::MemoryOnly
    }
}

/// Build the dashboard config from flags, falling back to `env` lookups.
pub fn dashboard_config_from_args(args: &DashboardArgs, env: impl Fn(&str) -> Option<String>) -> DashboardConfig {
    let defaults = DashboardConfig::default();
    let dir = |flag: &Option<PathBuf>, key: &str, fallback: PathBuf| {
        flag.clone()
            .or_else(|| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .unwrap_or(fallback)
    };

    DashboardConfig {
        input_dir: dir(&args.input, ENV_INPUT_DIR, defaults.input_dir.clone()),
        output_dir: dir(&args.output, ENV_OUTPUT_DIR, defaults.output_dir.clone()),
        displayed_day: args.day,
        last_x_days: args.days,
        smoothing_days: args.smoothing,
        refresh_secs: args.refresh.max(1),
        watch: args.watch,
        persist: !args.no_persist,
        cash_only: args.cash_only,
        replay: args.replay,
        own_team: env(ENV_OWN_TEAM).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        ..defaults
    }
}

fn handle_resample(args: ResampleArgs) -> Result<(), AppError> {
    let series = load_one_series(&args.input)?;
    let aggregator = SeriesAggregator::new(args.window);
    let out = aggregator.resample_by_day(&series, args.input.from_day, args.policy, args.fill_gaps);

    print_day_series(&format!("{} ({:?} per day)", series.name(), args.policy), &out);
    if let Some(path) = &args.export {
        crate::io::export::write_day_series_csv(path, &out)?;
    }
    Ok(())
}

fn handle_aggregate(args: AggregateArgs) -> Result<(), AppError> {
    let mut errors = Vec::new();
    let groups = load_series_groups(&args.csv, "Series", Category::Aggregate, &mut errors)?;
    warn_row_errors(&errors);

    let series: Vec<Series> = match &args.group {
        Some(name) => groups
            .into_iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| g.series)
            .ok_or_else(|| AppError::input(format!("Group '{name}' not found in '{}'.", args.csv.display())))?,
        None => groups.into_iter().flat_map(|g| g.series).collect(),
    };

    let out = SeriesAggregator::default().aggregate_series_by_day(
        &args.name,
        &series,
        args.from_day,
        args.between,
        args.matching,
        args.within,
    );
    print_series(&out);
    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &out)?;
    }
    Ok(())
}

fn handle_smooth(args: SmoothArgs) -> Result<(), AppError> {
    let series = load_one_series(&args.input)?;
    let out = SeriesAggregator::default().smoothed(&series, args.input.from_day, args.window, args.policy);

    print_day_series(&format!("{} ({}d smoothed)", series.name(), args.window), &out);
    if let Some(path) = &args.export {
        crate::io::export::write_day_series_csv(path, &out)?;
    }
    Ok(())
}

fn handle_cumulate(args: CumulateArgs) -> Result<(), AppError> {
    let series = load_one_series(&args.input)?;
    let out = SeriesAggregator::default().cumulate(&args.name, &series, args.input.from_day);

    print_series(&out);
    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &out)?;
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = crate::data::DemoConfig {
        seed: args.seed,
        days: args.days,
    };
    let game = crate::data::generate_demo(&config)?;
    crate::data::write_demo(&args.output, &game)?;
    println!("Wrote {} simulated days to {}", game.day, args.output.display());
    Ok(())
}

/// Load the series selected by `--series` (case-insensitive), or the first one.
pub fn load_one_series(input: &SeriesInput) -> Result<Series, AppError> {
    select_series(&input.csv, input.series.as_deref())
}

fn select_series(path: &Path, label: Option<&str>) -> Result<Series, AppError> {
    let mut errors = Vec::new();
    let groups = load_series_groups(path, "Series", Category::Aggregate, &mut errors)?;
    warn_row_errors(&errors);

    let mut all = groups.into_iter().flat_map(|g| g.series);
    let found = match label {
        Some(label) => all.find(|s| s.name().eq_ignore_ascii_case(label)),
        None => all.next(),
    };
    found.ok_or_else(|| {
        AppError::input(match label {
                Some(label) => format!("Series '{label}' not found in '{}'.", path.display()),
                None => format!("No valid rows in '{}'.", path.display()),
            },
        )
    })
}

fn warn_row_errors(errors: &[crate::io::ingest::RowError]) {
    for e in errors {
        tracing::warn!(file = %e.file.display(), line = e.line, "skipped row: {}", e.message);
    }
}

fn print_series(series: &Series) {
    println!("{}", format_points(&series.to_string(), series.points().iter().map(|p| (p.day, p.value))));
}

fn print_day_series(title: &str, series: &DaySeries) {
    let rows = series.days.iter().zip(&series.values).map(|(d, v)| (*d as f64, *v));
    println!("{}", format_points(&format!("{title}: {} days", series.len()), rows));
}

/// Rewrite argv so `scg` defaults to `scg dashboard`.
///
/// Rules:
/// - `scg`                      -> `scg dashboard`
/// - `scg --watch ...`          -> `scg dashboard --watch ...`
/// - `scg --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dashboard".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "dashboard" | "resample" | "aggregate" | "smooth" | "cumulate" | "demo"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "dashboard flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dashboard".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn dashboard_args(extra: &[&str]) -> DashboardArgs {
        let mut argv = args(&["scg", "dashboard"]);
        argv.extend(extra.iter().map(|s| s.to_string()));
        match crate::cli::Cli::parse_from(argv).command {
            Command::Dashboard(a) => a,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rewrite_defaults_to_dashboard() {
        assert_eq!(rewrite_args(args(&["scg"])), args(&["scg", "dashboard"]));
        assert_eq!(
            rewrite_args(args(&["scg", "--watch", "--days", "10"])),
            args(&["scg", "dashboard", "--watch", "--days", "10"])
        );
        assert_eq!(rewrite_args(args(&["scg", "--help"])), args(&["scg", "--help"]));
        assert_eq!(
            rewrite_args(args(&["scg", "smooth", "--csv", "x.csv"])),
            args(&["scg", "smooth", "--csv", "x.csv"])
        );
    }

    #[test]
    fn config_prefers_flags_over_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_INPUT_DIR, "env_in"),
            (ENV_OUTPUT_DIR, "env_out"),
            (ENV_OWN_TEAM, " Us "),
        ]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let config = dashboard_config_from_args(&dashboard_args(&["--input", "flag_in"]), lookup);
        assert_eq!(config.input_dir, PathBuf::from("flag_in"));
        assert_eq!(config.output_dir, PathBuf::from("env_out"));
        assert_eq!(config.own_team.as_deref(), Some("Us"));
        assert_eq!(config.last_x_days, 30);
        assert!(config.writes_enabled());

        let bare = dashboard_config_from_args(&dashboard_args(&["--replay"]), |_| None);
        assert_eq!(bare.input_dir, PathBuf::from("data"));
        assert_eq!(persist_mode(&bare), PersistMode::ReadOnly);
        assert!(!bare.writes_enabled());
    }

    #[test]
    fn cash_only_records_standings_without_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let game = crate::data::generate_demo(&crate::data::DemoConfig { seed: 5, days: 20 }).unwrap();
        crate::data::write_demo(&input, &game).unwrap();

        let config = DashboardConfig {
            input_dir: input,
            output_dir: dir.path().join("out"),
            cash_only: true,
            ..DashboardConfig::default()
        };
        let mut book = StandingBook::new(config.output_dir.join(TEAMS_DIR), None, persist_mode(&config));
        let mut state = RefreshState::default();

        let out = refresh_once(&config, &mut book, &mut state).unwrap();
        assert!(out.is_none());
        assert_eq!(book.teams().len(), 4);
        assert!(!config.output_dir.join(pipeline::DASHBOARD_TEXT_FILE).exists());
        assert!(config.output_dir.join(TEAMS_DIR).join("team_alpha.csv").exists());
    }

    #[test]
    fn full_refresh_writes_outputs_from_demo() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let game = crate::data::generate_demo(&crate::data::DemoConfig { seed: 9, days: 60 }).unwrap();
        crate::data::write_demo(&input, &game).unwrap();

        let config = DashboardConfig {
            input_dir: input,
            output_dir: dir.path().join("out"),
            ..DashboardConfig::default()
        };
        let mut book = StandingBook::new(config.output_dir.join(TEAMS_DIR), None, persist_mode(&config));
        let mut state = RefreshState::default();

        let out = refresh_once(&config, &mut book, &mut state).unwrap().unwrap();
        assert_eq!(out.day, 60);
        assert_eq!(out.series.wip_by_region.len(), 1);
        assert_eq!(out.series.inventory_by_region.len(), 2);
        assert!(config.output_dir.join(pipeline::DASHBOARD_TEXT_FILE).exists());
        assert!(config.output_dir.join(pipeline::ORDER_SUMMARY_FILE).exists());

        assert_eq!(out.series.region_demand.len(), 5);
        assert!(out.series.region_demand.iter().all(|r| r.lost.is_some() && r.met.is_some()));
        let rules = std::fs::read_to_string(config.output_dir.join(pipeline::FACTORY_CONFIG_SUMMARY_FILE)).unwrap();
        assert!(rules.contains("Truck 150/300/1"));
    }

    #[test]
    fn missing_series_label_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.csv");
        std::fs::write(&path, "series,day,value\ntyran,1,2\n").unwrap();

        assert_eq!(select_series(&path, Some("TYRAN")).unwrap().name(), "Tyran");
        assert_eq!(select_series(&path, None).unwrap().len(), 1);
        assert_eq!(select_series(&path, Some("Fardo")).unwrap_err().exit_code(), 2);
    }
}
