//! CSV ingest of game data.
//!
//! The scraping layer (or `scg demo`) drops long-format CSV files into an input
//! directory; this module turns them into `Series`, standings and history
//! records.
//!
//! Design goals:
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Missing files are empty data** when loading a whole snapshot, so a
//!   refresh never fails because one page had nothing to plot
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::Category;
use crate::error::AppError;
use crate::history::{HistoryLog, HistoryRecord};
use crate::series::{Point, Series};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

/// Several series that belong together (e.g. one region's inventories).
#[derive(Debug, Clone)]
pub struct SeriesGroup {
    pub name: String,
    pub series: Vec<Series>,
}

/// Current day and cash as shown on the game's landing page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralData {
    pub day: i64,
    pub cash: f64,
}

/// One team's current standing (cash).
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub team: String,
    pub value: f64,
}

/// One shipping rule of a factory towards a target region.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingConfig {
    pub factory: String,
    pub target: String,
    /// `Mail` or `Truck`.
    pub method: String,
    pub order_point: i64,
    pub quantity: i64,
    pub priority: i64,
}

/// Everything read from one input directory on one refresh tick.
#[derive(Debug, Clone, Default)]
pub struct GameSnapshot {
    pub general: Option<GeneralData>,
    pub demand: Vec<Series>,
    pub lost_demand: Vec<Series>,
    pub shipments: Vec<Series>,
    pub cash: Vec<Series>,
    /// One group per region: Warehouse / Mail / Truck.
    pub inventory: Vec<SeriesGroup>,
    /// One group per factory region: one series per destination.
    pub wip: Vec<SeriesGroup>,
    pub standings: Vec<Standing>,
    pub factory_configs: Vec<ShippingConfig>,
    pub history: HistoryLog,
    pub row_errors: Vec<RowError>,
}

pub const GENERAL_FILE: &str = "general.csv";
pub const DEMAND_FILE: &str = "demand.csv";
pub const LOST_DEMAND_FILE: &str = "lost_demand.csv";
pub const SHIPMENTS_FILE: &str = "shipments.csv";
pub const CASH_FILE: &str = "cash.csv";
pub const INVENTORY_FILE: &str = "inventory.csv";
pub const WIP_FILE: &str = "wip.csv";
pub const STANDING_FILE: &str = "standing.csv";
pub const HISTORY_FILE: &str = "history.csv";
pub const FACTORY_CONFIG_FILE: &str = "factory_config.csv";

/// Load every known file from `dir`. Missing files are treated as empty.
pub fn load_snapshot(dir: &Path) -> Result<GameSnapshot, AppError> {
    if !dir.is_dir() {
        return Err(AppError::input(format!("Input directory '{}' does not exist.", dir.display())));
    }

    let mut snapshot = GameSnapshot::default();
    let mut errors = Vec::new();

    let path = dir.join(GENERAL_FILE);
    if path.exists() {
        snapshot.general = load_general(&path, &mut errors)?;
    }

    snapshot.demand = load_optional_series(&dir.join(DEMAND_FILE), "Demand", Category::Demand, &mut errors)?;
    snapshot.lost_demand =
        load_optional_series(&dir.join(LOST_DEMAND_FILE), "Lost demand", Category::Demand, &mut errors)?;
    snapshot.shipments = load_optional_series(&dir.join(SHIPMENTS_FILE), "Met demand", Category::Demand, &mut errors)?;
    snapshot.cash = load_optional_series(&dir.join(CASH_FILE), "Cash balance", Category::Cash, &mut errors)?;

    let path = dir.join(INVENTORY_FILE);
    if path.exists() {
        snapshot.inventory = load_series_groups(&path, "Inventory", Category::Inventory, &mut errors)?;
    }
    let path = dir.join(WIP_FILE);
    if path.exists() {
        snapshot.wip = load_series_groups(&path, "WIP", Category::Wip, &mut errors)?;
    }

    let path = dir.join(STANDING_FILE);
    if path.exists() {
        snapshot.standings = load_standings(&path, &mut errors)?;
    }
    let path = dir.join(FACTORY_CONFIG_FILE);
    if path.exists() {
        snapshot.factory_configs = load_factory_configs(&path, &mut errors)?;
    }
    let path = dir.join(HISTORY_FILE);
    if path.exists() {
        snapshot.history = load_history(&path, &mut errors)?;
    }

    for e in &errors {
        tracing::warn!(file = %e.file.display(), line = e.line, "skipped row: {}", e.message);
    }
    snapshot.row_errors = errors;

    Ok(snapshot)
}

fn load_optional_series(
    path: &Path,
    default_name: &str,
    category: Category,
    errors: &mut Vec<RowError>,
) -> Result<Vec<Series>, AppError> {
    if !path.exists() {
        tracing::debug!(file = %path.display(), "input file missing; using empty series list");
        return Ok(Vec::new());
    }
    load_series(path, default_name, category, errors)
}

/// Load a `series,day,value` file. Labels keep their first-seen order.
///
/// An empty or missing `series` label falls back to `default_name`.
pub fn load_series(
    path: &Path,
    default_name: &str,
    category: Category,
    errors: &mut Vec<RowError>,
) -> Result<Vec<Series>, AppError> {
    let groups = load_series_groups(path, default_name, category, errors)?;
    Ok(groups.into_iter().flat_map(|g| g.series).collect())
}

/// Load a `group,series,day,value` file. Groups and labels keep their
/// first-seen order; a missing `group` column puts everything in one group
/// named `default_name`.
pub fn load_series_groups(
    path: &Path,
    default_name: &str,
    category: Category,
    errors: &mut Vec<RowError>,
) -> Result<Vec<SeriesGroup>, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    ensure_columns(path, &header_map, &["day", "value"])?;

    let mut groups: Vec<(String, Vec<(String, Vec<Point>)>)> = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(row_error(path, line, format!("CSV parse error: {e}")));
                continue;
            }
        };

        let point = match parse_point(&record, &header_map) {
            Ok(p) => p,
            Err(message) => {
                errors.push(row_error(path, line, message));
                continue;
            }
        };

        let group = get_optional(&record, &header_map, "group").unwrap_or(default_name);
        let label = get_optional(&record, &header_map, "series").unwrap_or(default_name);

        let group_idx = match groups.iter().position(|(name, _)| name == group) {
            Some(i) => i,
            None => {
                groups.push((group.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        let labels = &mut groups[group_idx].1;
        match labels.iter().position(|(name, _)| name == label) {
            Some(i) => labels[i].1.push(point),
            None => labels.push((label.to_string(), vec![point])),
        }
    }

    Ok(groups
        .into_iter()
        .map(|(name, labels)| SeriesGroup {
            name,
            series: labels
                .into_iter()
                .map(|(label, points)| Series::new(label, category, points, true))
                .collect(),
        })
        .collect())
}

/// Load `general.csv` (`day,cash`); the last valid row wins.
pub fn load_general(path: &Path, errors: &mut Vec<RowError>) -> Result<Option<GeneralData>, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    ensure_columns(path, &header_map, &["day", "cash"])?;

    let mut general = None;
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let day = parse_number(get_required(&record, &header_map, "day")?)?;
                let cash = parse_number(get_required(&record, &header_map, "cash")?)?;
                Ok(GeneralData {
                    day: day.trunc() as i64,
                    cash,
                })
            });
        match parsed {
            Ok(g) => general = Some(g),
            Err(message) => errors.push(row_error(path, line, message)),
        }
    }
    Ok(general)
}

/// Load `standing.csv` (`team,value`).
pub fn load_standings(path: &Path, errors: &mut Vec<RowError>) -> Result<Vec<Standing>, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    ensure_columns(path, &header_map, &["team", "value"])?;

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let team = get_required(&record, &header_map, "team")?.to_string();
                let value = parse_number(get_required(&record, &header_map, "value")?.trim_start_matches('$'))?;
                Ok(Standing { team, value })
            });
        match parsed {
            Ok(s) => out.push(s),
            Err(message) => errors.push(row_error(path, line, message)),
        }
    }
    Ok(out)
}

/// Load `factory_config.csv` (`factory,target,method,order_point,quantity,priority`).
///
/// Numeric fields are truncated to whole numbers.
pub fn load_factory_configs(path: &Path, errors: &mut Vec<RowError>) -> Result<Vec<ShippingConfig>, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    ensure_columns(
        path,
        &header_map,
        &["factory", "target", "method", "order_point", "quantity", "priority"],
    )?;

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let text = |name: &str| get_required(&record, &header_map, name).map(str::to_string);
                let whole = |name: &str| {
                    get_required(&record, &header_map, name)
                        .and_then(parse_number)
                        .map(|v| v.trunc() as i64)
                };
                Ok(ShippingConfig {
                    factory: text("factory")?,
                    target: text("target")?,
                    method: text("method")?,
                    order_point: whole("order_point")?,
                    quantity: whole("quantity")?,
                    priority: whole("priority")?,
                })
            });
        match parsed {
            Ok(c) => out.push(c),
            Err(message) => errors.push(row_error(path, line, message)),
        }
    }
    Ok(out)
}

/// Load `history.csv` (`day,text,operation,factory,warehouse,value`).
pub fn load_history(path: &Path, errors: &mut Vec<RowError>) -> Result<HistoryLog, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    ensure_columns(path, &header_map, &["day", "operation"])?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let day = parse_number(get_required(&record, &header_map, "day")?)?;
                let text = |name: &str| get_optional(&record, &header_map, name).unwrap_or("").to_string();
                Ok(HistoryRecord::new(
                    day,
                    text("text"),
                    text("operation"),
                    text("factory"),
                    text("warehouse"),
                    text("value"),
                ))
            });
        match parsed {
            Ok(r) => records.push(r),
            Err(message) => errors.push(row_error(path, line, message)),
        }
    }
    Ok(HistoryLog::new(records))
}

fn open_csv(path: &Path) -> Result<(csv::Reader<File>, HashMap<String, usize>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();

    Ok((reader, build_header_map(&headers)))
}

fn ensure_columns(path: &Path, header_map: &HashMap<String, usize>, required: &[&str]) -> Result<(), AppError> {
    for name in required {
        if !header_map.contains_key(*name) {
            return Err(AppError::input(format!("Missing required column `{name}` in '{}'.", path.display())));
        }
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_point(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Point, String> {
    let day = parse_number(get_required(record, header_map, "day")?)?;
    let value = parse_number(get_required(record, header_map, "value")?)?;
    Ok(Point::new(day, value))
}

/// Parse a number that may carry thousands separators ("1,234.5").
pub fn parse_number(s: &str) -> Result<f64, String> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    let v = cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite number '{s}'."))
    }
}

fn row_error(path: &Path, line: usize, message: String) -> RowError {
    RowError {
        file: path.to_path_buf(),
        line,
        message,
    }
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}
