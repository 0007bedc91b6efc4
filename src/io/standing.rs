//! Team standing histories persisted as CSV.
//!
//! Each team keeps two files:
//! - `<slug>.csv`: the full history, averaged per day, rewritten on every update
//! - `<slug>_raw.csv`: every observed point, append-only
//!
//! Both are header-less `day,value` rows.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::export::{ensure_parent, slugify};
use crate::series::Point;

/// What an update is allowed to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Update memory and both files.
    Persist,
    /// Update memory only.
    MemoryOnly,
    /// Ignore updates entirely (replaying old data).
    ReadOnly,
}

#[derive(Debug, Clone)]
pub struct TeamHistory {
    name: String,
    points: Vec<Point>,
    csv_path: PathBuf,
    raw_csv_path: PathBuf,
}

impl TeamHistory {
    /// Load the averaged history of `name` from `dir` (empty when missing).
    pub fn load(name: &str, dir: &Path) -> Result<Self, AppError> {
        let slug = slugify(name);
        let csv_path = dir.join(format!("{slug}.csv"));
        let raw_csv_path = dir.join(format!("{slug}_raw.csv"));

        let points = if csv_path.exists() { read_points(&csv_path)? } else { Vec::new() };

        Ok(Self {
            name: name.to_string(),
            points: averaged(&points),
            csv_path,
            raw_csv_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Averaged points, ascending by day.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn add_point(&mut self, point: Point, mode: PersistMode) -> Result<(), AppError> {
        self.add_points(&[point], mode)
    }

    pub fn add_points(&mut self, points: &[Point], mode: PersistMode) -> Result<(), AppError> {
        if mode == PersistMode::ReadOnly || points.is_empty() {
            return Ok(());
        }

        self.points.extend_from_slice(points);
        self.points = averaged(&self.points);

        if mode == PersistMode::Persist {
            for p in points {
                append_point(&self.raw_csv_path, *p)?;
            }
            write_points(&self.csv_path, &self.points)?;
        }
        Ok(())
    }

    /// Points from the end backward while `day >= from_day` (latest first).
    pub fn points_from_day(&self, from_day: f64) -> Vec<Point> {
        self.points
            .iter()
            .rev()
            .take_while(|p| p.day >= from_day)
            .copied()
            .collect()
    }
}

/// Sort by day and replace points sharing the exact same day by their mean.
pub fn averaged(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.day.total_cmp(&b.day));

    let mut out: Vec<Point> = Vec::with_capacity(sorted.len());
    let mut idx = 0;
    while idx < sorted.len() {
        let day = sorted[idx].day;
        let mut sum = sorted[idx].value;
        let mut count = 1usize;
        idx += 1;
        while idx < sorted.len() && sorted[idx].day == day {
            sum += sorted[idx].value;
            count += 1;
            idx += 1;
        }
        out.push(Point::new(day, sum / count as f64));
    }
    out
}

/// All known teams' histories, in first-seen order.
#[derive(Debug, Clone)]
pub struct StandingBook {
    dir: PathBuf,
    own_team: Option<String>,
    mode: PersistMode,
    teams: Vec<TeamHistory>,
}

impl StandingBook {
    pub fn new(dir: impl Into<PathBuf>, own_team: Option<String>, mode: PersistMode) -> Self {
        Self {
            dir: dir.into(),
            own_team,
            mode,
            teams: Vec::new(),
        }
    }

    pub fn teams(&self) -> &[TeamHistory] {
        &self.teams
    }

    /// Record `point` for `team`, loading its history on first sight.
    ///
    /// Our own team is skipped; its cash is already plotted from `cash.csv`.
    pub fn record(&mut self, team: &str, point: Point) -> Result<(), AppError> {
        if self.own_team.as_deref() == Some(team) {
            return Ok(());
        }

        let idx = match self.teams.iter().position(|t| t.name == team) {
            Some(idx) => idx,
            None => {
                self.teams.push(TeamHistory::load(team, &self.dir)?);
                self.teams.len() - 1
            }
        };
        self.teams[idx].add_point(point, self.mode)
    }
}

fn read_points(path: &Path) -> Result<Vec<Point>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::output(format!("Failed to open team history '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AppError::output(format!("Invalid team history '{}': {e}", path.display())))?;
        let parse = |col: usize| -> Result<f64, AppError> {
            record
                .get(col)
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| {
                    AppError::output(format!("Invalid team history '{}' at line {}.", path.display(), idx + 1))
                })
        };
        out.push(Point::new(parse(0)?, parse(1)?));
    }
    Ok(out)
}

fn write_points(path: &Path, points: &[Point]) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create team history '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    for p in points {
        writer
            .write_record([p.day.to_string(), p.value.to_string()])
            .map_err(|e| AppError::output(format!("Failed to write team history: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush team history '{}': {e}", path.display())))
}

fn append_point(path: &Path, point: Point) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::output(format!("Failed to open raw team history '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record([point.day.to_string(), point.value.to_string()])
        .map_err(|e| AppError::output(format!("Failed to append raw team history: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush raw team history '{}': {e}", path.display())))
}
