//! Export derived series and summaries.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream
//! scripts: one `day,value` CSV per series, plain text for summaries.

use std::fs::{self, File};
use std::path::Path;

use crate::error::AppError;
use crate::series::{DaySeries, Series};

/// Write a series as `day,value` rows (raw insertion order).
pub fn write_series_csv(path: &Path, series: &Series) -> Result<(), AppError> {
    let rows = series.points().iter().map(|p| (p.day, p.value));
    write_rows(path, rows)
}

/// Write resampled axes as `day,value` rows.
pub fn write_day_series_csv(path: &Path, series: &DaySeries) -> Result<(), AppError> {
    let rows = series.days.iter().zip(&series.values).map(|(d, v)| (*d as f64, *v));
    write_rows(path, rows)
}

fn write_rows(path: &Path, rows: impl Iterator<Item = (f64, f64)>) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["day", "value"])
        .map_err(|e| AppError::output(format!("Failed to write export CSV header: {e}")))?;
    for (day, value) in rows {
        writer
            .write_record([day.to_string(), value.to_string()])
            .map_err(|e| AppError::output(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Overwrite a text file (summaries, rendered dashboard).
pub fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    ensure_parent(path)?;
    fs::write(path, text).map_err(|e| AppError::output(format!("Failed to write '{}': {e}", path.display())))
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::output(format!("Failed to write JSON '{}': {e}", path.display())))
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::output(format!("Failed to create directory '{}': {e}", parent.display())))?;
    }
    Ok(())
}

/// File-name friendly form of a display name ("Total WIP Tyran" -> "total_wip_tyran").
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() { "series".to_string() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::series::points_from;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Total WIP Tyran"), "total_wip_tyran");
        assert_eq!(slugify("  Cash balance (k$) "), "cash_balance_k");
        assert_eq!(slugify("!!!"), "series");
    }

    #[test]
    fn series_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("demand.csv");
        let s = Series::new("Demand", Category::Demand, points_from(&[(1.0, 2.5), (2.0, 3.0)]), true);
        write_series_csv(&path, &s).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, "day,value\n1,2.5\n2,3\n");
    }
}
