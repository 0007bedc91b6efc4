//! The `Series` type: a named, categorized list of raw `(day, value)` samples.
//!
//! A series is built once from raw samples and is otherwise read-only; the one
//! exception is [`Series::scale_values`], which converts units in place.
//! Everything derived from a series (resampled, aggregated, cumulated) is a new
//! value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Category, default_color};

/// One raw sample. `day` may be fractional (intra-day samples).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub day: f64,
    pub value: f64,
}

impl Point {
    pub fn new(day: f64, value: f64) -> Self {
        Self { day, value }
    }
}

impl From<(f64, f64)> for Point {
    fn from((day, value): (f64, f64)) -> Self {
        Self { day, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    category: Category,
    points: Vec<Point>,
    color: &'static str,
}

impl Series {
    /// Build a series from raw samples.
    ///
    /// The display color is picked from the name as given; `capitalize` then
    /// rewrites the name sentence-style ("total WIP" -> "Total wip").
    pub fn new(name: impl Into<String>, category: Category, points: Vec<Point>, capitalize: bool) -> Self {
        let name = name.into();
        let color = default_color(&name);
        let name = if capitalize { capitalize_name(&name) } else { name };
        Self {
            name,
            category,
            points,
            color,
        }
    }

    /// An empty series (no points) of the given category.
    pub fn empty(name: impl Into<String>, category: Category) -> Self {
        Self::new(name, category, Vec::new(), false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    /// Raw points in insertion order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Multiply every value in place (e.g. thousands -> units for cash).
    pub fn scale_values(&mut self, multiplier: f64) -> &mut Self {
        for p in &mut self.points {
            p.value *= multiplier;
        }
        self
    }

    /// Raw days in insertion order.
    pub fn x(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.day).collect()
    }

    /// Raw values in insertion order.
    pub fn y(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Points with `day >= from_day`, sorted ascending by day.
    ///
    /// The boundary is found by scanning the sorted points from the end for the
    /// last point before `from_day`, so the result always starts at the first
    /// point on or after `from_day` even if that exact day has no sample.
    pub fn filter_from_day(&self, from_day: i64) -> Vec<Point> {
        let mut sorted = self.points.clone();
        sorted.sort_by(|a, b| a.day.total_cmp(&b.day));

        let from = from_day as f64;
        let start = sorted.iter().rposition(|p| p.day < from).map_or(0, |idx| idx + 1);
        sorted.split_off(start)
    }

    pub fn from_day_x(&self, from_day: i64) -> Vec<f64> {
        self.filter_from_day(from_day).iter().map(|p| p.day).collect()
    }

    pub fn from_day_y(&self, from_day: i64) -> Vec<f64> {
        self.filter_from_day(from_day).iter().map(|p| p.value).collect()
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({} values)", self.category, self.name, self.points.len())
    }
}

fn capitalize_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Shorthand for building point lists in tests and generators.
pub fn points_from(pairs: &[(f64, f64)]) -> Vec<Point> {
    pairs.iter().copied().map(Point::from).collect()
}
