//! Dashboard panels and their plain-text rendering.

use serde::Serialize;

use crate::report::format::{fmt_opt, truncate};
use crate::series::Series;

/// One series as shown on a panel: descriptor plus window statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelLine {
    pub descriptor: String,
    pub color: String,
    pub latest: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PanelLine {
    /// Summarize the points of `series` with `day >= from_day`.
    pub fn from_series(series: &Series, from_day: i64) -> Self {
        let values = series.from_day_y(from_day);
        Self {
            descriptor: series.to_string(),
            color: series.color().to_string(),
            latest: values.last().copied(),
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub lines: Vec<PanelLine>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_series<'a>(mut self, series: impl IntoIterator<Item = &'a Series>, from_day: i64) -> Self {
        self.lines
            .extend(series.into_iter().map(|s| PanelLine::from_series(s, from_day)));
        self
    }

    pub fn push_line(&mut self, line: PanelLine) {
        self.lines.push(line);
    }
}

/// Everything shown for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub day: i64,
    pub from_day: i64,
    pub refreshed_at: String,
    pub panels: Vec<Panel>,
}

impl Dashboard {
    pub fn panel(&self, title: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.title == title)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("=== scg - Supply Chain Game Dashboard ===\n");
        out.push_str(&format!(
            "Day: {} | window: [{}, {}] | refreshed: {}\n",
            self.day, self.from_day, self.day, self.refreshed_at
        ));

        for panel in &self.panels {
            out.push('\n');
            out.push_str(&format!("{}:\n", panel.title));
            if panel.lines.is_empty() {
                out.push_str("  (no data)\n");
                continue;
            }
            for line in &panel.lines {
                out.push_str(
                    format!(
                        "  {:<44} last={:>12} min={:>12} max={:>12}\n",
                        truncate(&line.descriptor, 44),
                        fmt_opt(line.latest),
                        fmt_opt(line.min),
                        fmt_opt(line.max),
                    )
                    .trim_end(),
                );
                out.push('\n');
            }
        }
        out
    }
}
