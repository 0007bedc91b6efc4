//! Fixed-width text tables.
//!
//! Every summary is rendered the same way: a banner headline, a header line,
//! a dashed rule and one line per row. Trailing spaces are trimmed so the
//! files diff cleanly between refreshes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub fn new(title: impl Into<String>, width: usize, align: Align) -> Self {
        Self {
            title: title.into(),
            width,
            align,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextTable {
    headline: String,
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headline: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            headline: headline.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row; missing cells render empty, extra cells are dropped.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&banner(&self.headline));
        out.push('\n');

        let titles: Vec<String> = self.columns.iter().map(|c| c.title.clone()).collect();
        push_line(&mut out, &self.columns, &titles, false);

        let rule: Vec<String> = self.columns.iter().map(|c| "-".repeat(c.width)).collect();
        push_line(&mut out, &self.columns, &rule, true);

        for row in &self.rows {
            push_line(&mut out, &self.columns, row, false);
        }
        out
    }
}

/// `==== TITLE ====` with the title centered in a 60-char band.
pub fn banner(title: &str) -> String {
    let inner = format!(" {title} ");
    let width = 60usize.max(inner.chars().count() + 2);
    format!("{inner:=^width$}")
}

fn push_line(out: &mut String, columns: &[Column], cells: &[String], raw: bool) {
    let parts: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            if raw {
                return cell.to_string();
            }
            let text = truncate(cell, col.width);
            let w = col.width;
            match col.align {
                Align::Left => format!("{text:<w$}"),
                Align::Right => format!("{text:>w$}"),
                Align::Center => format!("{text:^w$}"),
            }
        })
        .collect();
    out.push_str(parts.join(" ").trim_end());
    out.push('\n');
}

/// Two-column `day value` listing under a descriptor line.
pub fn format_points(descriptor: &str, rows: impl IntoIterator<Item = (f64, f64)>) -> String {
    let mut out = String::new();
    out.push_str(descriptor);
    out.push('\n');
    out.push_str(&format!("{:>10} {:>14}\n", "day", "value"));
    out.push_str(&format!("{:-<10} {:-<14}\n", "", ""));
    for (day, value) in rows {
        out.push_str(&format!("{:>10} {:>14}\n", fmt_num(day), fmt_num(value)));
    }
    out
}

/// Whole numbers without decimals, everything else with two.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "---".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

pub fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "---".to_string(), fmt_num)
}

/// Round half away from zero to two decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
