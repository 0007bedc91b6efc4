//! Day-bucketed resampling, smoothing and cumulation.
//!
//! All operations are total: empty inputs produce empty (or zero-filled)
//! outputs instead of errors, so a refresh tick never fails on missing data.

use crate::domain::{AggregationPolicy, Category, DEFAULT_WINDOW_DAYS};
use crate::series::types::{Point, Series};

/// Parallel day/value axes produced by resampling.
///
/// `days` are whole simulated days, strictly ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySeries {
    pub days: Vec<i64>,
    pub values: Vec<f64>,
}

impl DaySeries {
    fn with_capacity(n: usize) -> Self {
        Self {
            days: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, day: i64, value: f64) {
        self.days.push(day);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Convert back to a (non-capitalized) series.
    pub fn into_series(self, name: impl Into<String>, category: Category) -> Series {
        let points = self
            .days
            .into_iter()
            .zip(self.values)
            .map(|(day, value)| Point::new(day as f64, value))
            .collect();
        Series::new(name, category, points, false)
    }

    /// Insert carry-forward buckets for every day missing before `day`.
    fn fill_gap_before(&mut self, day: i64, from_day: i64) {
        let mut next = self.days.last().map_or(from_day, |d| d.saturating_add(1));
        let carry = self.values.last().copied().unwrap_or(0.0);
        while day > next {
            self.push(next, carry);
            next += 1;
        }
    }
}

/// The resampling/aggregation engine.
///
/// The only state is the length of the zero-filled window returned for empty
/// inputs, so charts never show "no data" as a visual break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesAggregator {
    window_len: u32,
}

impl Default for SeriesAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl SeriesAggregator {
    pub fn new(window_len: u32) -> Self {
        Self { window_len }
    }

    /// Collapse samples to one value per rounded day, starting at `from_day`.
    ///
    /// - MAX / MIN / LAST pick the extreme or last-scanned value of each day.
    /// - any other policy (AVG, SUM) averages the day's samples.
    /// - with `fill_gaps`, missing days from `from_day` on are filled with the
    ///   previous bucket's value (0 before the first bucket). Leading zeros
    ///   never start before day 0, the first day of a game.
    ///
    /// Without any sample on or after `from_day`, the result is a zero series
    /// over `from_day..=from_day + window_len`, cut short at `i64::MAX`.
    pub fn resample_by_day(
        &self,
        series: &Series,
        from_day: i64,
        policy: AggregationPolicy,
        fill_gaps: bool,
    ) -> DaySeries {
        let points = series.filter_from_day(from_day);
        if points.is_empty() {
            return self.zero_window(from_day);
        }

        let fill_start = from_day.max(0);
        let mut out = DaySeries::with_capacity(points.len());
        let mut idx = 0;
        while idx < points.len() {
            let day = round_day(points[idx].day);
            let first = points[idx].value;
            idx += 1;

            if fill_gaps {
                out.fill_gap_before(day, fill_start);
            }

            let run = points[idx..]
                .iter()
                .take_while(|p| round_day(p.day) == day)
                .count();
            let value = merge_bucket(first, &points[idx..idx + run], policy);
            idx += run;

            out.push(day, value);
        }
        out
    }

    /// Centered moving mean over the gap-filled resampled series.
    ///
    /// Resampling starts `window_days` before `from_day` so the first emitted
    /// days have lookback. For index `i` the window is
    /// `values[i - h .. min(len - 1, i + h)]` (end exclusive) with
    /// `h = (window_days - 1) / 2`; a zero-width window yields the value at
    /// its start. A `window_days` of 0 is treated as 1.
    pub fn smoothed(
        &self,
        series: &Series,
        from_day: i64,
        window_days: u32,
        policy: AggregationPolicy,
    ) -> DaySeries {
        let window = i64::from(window_days.max(1));
        let lookback = from_day.saturating_sub(window).max(0);
        let base = self.resample_by_day(series, lookback, policy, true);

        let half = ((window - 1) / 2) as usize;
        let len = base.len();
        let mut out = DaySeries::with_capacity(len);

        for i in 0..len {
            if base.days[i] < from_day {
                continue;
            }
            let start = i.saturating_sub(half);
            let end = (i + half).min(len - 1);
            let value = if end > start {
                let sum = base.values[start..end].iter().fold(0.0, |acc, v| acc + v);
                sum / (end - start) as f64
            } else {
                base.values[start]
            };
            out.push(base.days[i], value);
        }
        out
    }

    /// Running total of the daily averages, sliced by array index.
    ///
    /// The series is resampled from day 0 (no gap filling) and summed over its
    /// whole length. The result then starts at *index* `from_day`, not at day
    /// `from_day`; a negative index counts from the end.
    pub fn cumulate(&self, new_name: &str, series: &Series, from_day: i64) -> Series {
        let base = self.resample_by_day(series, 0, AggregationPolicy::Avg, false);

        let mut points = Vec::with_capacity(base.len());
        if base.days.len() == base.values.len() && !base.is_empty() {
            let mut running = base.values[0];
            points.push(Point::new(base.days[0] as f64, running));
            for (day, value) in base.days.iter().zip(&base.values).skip(1) {
                running += value;
                points.push(Point::new(*day as f64, running));
            }
        }

        let start = slice_start(points.len(), from_day);
        Series::new(new_name, Category::Cumulated, points.split_off(start), false)
    }

    fn zero_window(&self, from_day: i64) -> DaySeries {
        let days: Vec<i64> = (from_day..=from_day.saturating_add(i64::from(self.window_len))).collect();
        let values = vec![0.0; days.len()];
        DaySeries { days, values }
    }
}

/// Round a fractional day half-to-even (2.5 -> 2, 3.5 -> 4).
pub fn round_day(day: f64) -> i64 {
    day.round_ties_even() as i64
}

fn merge_bucket(first: f64, rest: &[Point], policy: AggregationPolicy) -> f64 {
    match policy {
        AggregationPolicy::Max => rest.iter().fold(first, |acc, p| if p.value > acc { p.value } else { acc }),
        AggregationPolicy::Min => rest.iter().fold(first, |acc, p| if p.value < acc { p.value } else { acc }),
        AggregationPolicy::Last => rest.last().map_or(first, |p| p.value),
        AggregationPolicy::Sum | AggregationPolicy::Avg => {
            let sum = rest.iter().fold(first, |acc, p| acc + p.value);
            sum / (rest.len() + 1) as f64
        }
    }
}

fn slice_start(len: usize, index: i64) -> usize {
    if index >= 0 {
        usize::try_from(index).map_or(len, |i| i.min(len))
    } else {
        let back = usize::try_from(index.unsigned_abs()).unwrap_or(usize::MAX);
        len.saturating_sub(back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::types::points_from;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn series(pairs: &[(f64, f64)]) -> Series {
        Series::new("Demand", Category::Demand, points_from(pairs), true)
    }

    #[test]
    fn average_merges_same_day_samples() {
        let agg = SeriesAggregator::default();
        let out = agg.resample_by_day(&series(&[(1.0, 10.0), (1.0, 20.0), (2.0, 30.0)]), 1, AggregationPolicy::Avg, false);
        assert_eq!(out.days, vec![1, 2]);
        assert_eq!(out.values, vec![15.0, 30.0]);
    }

    #[test]
    fn empty_input_yields_zero_window() {
        let agg = SeriesAggregator::default();
        let out = agg.resample_by_day(&series(&[]), 5, AggregationPolicy::Avg, false);
        assert_eq!(out.days, (5..=35).collect::<Vec<_>>());
        assert_eq!(out.values.len(), 31);
        assert!(out.values.iter().all(|v| *v == 0.0));

        // Same when every sample is before the boundary.
        let out = SeriesAggregator::new(3).resample_by_day(&series(&[(1.0, 9.0)]), 10, AggregationPolicy::Max, true);
        assert_eq!(out.days, vec![10, 11, 12, 13]);
    }

    #[test]
    fn max_min_last_policies() {
        let agg = SeriesAggregator::default();
        let s = series(&[(3.2, 5.0), (2.9, 1.0), (3.1, -4.0), (4.0, 8.0)]);

        let max = agg.resample_by_day(&s, 0, AggregationPolicy::Max, false);
        assert_eq!(max.days, vec![3, 4]);
        assert_eq!(max.values, vec![5.0, 8.0]);

        let min = agg.resample_by_day(&s, 0, AggregationPolicy::Min, false);
        assert_eq!(min.values, vec![-4.0, 8.0]);

        // Scan order is day order after sorting: 2.9, 3.1, 3.2.
        let last = agg.resample_by_day(&s, 0, AggregationPolicy::Last, false);
        assert_eq!(last.values, vec![5.0, 8.0]);
    }

    #[test]
    fn sum_behaves_like_average_within_one_series() {
        let agg = SeriesAggregator::default();
        let s = series(&[(1.0, 2.0), (1.2, 4.0)]);
        let sum = agg.resample_by_day(&s, 0, AggregationPolicy::Sum, false);
        assert_eq!(sum.values, vec![3.0]);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_day(2.5), 2);
        assert_eq!(round_day(3.5), 4);
        assert_eq!(round_day(3.49), 3);
        assert_eq!(round_day(-0.5), 0);

        let agg = SeriesAggregator::default();
        let out = agg.resample_by_day(&series(&[(2.5, 1.0), (2.0, 3.0), (3.5, 7.0)]), 2, AggregationPolicy::Avg, false);
        assert_eq!(out.days, vec![2, 4]);
        assert_eq!(out.values, vec![2.0, 7.0]);
    }

    #[test]
    fn gap_fill_carries_last_value_forward() {
        let agg = SeriesAggregator::default();
        let out = agg.resample_by_day(&series(&[(3.0, 4.0), (6.0, 9.0)]), 1, AggregationPolicy::Last, true);
        assert_eq!(out.days, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(out.values, vec![0.0, 0.0, 4.0, 4.0, 4.0, 9.0]);
    }

    #[test]
    fn resample_is_idempotent_on_unique_days() {
        let agg = SeriesAggregator::default();
        let s = series(&[(1.0, 1.0), (1.4, 5.0), (2.0, 2.0), (4.0, 8.0)]);
        for policy in [AggregationPolicy::Avg, AggregationPolicy::Last] {
            let once = agg.resample_by_day(&s, 1, policy, false);
            let again = agg.resample_by_day(&once.clone().into_series("r", Category::Demand), 1, policy, false);
            assert_eq!(once, again);
        }
    }

    #[test]
    fn smoothing_with_window_one_is_identity() {
        let agg = SeriesAggregator::default();
        let s = series(&[(1.0, 3.0), (2.0, 6.0), (2.2, 8.0), (4.0, 1.0), (6.0, 5.0)]);
        let smooth = agg.smoothed(&s, 3, 1, AggregationPolicy::Avg);
        let plain = agg.resample_by_day(&s, 2, AggregationPolicy::Avg, true);

        let expected_days: Vec<i64> = plain.days.iter().copied().filter(|d| *d >= 3).collect();
        let expected_values: Vec<f64> = plain
            .days
            .iter()
            .zip(&plain.values)
            .filter(|(d, _)| **d >= 3)
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(smooth.days, expected_days);
        assert_eq!(smooth.values, expected_values);
    }

    #[test]
    fn smoothing_uses_half_open_window() {
        let agg = SeriesAggregator::default();
        let s = series(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0)]);
        // window 3 -> h = 1; from_day 0 -> lookback 0.
        let out = agg.smoothed(&s, 0, 3, AggregationPolicy::Avg);
        assert_eq!(out.days, vec![0, 1, 2, 3, 4]);
        // i=0: [0..1) -> 1; i=1: [0..2) -> 1.5; i=2: [1..3) -> 2.5;
        // i=3: [2..4) -> 3.5; i=4: [3..4) -> 4.
        assert_relative_eq!(out.values[0], 1.0);
        assert_relative_eq!(out.values[1], 1.5);
        assert_relative_eq!(out.values[2], 2.5);
        assert_relative_eq!(out.values[3], 3.5);
        assert_relative_eq!(out.values[4], 4.0);
    }

    #[test]
    fn smoothing_zero_window_is_treated_as_one() {
        let agg = SeriesAggregator::default();
        let s = series(&[(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(agg.smoothed(&s, 0, 0, AggregationPolicy::Avg), agg.smoothed(&s, 0, 1, AggregationPolicy::Avg));
    }

    #[test]
    fn extreme_from_day_saturates() {
        let agg = SeriesAggregator::default();
        let out = agg.resample_by_day(&series(&[]), i64::MAX - 5, AggregationPolicy::Avg, false);
        assert_eq!(out.days, ((i64::MAX - 5)..=i64::MAX).collect::<Vec<_>>());
        assert!(out.values.iter().all(|v| *v == 0.0));

        let s = series(&[(0.0, 1.0), (1.0, 2.0)]);
        // Lookback clamps at day 0; every day is on or after i64::MIN.
        let smooth = agg.smoothed(&s, i64::MIN, 14, AggregationPolicy::Avg);
        assert_eq!(smooth.days, vec![0, 1]);

        let filled = agg.resample_by_day(&series(&[(3.0, 4.0)]), i64::MIN, AggregationPolicy::Last, true);
        assert_eq!(filled.days, vec![0, 1, 2, 3]);
        assert_eq!(filled.values, vec![0.0, 0.0, 0.0, 4.0]);

        let late = agg.smoothed(&s, i64::MAX, 14, AggregationPolicy::Avg);
        assert_eq!(late.days, vec![i64::MAX]);

        assert_eq!(agg.cumulate("Cum", &s, i64::MIN).len(), 2);
        assert!(agg.cumulate("Cum", &s, i64::MAX).is_empty());
    }

    #[test]
    fn cumulate_slices_by_index() {
        let agg = SeriesAggregator::default();
        let s = series(&[(0.0, 5.0), (1.0, 3.0), (2.0, 2.0)]);

        let full = agg.cumulate("Cum", &s, 0);
        assert_eq!(full.category(), Category::Cumulated);
        assert_eq!(full.y(), vec![5.0, 8.0, 10.0]);

        let sliced = agg.cumulate("Cum", &s, 1);
        assert_eq!(sliced.y(), vec![8.0, 10.0]);
        assert_eq!(sliced.x(), vec![1.0, 2.0]);

        // Index past the end -> empty; negative index counts from the end.
        assert!(agg.cumulate("Cum", &s, 10).is_empty());
        assert_eq!(agg.cumulate("Cum", &s, -1).y(), vec![10.0]);
        assert_eq!(agg.cumulate("Cum", &s, -10).len(), 3);
    }

    #[test]
    fn cumulate_index_is_not_a_day() {
        let agg = SeriesAggregator::default();
        // Days 10, 12, 15 (no gap filling): index 1 is day 12.
        let s = series(&[(10.0, 1.0), (12.0, 1.0), (15.0, 1.0)]);
        let out = agg.cumulate("Cum", &s, 1);
        assert_eq!(out.x(), vec![12.0, 15.0]);
        assert_eq!(out.y(), vec![2.0, 3.0]);
    }

    #[test]
    fn cumulate_of_empty_series_is_zero_window() {
        let agg = SeriesAggregator::new(4);
        let out = agg.cumulate("Cum", &series(&[]), 0);
        assert_eq!(out.x(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(out.y().iter().all(|v| *v == 0.0));
    }

    proptest! {
        #[test]
        fn gap_filled_days_are_contiguous(
            pairs in prop::collection::vec((0.0f64..60.0, -100.0f64..100.0), 0..40),
            from_day in 0i64..40,
        ) {
            let agg = SeriesAggregator::default();
            let out = agg.resample_by_day(&series(&pairs), from_day, AggregationPolicy::Last, true);
            prop_assert_eq!(out.days.len(), out.values.len());
            prop_assert_eq!(out.days[0], from_day);
            prop_assert!(out.days.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }
}
