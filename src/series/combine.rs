//! Cross-series combination.

use crate::domain::{AggregationPolicy, Category};
use crate::series::resample::SeriesAggregator;
use crate::series::types::{Point, Series};

/// Combine value lists index by index.
///
/// Lists may differ in length; the output is as long as the longest list and
/// each index only combines the lists that reach it.
///
/// - MAX starts from 0, so an index where every present value is negative
///   yields 0.
/// - MIN starts from +infinity.
/// - SUM adds the present values.
/// - anything else averages the present values (0 when none are present).
pub fn combine_by_index(value_lists: &[Vec<f64>], policy: AggregationPolicy) -> Vec<f64> {
    let len = value_lists.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(len);

    for idx in 0..len {
        let present = value_lists.iter().filter_map(|list| list.get(idx).copied());
        let value = match policy {
            AggregationPolicy::Max => present.fold(0.0, |acc, v| if v > acc { v } else { acc }),
            AggregationPolicy::Min => present.fold(f64::INFINITY, |acc, v| if v < acc { v } else { acc }),
            AggregationPolicy::Sum => present.fold(0.0, |acc, v| acc + v),
            AggregationPolicy::Last | AggregationPolicy::Avg => {
                let (sum, count) = present.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                if count == 0 { 0.0 } else { sum / count as f64 }
            }
        };
        out.push(value);
    }
    out
}

impl SeriesAggregator {
    /// Combine several series into one AGGREGATE series.
    ///
    /// With `x_is_matching` the inputs are assumed to share their day axis
    /// already: the first series' days (from `from_day`) are used verbatim and
    /// the raw values are combined with `between`.
    ///
    /// Otherwise every input is first resampled with `within` and gap filling
    /// so they line up on whole days; the first resampled day axis is used.
    ///
    /// An empty input list, or a day axis whose length does not match the
    /// combined values, yields an empty series.
    pub fn aggregate_series_by_day(
        &self,
        new_name: &str,
        series_list: &[Series],
        from_day: i64,
        between: AggregationPolicy,
        x_is_matching: bool,
        within: AggregationPolicy,
    ) -> Series {
        let Some(first) = series_list.first() else {
            return Series::empty(new_name, Category::Aggregate);
        };

        let (days, value_lists): (Vec<f64>, Vec<Vec<f64>>) = if x_is_matching {
            let days = first.from_day_x(from_day);
            let values = series_list.iter().map(|s| s.from_day_y(from_day)).collect();
            (days, values)
        } else {
            let resampled: Vec<_> = series_list
                .iter()
                .map(|s| self.resample_by_day(s, from_day, within, true))
                .collect();
            let days = resampled[0].days.iter().map(|d| *d as f64).collect();
            let values = resampled.into_iter().map(|r| r.values).collect();
            (days, values)
        };

        let values = combine_by_index(&value_lists, between);
        if days.len() != values.len() {
            tracing::debug!(
                name = new_name,
                days = days.len(),
                values = values.len(),
                "aggregate axes differ in length; returning empty series"
            );
            return Series::empty(new_name, Category::Aggregate);
        }

        let points = days
            .into_iter()
            .zip(values)
            .map(|(day, value)| Point::new(day, value))
            .collect();
        Series::new(new_name, Category::Aggregate, points, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::types::points_from;

    fn series(name: &str, pairs: &[(f64, f64)]) -> Series {
        Series::new(name, Category::Inventory, points_from(pairs), true)
    }

    #[test]
    fn sum_over_ragged_lists() {
        let out = combine_by_index(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0]], AggregationPolicy::Sum);
        assert_eq!(out, vec![5.0, 7.0, 3.0]);
    }

    #[test]
    fn average_over_ragged_lists() {
        let out = combine_by_index(&[vec![2.0, 4.0], vec![6.0]], AggregationPolicy::Avg);
        assert_eq!(out, vec![4.0, 4.0]);
    }

    #[test]
    fn output_follows_the_longest_list() {
        let out = combine_by_index(&[vec![1.0], vec![1.0, 2.0, 3.0]], AggregationPolicy::Sum);
        assert_eq!(out, vec![2.0, 2.0, 3.0]);
        assert!(combine_by_index(&[], AggregationPolicy::Sum).is_empty());
        assert!(combine_by_index(&[vec![], vec![]], AggregationPolicy::Max).is_empty());
    }

    #[test]
    fn max_starts_from_zero() {
        let out = combine_by_index(&[vec![-3.0, 2.0], vec![-1.0, 7.0]], AggregationPolicy::Max);
        assert_eq!(out, vec![0.0, 7.0]);
    }

    #[test]
    fn min_and_last() {
        let lists = [vec![3.0, -2.0], vec![1.0]];
        assert_eq!(combine_by_index(&lists, AggregationPolicy::Min), vec![1.0, -2.0]);
        // LAST has no cross-series meaning and averages.
        assert_eq!(combine_by_index(&lists, AggregationPolicy::Last), vec![2.0, -2.0]);
    }

    #[test]
    fn matching_axes_use_first_series_days() {
        let agg = SeriesAggregator::default();
        let a = series("Calopeia", &[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let b = series("Sorange", &[(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)]);
        let out = agg.aggregate_series_by_day(
            "Total Demand",
            &[a, b],
            2,
            AggregationPolicy::Sum,
            true,
            AggregationPolicy::Avg,
        );
        assert_eq!(out.name(), "Total Demand");
        assert_eq!(out.category(), Category::Aggregate);
        assert_eq!(out.x(), vec![2.0, 3.0]);
        assert_eq!(out.y(), vec![22.0, 33.0]);
    }

    #[test]
    fn matching_axes_with_longer_second_series_is_empty() {
        let agg = SeriesAggregator::default();
        let a = series("a", &[(1.0, 1.0)]);
        let b = series("b", &[(1.0, 1.0), (2.0, 1.0)]);
        let out = agg.aggregate_series_by_day("Total", &[a, b], 0, AggregationPolicy::Sum, true, AggregationPolicy::Avg);
        assert!(out.is_empty());
        assert_eq!(out.category(), Category::Aggregate);
    }

    #[test]
    fn heterogeneous_axes_are_resampled_first() {
        let agg = SeriesAggregator::default();
        // Warehouse sampled twice a day, truck only on day 3.
        let warehouse = series("Warehouse", &[(1.0, 4.0), (1.4, 6.0), (2.0, 5.0), (3.0, 2.0)]);
        let truck = series("Truck", &[(3.0, 10.0)]);
        let out = agg.aggregate_series_by_day(
            "Calopeia Total Inventory",
            &[warehouse, truck],
            1,
            AggregationPolicy::Sum,
            false,
            AggregationPolicy::Max,
        );
        assert_eq!(out.x(), vec![1.0, 2.0, 3.0]);
        // Truck is gap-filled with 0 on days 1 and 2.
        assert_eq!(out.y(), vec![6.0, 5.0, 12.0]);
    }

    #[test]
    fn empty_list_is_empty_aggregate() {
        let agg = SeriesAggregator::default();
        let out = agg.aggregate_series_by_day("Total", &[], 0, AggregationPolicy::Sum, false, AggregationPolicy::Last);
        assert!(out.is_empty());
        assert_eq!(out.to_string(), "AGGREGATE: Total (0 values)");
    }
}
