//! One dashboard refresh: snapshot -> derived series -> summaries -> panels.
//!
//! Kept separate from `app` so the same workflow backs a single refresh, the
//! `--watch` loop and the tests:
//! load snapshot -> record standings -> aggregate -> summarize -> render -> persist

use std::path::Path;

use chrono::{DateTime, Local};

use crate::domain::{AggregationPolicy, Category, DashboardConfig};
use crate::error::AppError;
use crate::io::export::{slugify, write_json, write_series_csv, write_text};
use crate::io::ingest::{GameSnapshot, SeriesGroup};
use crate::io::standing::StandingBook;
use crate::report::format::TextTable;
use crate::report::{
    Dashboard, Panel, PanelLine, RegionOrders, RegionTransports, factory_configuration, factory_modifications,
    order_summary, pending_orders, pending_transports, transport_summary, warehouse_modifications,
};
use crate::series::{Point, Series, SeriesAggregator};

pub const WAREHOUSE_SUMMARY_FILE: &str = "warehouse_mods.txt";
pub const FACTORY_SUMMARY_FILE: &str = "factory_mods.txt";
pub const FACTORY_CONFIG_SUMMARY_FILE: &str = "factory_config.txt";
pub const ORDER_SUMMARY_FILE: &str = "order_pending.txt";
pub const TRANSPORT_SUMMARY_FILE: &str = "transport_pending.txt";
pub const DASHBOARD_TEXT_FILE: &str = "dashboard.txt";
pub const DASHBOARD_JSON_FILE: &str = "dashboard.json";
pub const SERIES_DIR: &str = "series";
pub const TEAMS_DIR: &str = "teams";

/// Bookkeeping across refresh ticks.
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    pub ticks: u64,
    pub last_refresh: Option<DateTime<Local>>,
}

impl RefreshState {
    pub fn begin_tick(&mut self) -> DateTime<Local> {
        let now = Local::now();
        self.ticks += 1;
        self.last_refresh = Some(now);
        now
    }

    pub fn stamp(&self) -> String {
        self.last_refresh
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    }
}

/// One region's demand as shown on its detail panel.
#[derive(Debug, Clone)]
pub struct RegionDemand {
    pub region: String,
    pub demand: Series,
    pub smoothed: Series,
    pub lost: Option<Series>,
    pub met: Option<Series>,
}

impl RegionDemand {
    fn lines(&self) -> impl Iterator<Item = &Series> {
        [Some(&self.demand), Some(&self.smoothed), self.lost.as_ref(), self.met.as_ref()]
            .into_iter()
            .flatten()
    }
}

/// Derived series shown on the dashboard.
#[derive(Debug, Clone)]
pub struct DerivedSeries {
    pub total_demand: Series,
    pub smoothed_demand: Series,
    pub total_lost_demand: Series,
    pub cumulated_lost_demand: Series,
    pub wip_by_region: Vec<Series>,
    pub total_wip: Series,
    pub inventory_by_region: Vec<Series>,
    pub total_inventory: Series,
    pub cash: Vec<Series>,
    pub region_demand: Vec<RegionDemand>,
    /// Per factory: daily WIP towards each destination that had any.
    pub wip_by_destination: Vec<SeriesGroup>,
}

impl DerivedSeries {
    /// Series exported on every refresh, in panel order.
    pub fn all(&self) -> Vec<&Series> {
        let mut out = vec![
            &self.total_demand,
            &self.smoothed_demand,
            &self.total_lost_demand,
            &self.cumulated_lost_demand,
        ];
        out.extend(&self.wip_by_region);
        out.push(&self.total_wip);
        out.extend(&self.inventory_by_region);
        out.push(&self.total_inventory);
        out.extend(&self.cash);
        out.extend(self.region_demand.iter().map(|r| &r.smoothed));
        out
    }
}

/// All computed outputs of a single refresh.
#[derive(Debug, Clone)]
pub struct DashboardOutput {
    pub day: i64,
    pub from_day: i64,
    pub series: DerivedSeries,
    pub orders: Vec<RegionOrders>,
    pub transports: Vec<RegionTransports>,
    pub warehouse_summary: TextTable,
    pub factory_summary: TextTable,
    pub factory_config_summary: TextTable,
    pub order_summary: TextTable,
    pub transport_summary: TextTable,
    pub dashboard: Dashboard,
}

/// The day shown: forced by config, else the game's day, else the latest sample.
pub fn current_day(snapshot: &GameSnapshot, config: &DashboardConfig) -> i64 {
    if let Some(day) = config.displayed_day {
        return day;
    }
    if let Some(general) = snapshot.general {
        return general.day;
    }
    snapshot
        .demand
        .iter()
        .flat_map(|s| s.points())
        .map(|p| p.day.trunc() as i64)
        .max()
        .unwrap_or(0)
}

/// Record every rival's standing at `day`.
pub fn record_standings(book: &mut StandingBook, snapshot: &GameSnapshot, day: i64) -> Result<(), AppError> {
    for standing in &snapshot.standings {
        book.record(&standing.team, Point::new(day as f64, standing.value))?;
    }
    Ok(())
}

/// Compute every derived series for the window ending on `day`.
pub fn derive_series(snapshot: &GameSnapshot, config: &DashboardConfig, day: i64) -> DerivedSeries {
    let aggregator = SeriesAggregator::new(config.last_x_days);
    let from_day = day.saturating_sub(i64::from(config.last_x_days));
    let lookback = from_day.saturating_sub(i64::from(config.smoothing_days)).max(0);

    let total_demand = aggregator.aggregate_series_by_day(
        "Total demand",
        &snapshot.demand,
        lookback,
        AggregationPolicy::Sum,
        true,
        AggregationPolicy::Avg,
    );
    let smoothed_demand = aggregator
        .smoothed(&total_demand, from_day, config.smoothing_days, AggregationPolicy::Avg)
        .into_series(format!("Total demand ({}d smoothed)", config.smoothing_days), Category::Aggregate);

    // Cumulation indexes from day 0, so the total is built over the whole game.
    let total_lost_demand = aggregator.aggregate_series_by_day(
        "Total lost demand",
        &snapshot.lost_demand,
        0,
        AggregationPolicy::Sum,
        true,
        AggregationPolicy::Avg,
    );
    let cumulated_lost_demand = aggregator.cumulate("Cumulated lost demand", &total_lost_demand, from_day);

    let wip_by_region = aggregate_groups(&aggregator, &snapshot.wip, "Total WIP", from_day, AggregationPolicy::Last);
    let total_wip = aggregator.aggregate_series_by_day(
        "Total WIP",
        &wip_by_region,
        from_day,
        AggregationPolicy::Sum,
        false,
        AggregationPolicy::Last,
    );

    let inventory_by_region = aggregate_groups(
        &aggregator,
        &snapshot.inventory,
        "Total inventory",
        from_day,
        AggregationPolicy::Max,
    );
    let total_inventory = aggregator.aggregate_series_by_day(
        "Total inventory",
        &inventory_by_region,
        from_day,
        AggregationPolicy::Sum,
        true,
        AggregationPolicy::Max,
    );

    let cash = snapshot
        .cash
        .iter()
        .map(|s| {
            let mut scaled = s.clone();
            scaled.scale_values(config.cash_multiplier);
            scaled
        })
        .collect();

    let region_demand = snapshot
        .demand
        .iter()
        .map(|demand| {
            let region = demand.name().to_string();
            let smoothed = aggregator
                .smoothed(demand, from_day, config.smoothing_days, AggregationPolicy::Avg)
                .into_series(
                    format!("{region} demand ({}d smoothed)", config.smoothing_days),
                    Category::Aggregate,
                );
            RegionDemand {
                demand: renamed(demand, format!("{region} demand")),
                smoothed,
                lost: find_named(&snapshot.lost_demand, &region).map(|s| renamed(s, format!("{region} lost demand"))),
                met: find_named(&snapshot.shipments, &region).map(|s| renamed(s, format!("{region} met demand"))),
                region,
            }
        })
        .collect();

    let wip_by_destination = snapshot
        .wip
        .iter()
        .map(|group| SeriesGroup {
            name: group.name.clone(),
            series: group
                .series
                .iter()
                .filter_map(|s| {
                    let daily = aggregator.resample_by_day(s, from_day, AggregationPolicy::Last, true);
                    if daily.values.iter().all(|v| *v == 0.0) {
                        return None;
                    }
                    Some(daily.into_series(s.name(), Category::Wip))
                })
                .collect(),
        })
        .collect();

    DerivedSeries {
        total_demand,
        smoothed_demand,
        total_lost_demand,
        cumulated_lost_demand,
        wip_by_region,
        total_wip,
        inventory_by_region,
        total_inventory,
        cash,
        region_demand,
        wip_by_destination,
    }
}

fn find_named<'a>(series: &'a [Series], name: &str) -> Option<&'a Series> {
    series.iter().find(|s| s.name().eq_ignore_ascii_case(name))
}

fn renamed(series: &Series, name: String) -> Series {
    Series::new(name, series.category(), series.points().to_vec(), false)
}

fn aggregate_groups(
    aggregator: &SeriesAggregator,
    groups: &[SeriesGroup],
    prefix: &str,
    from_day: i64,
    within: AggregationPolicy,
) -> Vec<Series> {
    groups
        .iter()
        .map(|g| {
            aggregator.aggregate_series_by_day(
                &format!("{prefix} {}", g.name),
                &g.series,
                from_day,
                AggregationPolicy::Sum,
                false,
                within,
            )
        })
        .collect()
}

/// Build the full refresh output (no side effects).
pub fn build_dashboard(
    snapshot: &GameSnapshot,
    book: &StandingBook,
    config: &DashboardConfig,
    refreshed_at: &str,
) -> DashboardOutput {
    let day = current_day(snapshot, config);
    let from_day = day.saturating_sub(i64::from(config.last_x_days));
    let today = day as f64;

    let series = derive_series(snapshot, config, day);

    let orders = pending_orders(&snapshot.wip);
    let transports = pending_transports(&snapshot.inventory, today);
    let warehouse_summary = warehouse_modifications(&snapshot.history.pending_warehouse_modifications(today), today);
    let factory_summary = factory_modifications(&snapshot.history.pending_factory_modifications(today), today);

    let mut standings = Panel::new("Team standings");
    for team in book.teams() {
        let team_series = Series::new(team.name(), Category::Cash, team.points_from_day(from_day as f64), false);
        standings.push_line(PanelLine::from_series(&team_series, from_day));
    }

    let mut panels = vec![
        Panel::new("Demand").with_series([&series.total_demand, &series.smoothed_demand], from_day),
        Panel::new("Lost demand")
            .with_series([&series.total_lost_demand, &series.cumulated_lost_demand], from_day),
        Panel::new("WIP")
            .with_series(series.wip_by_region.iter().chain([&series.total_wip]), from_day),
        Panel::new("Inventory")
            .with_series(series.inventory_by_region.iter().chain([&series.total_inventory]), from_day),
        Panel::new("Cash").with_series(&series.cash, from_day),
        standings,
    ];

    for region in &series.region_demand {
        panels.push(Panel::new(format!("Demand {}", region.region)).with_series(region.lines(), from_day));
    }
    for group in &snapshot.inventory {
        panels.push(Panel::new(format!("Inventory {}", group.name)).with_series(&group.series, from_day));
    }
    for group in &series.wip_by_destination {
        panels.push(Panel::new(format!("Total WIP {}", group.name)).with_series(&group.series, from_day));
    }

    DashboardOutput {
        day,
        from_day,
        order_summary: order_summary(&orders),
        transport_summary: transport_summary(&transports, today),
        orders,
        transports,
        warehouse_summary,
        factory_summary,
        factory_config_summary: factory_configuration(&snapshot.factory_configs),
        dashboard: Dashboard {
            day,
            from_day,
            refreshed_at: refreshed_at.to_string(),
            panels,
        },
        series,
    }
}

/// Write summaries, series exports and the rendered dashboard under `dir`.
pub fn write_outputs(dir: &Path, output: &DashboardOutput) -> Result<(), AppError> {
    write_text(&dir.join(WAREHOUSE_SUMMARY_FILE), &output.warehouse_summary.render())?;
    write_text(&dir.join(FACTORY_SUMMARY_FILE), &output.factory_summary.render())?;
    write_text(&dir.join(FACTORY_CONFIG_SUMMARY_FILE), &output.factory_config_summary.render())?;
    write_text(&dir.join(ORDER_SUMMARY_FILE), &output.order_summary.render())?;
    write_text(&dir.join(TRANSPORT_SUMMARY_FILE), &output.transport_summary.render())?;

    for series in output.series.all() {
        let path = dir.join(SERIES_DIR).join(format!("{}.csv", slugify(series.name())));
        write_series_csv(&path, series)?;
    }

    write_text(&dir.join(DASHBOARD_TEXT_FILE), &output.dashboard.render())?;
    write_json(&dir.join(DASHBOARD_JSON_FILE), &output.dashboard)?;

    tracing::debug!(dir = %dir.display(), day = output.day, "dashboard outputs written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryLog, HistoryRecord};
    use crate::io::ingest::{GeneralData, ShippingConfig, Standing};
    use crate::io::standing::PersistMode;
    use crate::series::points_from;

    fn series(name: &str, category: Category, pairs: &[(f64, f64)]) -> Series {
        Series::new(name, category, points_from(pairs), true)
    }

    fn snapshot() -> GameSnapshot {
        let days: Vec<f64> = (0..=10).map(f64::from).collect();
        let demand_a: Vec<(f64, f64)> = days.iter().map(|d| (*d, 10.0)).collect();
        let demand_b: Vec<(f64, f64)> = days.iter().map(|d| (*d, 5.0)).collect();
        let lost: Vec<(f64, f64)> = days.iter().map(|d| (*d, 1.0)).collect();
        let met: Vec<(f64, f64)> = days.iter().map(|d| (*d, 4.0)).collect();

        GameSnapshot {
            general: Some(GeneralData { day: 10, cash: 1.5 }),
            demand: vec![
                series("Calopeia", Category::Demand, &demand_a),
                series("Tyran", Category::Demand, &demand_b),
            ],
            lost_demand: vec![series("Tyran", Category::Demand, &lost)],
            shipments: vec![series("Tyran", Category::Demand, &met)],
            cash: vec![series("Cash balance", Category::Cash, &[(9.0, 1.2), (10.0, 1.5)])],
            inventory: vec![SeriesGroup {
                name: "Calopeia".to_string(),
                series: vec![
                    series("Warehouse", Category::Inventory, &[(8.0, 100.0), (9.0, 80.0), (10.0, 60.0)]),
                    series("Truck", Category::Inventory, &[(8.0, 0.0), (9.0, 50.0), (10.0, 50.0)]),
                ],
            }],
            wip: vec![SeriesGroup {
                name: "Calopeia".to_string(),
                series: vec![
                    series("Tyran", Category::Wip, &[(7.0, 0.0), (8.0, 30.0), (9.0, 30.0), (10.0, 0.0)]),
                    series("Calopeia", Category::Wip, &[(8.0, 0.0), (9.0, 0.0)]),
                ],
            }],
            standings: vec![
                Standing { team: "Us".to_string(), value: 1500.0 },
                Standing { team: "Rival".to_string(), value: 900.0 },
            ],
            factory_configs: vec![ShippingConfig {
                factory: "Calopeia".to_string(),
                target: "Tyran".to_string(),
                method: "Truck".to_string(),
                order_point: 0,
                quantity: 300,
                priority: 1,
            }],
            history: HistoryLog::new(vec![HistoryRecord::new(5.0, "", "Schedule warehouse", "", "Tyran", "")]),
            ..GameSnapshot::default()
        }
    }

    fn config() -> DashboardConfig {
        DashboardConfig {
            last_x_days: 5,
            smoothing_days: 3,
            own_team: Some("Us".to_string()),
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn refresh_state_counts_ticks() {
        let mut state = RefreshState::default();
        assert_eq!(state.stamp(), "never");
        state.begin_tick();
        state.begin_tick();
        assert_eq!(state.ticks, 2);
        assert!(state.last_refresh.is_some());
    }

    #[test]
    fn displayed_day_overrides_general() {
        let snap = snapshot();
        assert_eq!(current_day(&snap, &config()), 10);
        let forced = DashboardConfig { displayed_day: Some(7), ..config() };
        assert_eq!(current_day(&snap, &forced), 7);

        let no_general = GameSnapshot { general: None, ..snap };
        assert_eq!(current_day(&no_general, &config()), 10);
    }

    #[test]
    fn derived_totals_follow_policies() {
        let snap = snapshot();
        let derived = derive_series(&snap, &config(), 10);

        // Matching axes: 10 + 5 on every day from the lookback (day 2) on.
        assert_eq!(derived.total_demand.y(), vec![15.0; 9]);
        assert!(derived.smoothed_demand.y().iter().all(|v| *v == 15.0));
        assert_eq!(derived.smoothed_demand.x().first(), Some(&5.0));

        // 11 daily values of 1.0, cumulated then sliced from index 5.
        assert_eq!(derived.cumulated_lost_demand.y(), vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);

        // Inventory Calopeia = Warehouse + Truck on each resampled day from 5.
        let inventory = &derived.inventory_by_region[0];
        assert_eq!(inventory.name(), "Total inventory Calopeia");
        assert_eq!(inventory.from_day_y(8), vec![100.0, 130.0, 110.0]);

        assert_eq!(derived.cash[0].y(), vec![1200.0, 1500.0]);
    }

    #[test]
    fn region_details_follow_each_region() {
        let snap = snapshot();
        let derived = derive_series(&snap, &config(), 10);

        assert_eq!(derived.region_demand.len(), 2);
        let tyran = &derived.region_demand[1];
        assert_eq!(tyran.region, "Tyran");
        assert_eq!(tyran.demand.name(), "Tyran demand");
        assert!(tyran.smoothed.y().iter().all(|v| *v == 5.0));
        assert_eq!(tyran.smoothed.x().first(), Some(&5.0));
        assert_eq!(tyran.lost.as_ref().map(Series::name), Some("Tyran lost demand"));
        assert_eq!(tyran.met.as_ref().map(|s| s.from_day_y(10)), Some(vec![4.0]));
        assert!(derived.region_demand[0].lost.is_none());
        assert!(derived.region_demand[0].met.is_none());

        // The all-zero destination is dropped; the other is gap-filled daily.
        let wip = &derived.wip_by_destination[0];
        assert_eq!(wip.name, "Calopeia");
        assert_eq!(wip.series.len(), 1);
        assert_eq!(wip.series[0].name(), "Tyran");
        assert_eq!(wip.series[0].y(), vec![0.0, 0.0, 0.0, 30.0, 30.0, 0.0]);
    }

    #[test]
    fn extreme_days_do_not_overflow() {
        let snap = snapshot();
        for day in [i64::MIN, i64::MAX] {
            let cfg = DashboardConfig { displayed_day: Some(day), ..config() };
            let book = StandingBook::new("unused", None, PersistMode::MemoryOnly);
            let out = build_dashboard(&snap, &book, &cfg, "now");
            assert_eq!(out.day, day);
            assert!(out.from_day <= day);
        }
    }

    #[test]
    fn dashboard_has_panels_and_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let snap = snapshot();
        let cfg = config();
        let mut book = StandingBook::new(dir.path().join(TEAMS_DIR), cfg.own_team.clone(), PersistMode::MemoryOnly);
        record_standings(&mut book, &snap, 10).unwrap();

        let out = build_dashboard(&snap, &book, &cfg, "now");
        assert_eq!(out.day, 10);
        assert_eq!(out.from_day, 5);
        assert_eq!(out.orders[0].quantity_for("Tyran"), Some(60.0));
        assert_eq!(out.transports[0].shipments.len(), 1);
        assert_eq!(out.warehouse_summary.rows().len(), 1);
        assert!(out.factory_summary.rows().is_empty());

        let rules = &out.factory_config_summary.rows()[0];
        assert_eq!(rules[0], "Calopeia");
        assert_eq!(rules[1], "IDX_ERR");
        assert_eq!(rules[3], "---");

        let detail = out.dashboard.panel("Demand Tyran").unwrap();
        assert_eq!(detail.lines.len(), 4);
        assert_eq!(detail.lines[3].latest, Some(4.0));
        assert_eq!(out.dashboard.panel("Demand Calopeia").map(|p| p.lines.len()), Some(2));

        let inventory = out.dashboard.panel("Inventory Calopeia").unwrap();
        let latest: Vec<Option<f64>> = inventory.lines.iter().map(|l| l.latest).collect();
        assert_eq!(latest, vec![Some(60.0), Some(50.0)]);
        assert_eq!(out.dashboard.panel("Total WIP Calopeia").map(|p| p.lines.len()), Some(1));

        let standings = out.dashboard.panel("Team standings").unwrap();
        assert_eq!(standings.lines.len(), 1);
        assert_eq!(standings.lines[0].latest, Some(900.0));
    }

    #[test]
    fn outputs_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let snap = snapshot();
        let cfg = config();
        let book = StandingBook::new(dir.path().join(TEAMS_DIR), None, PersistMode::MemoryOnly);
        let out = build_dashboard(&snap, &book, &cfg, "now");

        write_outputs(dir.path(), &out).unwrap();
        for file in [
            WAREHOUSE_SUMMARY_FILE,
            FACTORY_SUMMARY_FILE,
            FACTORY_CONFIG_SUMMARY_FILE,
            ORDER_SUMMARY_FILE,
            TRANSPORT_SUMMARY_FILE,
            DASHBOARD_TEXT_FILE,
            DASHBOARD_JSON_FILE,
        ] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
        assert!(dir.path().join(SERIES_DIR).join("total_demand.csv").exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(DASHBOARD_JSON_FILE)).unwrap()).unwrap();
        assert_eq!(json["day"], 10);
    }
}
