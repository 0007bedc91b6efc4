//! Synthetic game data for `scg demo`.
//!
//! Produces a complete input directory (every file `io::ingest` knows about)
//! from a seed, so the dashboard and the subcommands can be exercised without
//! access to a running game.

use std::fs::{self, File};
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::Region;
use crate::error::AppError;
use crate::io::ingest::{
    CASH_FILE, DEMAND_FILE, FACTORY_CONFIG_FILE, GENERAL_FILE, HISTORY_FILE, INVENTORY_FILE, LOST_DEMAND_FILE,
    SHIPMENTS_FILE, STANDING_FILE, WIP_FILE, ShippingConfig,
};

/// Regions with a warehouse in the generated game. The first one also has
/// the factory.
const WAREHOUSE_REGIONS: [Region; 2] = [Region::Calopeia, Region::Tyran];

/// Mean daily demand per region, in `Region::ALL` order.
const BASE_DEMAND: [f64; 5] = [22.0, 14.0, 30.0, 9.0, 17.0];

const RIVAL_TEAMS: [&str; 4] = ["Team Alpha", "Team Bravo", "Team Charlie", "Team Delta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoConfig {
    pub seed: u64,
    pub days: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { seed: 42, days: 120 }
    }
}

/// One `series,day,value` (or `group,series,day,value`) row.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub group: String,
    pub series: String,
    pub day: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub day: f64,
    pub text: String,
    pub operation: String,
    pub factory: String,
    pub warehouse: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoGame {
    pub day: u32,
    /// Cash balance in thousands.
    pub cash: f64,
    pub demand: Vec<SampleRow>,
    pub lost_demand: Vec<SampleRow>,
    pub shipments: Vec<SampleRow>,
    pub cash_history: Vec<SampleRow>,
    pub inventory: Vec<SampleRow>,
    pub wip: Vec<SampleRow>,
    pub standings: Vec<(String, f64)>,
    pub factory_configs: Vec<ShippingConfig>,
    pub history: Vec<HistoryRow>,
}

pub fn generate_demo(config: &DemoConfig) -> Result<DemoGame, AppError> {
    if config.days < 2 {
        return Err(AppError::input("Demo needs at least 2 days."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0).map_err(|e| AppError::output(format!("Noise distribution error: {e}")))?;

    let mut game = DemoGame {
        day: config.days,
        ..DemoGame::default()
    };

    // Demand is sampled twice a day at irregular times, as the game pages do;
    // all regions share the sample instants.
    for day in 1..=config.days {
        let season = 1.0 + 0.25 * (day as f64 / 45.0 * std::f64::consts::TAU).sin();
        for half in 0..2 {
            let t = day as f64 + half as f64 * 0.5 + rng.gen_range(0.0..0.2);
            for (region, base) in Region::ALL.iter().zip(BASE_DEMAND) {
                let mean = base * season / 2.0;
                let demand = (mean + noise.sample(&mut rng) * mean.sqrt()).max(0.0).round();
                let served = WAREHOUSE_REGIONS.contains(region);
                let lost = if served { 0.0 } else { (demand * rng.gen_range(0.1..0.4)).round() };

                let name = region.display_name().to_string();
                game.demand.push(row("", &name, t, demand));
                game.lost_demand.push(row("", &name, t, lost));
                game.shipments.push(row("", &name, t, demand - lost));
            }
        }
    }

    let mut cash = 1000.0;
    for day in 1..=config.days {
        cash += 6.0 + noise.sample(&mut rng) * 4.0;
        game.cash_history.push(row("", "Cash balance", day as f64, round3(cash)));
    }
    game.cash = round3(cash);

    generate_inventory(&mut game, &mut rng, &noise, config.days);
    generate_wip(&mut game, &mut rng, config.days);

    for team in RIVAL_TEAMS {
        let drift = rng.gen_range(0.6..1.4);
        game.standings.push((team.to_string(), (cash * 1000.0 * drift).round()));
    }

    game.factory_configs = demo_factory_configs();
    game.history = demo_history(config.days);
    Ok(game)
}

fn generate_inventory(game: &mut DemoGame, rng: &mut StdRng, noise: &Normal<f64>, days: u32) {
    for region in WAREHOUSE_REGIONS {
        let group = region.display_name();
        let mut stock: f64 = 400.0;
        let mut mail: f64 = 0.0;
        let mut truck: f64 = 0.0;

        for day in 1..=days {
            let t = day as f64;
            stock = (stock - 25.0 + noise.sample(rng) * 5.0).max(0.0);
            if stock < 150.0 {
                // Reorder: most goes by truck, a top-up by mail.
                truck += 300.0;
                mail += 40.0;
            } else if day % 7 == 0 && truck > 0.0 {
                stock += truck;
                truck = 0.0;
            } else if mail > 0.0 {
                stock += mail;
                mail = 0.0;
            }

            game.inventory.push(row(group, "Warehouse", t, stock.round()));
            game.inventory.push(row(group, "Mail", t, mail));
            game.inventory.push(row(group, "Truck", t, truck));
        }
    }
}

fn generate_wip(game: &mut DemoGame, rng: &mut StdRng, days: u32) {
    let factory = WAREHOUSE_REGIONS[0].display_name();
    for dest in WAREHOUSE_REGIONS {
        let mut open = 0.0;
        for day in 1..=days {
            if open == 0.0 && rng.gen_bool(0.15) {
                open = rng.gen_range(5..=20) as f64 * 10.0;
            } else if open > 0.0 && rng.gen_bool(0.3) {
                open = 0.0;
            }
            game.wip.push(row(factory, dest.display_name(), day as f64, open));
        }
    }
}

/// The factory ships to every region; only warehouse regions get an order point.
fn demo_factory_configs() -> Vec<ShippingConfig> {
    let factory = WAREHOUSE_REGIONS[0];
    Region::ALL
        .into_iter()
        .map(|target| {
            let stocked = WAREHOUSE_REGIONS.contains(&target);
            let (method, order_point) = if target == factory { ("Truck", 150) } else { ("Mail", 60) };
            ShippingConfig {
                factory: factory.display_name().to_string(),
                target: target.display_name().to_string(),
                method: method.to_string(),
                order_point: if stocked { order_point } else { 0 },
                quantity: if stocked { 300 } else { 0 },
                priority: 1,
            }
        })
        .collect()
}

fn demo_history(days: u32) -> Vec<HistoryRow> {
    let last = days as f64;
    let entry = |day: f64, operation: &str, factory: &str, warehouse: &str, value: &str| HistoryRow {
        day,
        text: format!("{operation} {factory}{warehouse}").trim().to_string(),
        operation: operation.to_string(),
        factory: factory.to_string(),
        warehouse: warehouse.to_string(),
        value: value.to_string(),
    };

    vec![
        entry(1.0, "Satisfy demand in", "", "Calopeia", "Calopeia"),
        entry(1.0, "Order point", "", "Calopeia", "150"),
        entry(1.0, "Order quantity", "", "Calopeia", "300"),
        entry((last - 40.0).max(1.0), "Schedule warehouse", "", "Tyran", ""),
        entry((last - 30.0).max(1.0), "Schedule capacity change", "Calopeia", "", "45.0"),
        entry((last - 5.0).max(1.0), "Shipping", "Calopeia", "Tyran", "Truck"),
        entry((last - 1.0).max(1.0), "Order priority", "Calopeia", "", "high"),
    ]
}

fn row(group: &str, series: &str, day: f64, value: f64) -> SampleRow {
    SampleRow {
        group: group.to_string(),
        series: series.to_string(),
        day,
        value,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Write every input file of `game` into `dir`.
pub fn write_demo(dir: &Path, game: &DemoGame) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::output(format!("Failed to create demo directory '{}': {e}", dir.display())))?;

    write_records(
        &dir.join(GENERAL_FILE),
        &["day", "cash"],
        [vec![game.day.to_string(), game.cash.to_string()]],
    )?;

    for (file, rows) in [
        (DEMAND_FILE, &game.demand),
        (LOST_DEMAND_FILE, &game.lost_demand),
        (SHIPMENTS_FILE, &game.shipments),
        (CASH_FILE, &game.cash_history),
    ] {
        write_records(
            &dir.join(file),
            &["series", "day", "value"],
            rows.iter()
                .map(|r| vec![r.series.clone(), fmt_day(r.day), r.value.to_string()]),
        )?;
    }

    for (file, rows) in [(INVENTORY_FILE, &game.inventory), (WIP_FILE, &game.wip)] {
        write_records(
            &dir.join(file),
            &["group", "series", "day", "value"],
            rows.iter()
                .map(|r| vec![r.group.clone(), r.series.clone(), fmt_day(r.day), r.value.to_string()]),
        )?;
    }

    write_records(
        &dir.join(STANDING_FILE),
        &["team", "value"],
        game.standings.iter().map(|(team, v)| vec![team.clone(), v.to_string()]),
    )?;

    write_records(
        &dir.join(FACTORY_CONFIG_FILE),
        &["factory", "target", "method", "order_point", "quantity", "priority"],
        game.factory_configs.iter().map(|c| {
            vec![
                c.factory.clone(),
                c.target.clone(),
                c.method.clone(),
                c.order_point.to_string(),
                c.quantity.to_string(),
                c.priority.to_string(),
            ]
        }),
    )?;

    write_records(
        &dir.join(HISTORY_FILE),
        &["day", "text", "operation", "factory", "warehouse", "value"],
        game.history.iter().map(|h| {
            vec![
                h.day.to_string(),
                h.text.clone(),
                h.operation.clone(),
                h.factory.clone(),
                h.warehouse.clone(),
                h.value.clone(),
            ]
        }),
    )?;

    tracing::info!(dir = %dir.display(), days = game.day, "demo input written");
    Ok(())
}

fn fmt_day(day: f64) -> String {
    format!("{day:.3}")
}

fn write_records(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(header)
        .map_err(|e| AppError::output(format!("Failed to write header of '{}': {e}", path.display())))?;
    for record in rows {
        writer
            .write_record(&record)
            .map_err(|e| AppError::output(format!("Failed to write row of '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush '{}': {e}", path.display())))
}
