//! Text summaries written next to the dashboard on every refresh.

use crate::domain::{Region, lead_times};
use crate::history::HistoryRecord;
use crate::io::ingest::ShippingConfig;
use crate::report::format::{Align, Column, TextTable, fmt_num, round2};
use crate::report::orders::{RegionOrders, RegionTransports};

const EMPTY_CELL: &str = "---";
const MISSING_RULE_CELL: &str = "IDX_ERR";

pub fn warehouse_modifications(records: &[&HistoryRecord], current_day: f64) -> TextTable {
    let mut table = TextTable::new(
        "WAREHOUSE MODIFICATIONS",
        vec![
            Column::new("Warehouse", 15, Align::Left),
            Column::new("Day", 15, Align::Right),
            Column::new("Finished Day", 15, Align::Right),
            Column::new(format!("Days until Finished ({})", current_day.trunc()), 28, Align::Right),
            Column::new("New Value", 15, Align::Center),
        ],
    );
    for r in records {
        let finished = r.day + lead_times::WAREHOUSE_INVESTMENT_DAYS;
        table.push_row(vec![
            r.warehouse.clone(),
            fmt_num(r.day),
            fmt_num(finished),
            fmt_num(finished - current_day),
            "Opening".to_string(),
        ]);
    }
    table
}

/// Factory capacity changes; the new capacity is shown as a whole number.
pub fn factory_modifications(records: &[&HistoryRecord], current_day: f64) -> TextTable {
    let mut table = TextTable::new(
        "FACTORY MODIFICATIONS",
        vec![
            Column::new("Factory", 15, Align::Left),
            Column::new("Day", 15, Align::Right),
            Column::new("Finished Day", 15, Align::Right),
            Column::new(format!("Days until Finished ({})", current_day.trunc()), 28, Align::Right),
            Column::new("New Value", 15, Align::Center),
        ],
    );
    for r in records {
        let finished = r.day + lead_times::FACTORY_INVESTMENT_DAYS;
        let capacity = crate::io::parse_number(&r.value)
            .map(|v| format!("{}", v.trunc() as i64))
            .unwrap_or_else(|_| EMPTY_CELL.to_string());
        table.push_row(vec![
            r.factory.clone(),
            fmt_num(r.day),
            fmt_num(finished),
            fmt_num(finished - current_day),
            capacity,
        ]);
    }
    table
}

/// Factory x target matrix of shipping rules, one `method OP/Q/PR` per cell.
///
/// A factory without any rule shows `---` everywhere, as does a rule whose
/// order point is 0. A factory that has rules but none for a target shows
/// `IDX_ERR` there.
pub fn factory_configuration(configs: &[ShippingConfig]) -> TextTable {
    let mut columns = vec![Column::new("from / to", 12, Align::Left)];
    columns.extend(Region::ALL.iter().map(|r| Column::new(r.display_name(), 18, Align::Right)));

    let mut table = TextTable::new("FACTORY CONFIGURATION (SM OP/Q/PR)", columns);
    for factory in Region::ALL {
        let rules: Vec<&ShippingConfig> = configs
            .iter()
            .filter(|c| Region::from_name(&c.factory) == Some(factory))
            .collect();

        let mut row = vec![factory.display_name().to_string()];
        row.extend(Region::ALL.iter().map(|target| {
            if rules.is_empty() {
                return EMPTY_CELL.to_string();
            }
            match rules.iter().find(|c| Region::from_name(&c.target) == Some(*target)) {
                None => MISSING_RULE_CELL.to_string(),
                Some(c) if c.order_point == 0 => EMPTY_CELL.to_string(),
                Some(c) => format!("{} {}/{}/{}", c.method, c.order_point, c.quantity, c.priority),
            }
        }));
        table.push_row(row);
    }
    table
}

/// Region x region matrix of open factory orders (`---` where none).
pub fn order_summary(orders: &[RegionOrders]) -> TextTable {
    let mut columns = vec![Column::new("from / to", 12, Align::Left)];
    columns.extend(Region::ALL.iter().map(|r| Column::new(r.display_name(), 12, Align::Right)));

    let mut table = TextTable::new("ORDER SUMMARY", columns);
    for region in orders {
        let mut row = vec![region.region.clone()];
        row.extend(Region::ALL.iter().map(|dest| {
            region
                .quantity_for(dest.display_name())
                .map_or_else(|| EMPTY_CELL.to_string(), fmt_num)
        }));
        table.push_row(row);
    }
    table
}

pub fn transport_summary(transports: &[RegionTransports], current_day: f64) -> TextTable {
    let mut table = TextTable::new(
        "TRANSPORT SUMMARY",
        vec![
            Column::new("Warehouse", 12, Align::Left),
            Column::new("Day of Order", 15, Align::Right),
            Column::new("Day of Arrival", 15, Align::Right),
            Column::new(format!("Days until Arrival ({})", fmt_num(current_day)), 26, Align::Right),
            Column::new("Quantity", 12, Align::Right),
        ],
    );
    for region in transports {
        for s in &region.shipments {
            let arrival = round2(s.arrival_day);
            table.push_row(vec![
                region.region.clone(),
                fmt_num(round2(s.order_day)),
                fmt_num(arrival),
                fmt_num(round2(arrival - current_day)),
                fmt_num(round2(s.quantity)),
            ]);
        }
    }
    table
}
