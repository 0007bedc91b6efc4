//! Operation history of the game (orders, shipments, investments).
//!
//! Records are loaded by `io::ingest::load_history`; this module only
//! classifies and queries them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::lead_times;

/// Kind of a history entry, classified from its operation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryOperation {
    Shipping,
    ServeRegion,
    ScheduleWarehouse,
    ScheduleFactory,
    FulfillmentPolicy,
    OrderPoint,
    OrderQuantity,
    OrderPriority,
    Undefined,
}

/// Substring -> operation, checked in order.
const OPERATION_MARKERS: [(&str, HistoryOperation); 8] = [
    ("Shipping", HistoryOperation::Shipping),
    ("Satisfy demand in", HistoryOperation::ServeRegion),
    ("Schedule warehouse", HistoryOperation::ScheduleWarehouse),
    ("Schedule capacity change", HistoryOperation::ScheduleFactory),
    ("Fulfillment policy", HistoryOperation::FulfillmentPolicy),
    ("Order point", HistoryOperation::OrderPoint),
    ("Order quantity", HistoryOperation::OrderQuantity),
    ("Order priority", HistoryOperation::OrderPriority),
];

impl HistoryOperation {
    pub fn classify(text: &str) -> Self {
        OPERATION_MARKERS
            .iter()
            .find(|(marker, _)| text.contains(marker))
            .map_or(HistoryOperation::Undefined, |(_, op)| *op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Start day of the operation (not its completion day).
    pub day: f64,
    pub text: String,
    pub operation: HistoryOperation,
    pub operation_text: String,
    pub factory: String,
    pub warehouse: String,
    pub value: String,
}

impl HistoryRecord {
    pub fn new(
        day: f64,
        text: impl Into<String>,
        operation_text: impl Into<String>,
        factory: impl Into<String>,
        warehouse: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let operation_text = operation_text.into();
        Self {
            day,
            text: text.into(),
            operation: HistoryOperation::classify(&operation_text),
            operation_text,
            factory: factory.into(),
            warehouse: warehouse.into(),
            value: value.into(),
        }
    }

    fn starts_on_or_after(&self, from_day: f64) -> bool {
        self.day.trunc() >= from_day
    }
}

/// All history records plus an index by operation kind.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    records: Vec<HistoryRecord>,
    by_operation: HashMap<HistoryOperation, Vec<usize>>,
}

impl HistoryLog {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        let mut by_operation: HashMap<HistoryOperation, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_operation.entry(record.operation).or_default().push(idx);
        }
        Self { records, by_operation }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose day, truncated to a whole day, is `>= from_day`.
    pub fn records_from_day(&self, from_day: f64) -> Vec<&HistoryRecord> {
        self.records
            .iter()
            .filter(|r| r.starts_on_or_after(from_day))
            .collect()
    }

    pub fn by_operation_from_day(&self, operation: HistoryOperation, from_day: f64) -> Vec<&HistoryRecord> {
        self.by_operation
            .get(&operation)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&idx| &self.records[idx])
                    .filter(|r| r.starts_on_or_after(from_day))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Capacity changes still under construction on `current_day`.
    pub fn pending_factory_modifications(&self, current_day: f64) -> Vec<&HistoryRecord> {
        self.by_operation_from_day(
            HistoryOperation::ScheduleFactory,
            current_day - lead_times::FACTORY_INVESTMENT_DAYS,
        )
    }

    /// Warehouse openings still under construction on `current_day`.
    pub fn pending_warehouse_modifications(&self, current_day: f64) -> Vec<&HistoryRecord> {
        self.by_operation_from_day(
            HistoryOperation::ScheduleWarehouse,
            current_day - lead_times::WAREHOUSE_INVESTMENT_DAYS,
        )
    }
}
