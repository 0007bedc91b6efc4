//! Pending orders and in-transit shipments derived from raw series points.

use serde::Serialize;

use crate::domain::lead_times;
use crate::io::ingest::SeriesGroup;
use crate::series::Series;

/// Open factory orders of one region, per destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionOrders {
    pub region: String,
    pub pending: Vec<(String, f64)>,
}

impl RegionOrders {
    pub fn quantity_for(&self, destination: &str) -> Option<f64> {
        self.pending
            .iter()
            .find(|(name, _)| name == destination)
            .map(|(_, q)| *q)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shipment {
    pub order_day: f64,
    pub arrival_day: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTransports {
    pub region: String,
    pub shipments: Vec<Shipment>,
}

/// Sum the trailing run of non-zero WIP samples of every destination.
///
/// The latest sample and the very first sample are never counted; the walk
/// starts at the second-to-last sample and stops at the first zero.
/// Destinations with nothing pending are left out.
pub fn pending_orders(wip: &[SeriesGroup]) -> Vec<RegionOrders> {
    wip.iter()
        .map(|group| {
            let mut pending: Vec<(String, f64)> = Vec::new();
            for series in &group.series {
                let quantity = trailing_quantity(series);
                if quantity > 0.0 {
                    match pending.iter().position(|(name, _)| name == series.name()) {
                        Some(i) => pending[i].1 = quantity,
                        None => pending.push((series.name().to_string(), quantity)),
                    }
                }
            }
            RegionOrders {
                region: group.name.clone(),
                pending,
            }
        })
        .collect()
}

fn trailing_quantity(series: &Series) -> f64 {
    let points = series.points();
    let mut quantity = 0.0;
    for idx in (1..points.len().saturating_sub(1)).rev() {
        if points[idx].value == 0.0 {
            break;
        }
        quantity += points[idx].value;
    }
    quantity
}

/// Shipments still on the road on `today`, from Mail/Truck inventory series.
///
/// Every increase of an in-transit inventory after `today - lead time` is one
/// shipment of the increased quantity.
pub fn pending_transports(inventory: &[SeriesGroup], today: f64) -> Vec<RegionTransports> {
    inventory
        .iter()
        .map(|group| {
            let shipments = group
                .series
                .iter()
                .filter_map(|s| shipping_lead_days(s.name()).map(|lead| (s, lead)))
                .flat_map(|(s, lead)| shipments_since(s, today - lead, lead))
                .collect();
            RegionTransports {
                region: group.name.clone(),
                shipments,
            }
        })
        .collect()
}

fn shipping_lead_days(name: &str) -> Option<f64> {
    if name.contains("Mail") {
        Some(lead_times::SHIPPING_MAIL_DAYS)
    } else if name.contains("Truck") {
        Some(lead_times::SHIPPING_TRUCK_DAYS)
    } else {
        None
    }
}

fn shipments_since(series: &Series, relevant_from: f64, lead: f64) -> Vec<Shipment> {
    let points = series.points();
    let start = (1..points.len())
        .rev()
        .find(|&idx| points[idx].day < relevant_from)
        .unwrap_or(0);

    points[start..]
        .windows(2)
        .filter(|w| w[1].value > w[0].value)
        .map(|w| Shipment {
            order_day: w[1].day,
            arrival_day: w[1].day + lead,
            quantity: w[1].value - w[0].value,
        })
        .collect()
}
