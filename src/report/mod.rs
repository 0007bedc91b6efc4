//! Reporting: pending orders, text summaries and dashboard panels.
//!
//! Formatting lives here so the aggregation code stays free of presentation
//! concerns and output changes stay localized.

pub mod dashboard;
pub mod format;
pub mod orders;
pub mod summary;

pub use dashboard::{Dashboard, Panel, PanelLine};
pub use orders::{RegionOrders, RegionTransports, Shipment, pending_orders, pending_transports};
pub use summary::{
    factory_configuration, factory_modifications, order_summary, transport_summary, warehouse_modifications,
};
