//! `scg-dash` library crate.
//!
//! The binary (`scg`) is a thin wrapper around this library so that:
//!
//! - the aggregation engine is testable without spawning processes
//! - modules are reusable from other front-ends (notebooks, a web view)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod history;
pub mod io;
pub mod report;
pub mod series;
