//! Input/output helpers.
//!
//! - CSV ingest of game snapshots (`ingest`)
//! - series/summary exports (`export`)
//! - team standing histories (`standing`)

pub mod export;
pub mod ingest;
pub mod standing;

pub use export::*;
pub use ingest::*;
pub use standing::*;
