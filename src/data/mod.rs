//! Synthetic input data.

pub mod sample;

pub use sample::{DemoConfig, DemoGame, generate_demo, write_demo};
