//! Common utility functions for the simulator

pub mod bounds;

pub use bounds::{clamp_to_range, round_to_precision, round_within_range};
