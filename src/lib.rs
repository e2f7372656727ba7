//! trafficr: quota-driven traffic generation engine.
//!
//! The schedule module derives visit quotas across hourly, daily, monthly,
//! and total horizons and gates traffic against per-hour buckets. The engine
//! module runs a concurrent worker pool over a FIFO task queue, executing
//! search and visit tasks through pluggable collaborators.

pub mod behavior;
pub mod collab;
pub mod config;
pub mod engine;
pub mod error;
pub mod schedule;

pub use error::{Result, TrafficError};
