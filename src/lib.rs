//! Carbon-aware scheduling advisor for household appliances.
//!
//! Forecasts hourly grid carbon intensity from weather data and picks the
//! lowest-carbon start time for a task.

pub mod advisor;
#[cfg(feature = "api")]
pub mod api;
pub mod appliance;
pub mod cli;
pub mod config;
/// Feature encoding, forecast construction, and the versioned forecast store.
pub mod forecast;
pub mod io;
pub mod logging;
pub mod model;
/// Slot optimization and impact estimation.
pub mod schedule;
pub mod weather;
