//! File export of forecast data.

pub mod export;
