//! Metric aggregation.
//!
//! Pure functions that turn persisted daily / income / journal rows into
//! chart-ready series and summaries. Nothing in here reads the clock, touches
//! the database, or fails: degenerate input yields zeros, empty vectors or
//! `None`.

pub mod buckets;
pub mod panels;
pub mod report;
pub mod series;
pub mod summary;
pub mod text;

use chrono::NaiveDate;
use serde::Serialize;

/// One present value on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A series point with its trailing moving average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothedPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub moving_average: f64,
}

/// Round to `decimals` places, ties toward positive infinity
/// (`-2.5` rounds to `-2`, `2.5` to `3`).
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor + 0.5).floor() / factor
}

/// Round to whole cents.
#[inline]
pub fn round_cents(value: f64) -> f64 {
    round_to(value, 2)
}
