use super::{round_to, SeriesPoint};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Number of trailing points in the short average.
pub const SHORT_WINDOW: usize = 7;

/// Headline numbers for one metric over the supplied window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Last present value; `None` when nothing was logged.
    pub latest: Option<f64>,
    /// Mean of the last `min(7, len)` values; 0 when empty.
    pub seven_day_average: f64,
    /// `round((last - first) / first * 100)` over the window.
    pub thirty_day_percent_change: i64,
    /// `last - first`, one decimal.
    pub change: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

/// Summarize a series. Callers pass roughly a 30-day window; the percent
/// change is a naive first-to-last endpoint delta, not a regression slope.
pub fn summarize(series: &[SeriesPoint]) -> Summary {
    let values: Vec<f64> = series.iter().map(|p| p.value).collect();

    let (min, max) = if values.is_empty() {
        (None, None)
    } else {
        (
            Some(Statistics::min(values.iter())),
            Some(Statistics::max(values.iter())),
        )
    };

    Summary {
        latest: values.last().copied(),
        seven_day_average: trailing_mean(&values, SHORT_WINDOW),
        thirty_day_percent_change: endpoint_percent_change(&values),
        change: endpoint_change(&values),
        min,
        max,
        count: values.len(),
    }
}

/// Mean of the last `min(n, len)` values, divided by the actual count used.
pub fn trailing_mean(values: &[f64], n: usize) -> f64 {
    let take = values.len().min(n);
    if take == 0 {
        return 0.0;
    }
    values[values.len() - take..].iter().mean()
}

/// Integer percent change from the first to the last value, ties rounded up.
/// 0 for fewer than two points, a zero first value, or a non-finite result.
pub fn endpoint_percent_change(values: &[f64]) -> i64 {
    if values.len() < 2 {
        return 0;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    if first == 0.0 {
        return 0;
    }
    let pct = (last - first) / first * 100.0;
    if !pct.is_finite() {
        return 0;
    }
    round_to(pct, 0) as i64
}

/// Absolute first-to-last change, one decimal. 0 for fewer than two points.
pub fn endpoint_change(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() >= 2 => round_to(last - first, 1),
        _ => 0.0,
    }
}

/// Mean of the present values; 0 when every value is absent.
pub fn mean_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().mean()
    }
}

/// `(current - previous) / previous * 100`, or 0 when `previous` is not
/// positive.
pub fn relative_change_percent(current: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return 0.0;
    }
    let pct = (current - previous) / previous * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
