use super::{round_to, SeriesPoint, SmoothedPoint};
use crate::records::{DailyObservation, Metric};

/// Extract one metric as a `{date, value}` series, skipping days where it
/// was not logged. Input order is kept as-is; callers sort ascending by date.
pub fn build_series(observations: &[DailyObservation], metric: Metric) -> Vec<SeriesPoint> {
    observations
        .iter()
        .filter_map(|obs| {
            obs.get(metric).map(|value| SeriesPoint {
                date: obs.date,
                value,
            })
        })
        .collect()
}

/// Trailing moving average with a shrinking window at the start of the
/// series: point `i` averages `values[i+1-window ..= i]`, clamped at 0.
/// Averages are rounded to one decimal. A zero window behaves like 1.
pub fn moving_average(series: &[SeriesPoint], window: usize) -> Vec<SmoothedPoint> {
    let window = window.max(1);

    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            // Summed per point, not as a running total, so no drift accumulates.
            let start = (i + 1).saturating_sub(window);
            let slice = &series[start..=i];
            let sum: f64 = slice.iter().map(|p| p.value).sum();

            SmoothedPoint {
                date: point.date,
                value: point.value,
                moving_average: round_to(sum / slice.len() as f64, 1),
            }
        })
        .collect()
}
