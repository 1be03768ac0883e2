use super::buckets::{bucket_by_month, cumulative_year_to_date, CumulativePoint, MonthBucket};
use super::series::{build_series, moving_average};
use super::summary::{summarize, Summary};
use super::text::word_count;
use super::{round_to, SeriesPoint, SmoothedPoint};
use crate::records::{DailyObservation, IncomeRecord, JournalRecord, Metric};
use chrono::NaiveDate;
use serde::Serialize;

/// A metric's series plus its summary.
#[derive(Debug, Clone, Serialize)]
pub struct MetricTrend<P> {
    pub data: Vec<P>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncomeTrend {
    /// Sorted by month for charting.
    pub monthly: Vec<MonthBucket>,
    pub ytd: Vec<CumulativePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalPoint {
    pub date: NaiveDate,
    pub word_count: usize,
}

/// Everything the analytics dashboard draws for one window.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub weight: MetricTrend<SmoothedPoint>,
    pub pushups: Vec<SeriesPoint>,
    pub steps: MetricTrend<SeriesPoint>,
    pub meditation: MetricTrend<SeriesPoint>,
    pub study: Vec<SeriesPoint>,
    pub reading: Vec<SeriesPoint>,
    pub spending: MetricTrend<SeriesPoint>,
    pub income: IncomeTrend,
    pub consistency: MetricTrend<SeriesPoint>,
    pub journal: Vec<JournalPoint>,
}

/// Series and summary for one metric, with the 7-day average rounded the way
/// the dashboard displays that metric.
pub fn metric_trend(observations: &[DailyObservation], metric: Metric) -> MetricTrend<SeriesPoint> {
    let data = build_series(observations, metric);
    let summary = display_summary(&data, metric);
    MetricTrend { data, summary }
}

/// Like [`metric_trend`] but each point carries its trailing moving average.
pub fn smoothed_trend(
    observations: &[DailyObservation],
    metric: Metric,
    window: usize,
) -> MetricTrend<SmoothedPoint> {
    let series = build_series(observations, metric);
    let summary = display_summary(&series, metric);
    MetricTrend {
        data: moving_average(&series, window),
        summary,
    }
}

fn display_summary(series: &[SeriesPoint], metric: Metric) -> Summary {
    let mut summary = summarize(series);
    summary.seven_day_average = round_to(summary.seven_day_average, metric.average_precision());
    summary
}

pub fn journal_word_counts(entries: &[JournalRecord]) -> Vec<JournalPoint> {
    entries
        .iter()
        .map(|e| JournalPoint {
            date: e.date,
            word_count: word_count(&e.content),
        })
        .collect()
}

/// Build the full report. Inputs are already filtered to the requested
/// window and sorted ascending; `ytd_year` picks the year for the running
/// income total.
pub fn build_report(
    observations: &[DailyObservation],
    income: &[IncomeRecord],
    journal: &[JournalRecord],
    ytd_year: i32,
    ma_window: usize,
) -> AnalyticsReport {
    let mut monthly = bucket_by_month(income);
    monthly.sort_by(|a, b| a.month.cmp(&b.month));

    AnalyticsReport {
        weight: smoothed_trend(observations, Metric::Weight, ma_window),
        pushups: build_series(observations, Metric::Pushups),
        steps: metric_trend(observations, Metric::Steps),
        meditation: metric_trend(observations, Metric::MeditationMinutes),
        study: build_series(observations, Metric::StudyMinutes),
        reading: build_series(observations, Metric::ReadingMinutes),
        spending: metric_trend(observations, Metric::SpendToday),
        income: IncomeTrend {
            monthly,
            ytd: cumulative_year_to_date(income, ytd_year),
        },
        consistency: metric_trend(observations, Metric::ConsistencyScore),
        journal: journal_word_counts(journal),
    }
}
