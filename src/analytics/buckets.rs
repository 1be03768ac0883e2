//! Calendar rollups for dated money records.

use super::round_cents;
use crate::records::{DateRange, DatedAmount, IncomeRecord, IncomeType};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Income received in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
    pub labor: f64,
    pub passive: f64,
    pub sources: BTreeMap<String, f64>,
}

impl MonthBucket {
    fn new(month: String) -> Self {
        Self {
            month,
            total: 0.0,
            labor: 0.0,
            passive: 0.0,
            sources: BTreeMap::new(),
        }
    }

    fn add(&mut self, record: &IncomeRecord) {
        self.total = round_cents(self.total + record.amount);
        match record.income_type {
            IncomeType::Labor => self.labor = round_cents(self.labor + record.amount),
            IncomeType::Passive => self.passive = round_cents(self.passive + record.amount),
        }
        let by_source = self.sources.entry(record.source.clone()).or_insert(0.0);
        *by_source = round_cents(*by_source + record.amount);
    }
}

/// One step of the year-to-date running total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub cumulative: f64,
}

#[inline]
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Group income by the month it was received in. Sums are rounded to cents
/// at every addition. Buckets come out in first-seen order; callers that need
/// chronological order sort by `month`.
pub fn bucket_by_month(records: &[IncomeRecord]) -> Vec<MonthBucket> {
    let mut buckets: Vec<MonthBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = month_key(record.received_date);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                buckets.push(MonthBucket::new(key.clone()));
                index.insert(key, buckets.len() - 1);
                buckets.len() - 1
            }
        };
        buckets[slot].add(record);
    }

    buckets
}

/// Running total of income received in `year`, ordered by received date.
/// Records sharing a date each produce their own point.
pub fn cumulative_year_to_date(records: &[IncomeRecord], year: i32) -> Vec<CumulativePoint> {
    let mut in_year: Vec<&IncomeRecord> = records
        .iter()
        .filter(|r| r.received_date.year() == year)
        .collect();
    // Stable: same-day records keep their input order.
    in_year.sort_by_key(|r| r.received_date);

    let mut cumulative = 0.0;
    in_year
        .into_iter()
        .map(|r| {
            cumulative = round_cents(cumulative + r.amount);
            CumulativePoint {
                date: r.received_date,
                cumulative,
            }
        })
        .collect()
}

/// Cent-rounded sum of the amounts whose date falls in `range`.
pub fn sum_in_range<T: DatedAmount>(records: &[T], range: DateRange) -> f64 {
    records
        .iter()
        .filter(|r| range.contains(r.date()))
        .fold(0.0, |acc, r| round_cents(acc + r.amount()))
}

/// First and last day of the month containing `date`.
pub fn month_range(date: NaiveDate) -> DateRange {
    let start = date.with_day(1).unwrap_or(date);
    let end = start
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date);
    DateRange::new(start, end)
}

/// January 1st through December 31st of `date`'s year.
pub fn year_range(date: NaiveDate) -> DateRange {
    let start = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let end = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date);
    DateRange::new(start, end)
}
