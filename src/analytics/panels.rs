//! Fixed-window summary cards for the health, mind and wealth screens.
//!
//! Every panel takes an explicit `as_of` day. Windows are inclusive:
//! the short window is `as_of - 7 ..= as_of`, the previous one is
//! `as_of - 14 ..= as_of - 8`, the long one is `as_of - 30 ..= as_of`.

use super::buckets::{month_range, sum_in_range, year_range};
use super::round_to;
use super::summary::{mean_present, relative_change_percent};
use crate::records::{
    DailyObservation, DateRange, ExpenseRecord, IncomeRecord, IncomeType, Metric,
};
use chrono::{Days, NaiveDate};
use serde::Serialize;

const SHORT_DAYS: u32 = 7;
const LONG_DAYS: u32 = 30;

/// Meditation minutes that earn a full clarity rating.
const CLARITY_TARGET_MINUTES: f64 = 20.0;
const CLARITY_SCALE: f64 = 10.0;

/// Days of spending a monthly savings rate is projected over.
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy)]
struct Windows {
    short: DateRange,
    previous: DateRange,
    long: DateRange,
}

impl Windows {
    fn ending(as_of: NaiveDate) -> Self {
        let short = DateRange::trailing(as_of, SHORT_DAYS);
        let prev_end = short.start.checked_sub_days(Days::new(1)).unwrap_or(short.start);
        Self {
            short,
            previous: DateRange::trailing(prev_end, SHORT_DAYS - 1),
            long: DateRange::trailing(as_of, LONG_DAYS),
        }
    }
}

fn values_in(
    observations: &[DailyObservation],
    range: DateRange,
    metric: Metric,
) -> impl Iterator<Item = Option<f64>> + '_ {
    observations
        .iter()
        .filter(move |o| range.contains(o.date))
        .map(move |o| o.get(metric))
}

fn present_in(observations: &[DailyObservation], range: DateRange, metric: Metric) -> Vec<f64> {
    values_in(observations, range, metric).flatten().collect()
}

/// Most recent check-in on or before `as_of` within the long window.
fn latest_log(observations: &[DailyObservation], as_of: NaiveDate) -> Option<&DailyObservation> {
    let long = DateRange::trailing(as_of, LONG_DAYS);
    observations
        .iter()
        .filter(|o| long.contains(o.date))
        .max_by_key(|o| o.date)
}

// ── Health ──

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightCard {
    pub latest: Option<f64>,
    pub seven_day_avg: f64,
    pub thirty_day_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushupCard {
    pub today: Option<f64>,
    pub seven_day_total: f64,
    pub thirty_day_best: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsCard {
    pub today: Option<f64>,
    pub seven_day_avg: f64,
    /// Percent difference of the 7-day average against the 30-day average.
    pub thirty_day_trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingCard {
    pub weight_training: bool,
    pub stretching: bool,
    pub bike_minutes: Option<f64>,
    pub water_intake: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthPanel {
    pub weight: WeightCard,
    pub pushups: PushupCard,
    pub steps: StepsCard,
    pub training: TrainingCard,
}

pub fn health_panel(observations: &[DailyObservation], as_of: NaiveDate) -> HealthPanel {
    let w = Windows::ending(as_of);
    let latest = latest_log(observations, as_of);

    // Delta runs from the oldest weigh-in in the window to today's check-in;
    // no weigh-in today means no delta.
    let latest_weight = latest.and_then(|o| o.weight);
    let oldest_weight = present_in(observations, w.long, Metric::Weight).first().copied();
    let weight = WeightCard {
        latest: latest_weight,
        seven_day_avg: round_to(mean_present(values_in(observations, w.short, Metric::Weight)), 1),
        thirty_day_delta: match (oldest_weight, latest_weight) {
            (Some(oldest), Some(latest)) => round_to(latest - oldest, 1),
            _ => 0.0,
        },
    };

    let pushups = PushupCard {
        today: latest.and_then(|o| o.pushups),
        seven_day_total: present_in(observations, w.short, Metric::Pushups).iter().sum(),
        thirty_day_best: present_in(observations, w.long, Metric::Pushups)
            .into_iter()
            .fold(0.0, f64::max),
    };

    let steps_short = mean_present(values_in(observations, w.short, Metric::Steps));
    let steps_long = mean_present(values_in(observations, w.long, Metric::Steps));
    let steps = StepsCard {
        today: latest.and_then(|o| o.steps),
        seven_day_avg: round_to(steps_short, 0),
        thirty_day_trend: round_to(relative_change_percent(steps_short, steps_long), 1),
    };

    let training = TrainingCard {
        weight_training: latest.is_some_and(|o| o.weight_training),
        stretching: latest.is_some_and(|o| o.stretching),
        bike_minutes: latest.and_then(|o| o.bike_minutes),
        water_intake: latest.and_then(|o| o.water_intake),
    };

    HealthPanel {
        weight,
        pushups,
        steps,
        training,
    }
}

// ── Mind ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClarityCard {
    /// 0..=10, from the latest meditation session against a 20-minute target.
    pub rating: u8,
    /// Percent change of average meditation, this week against last week.
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningCard {
    pub today: f64,
    pub weekly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RitualsCard {
    pub am: bool,
    pub pm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MindPanel {
    pub clarity: ClarityCard,
    pub learning: LearningCard,
    pub rituals: RitualsCard,
}

pub fn clarity_rating(meditation_minutes: f64) -> u8 {
    if !meditation_minutes.is_finite() || meditation_minutes <= 0.0 {
        return 0;
    }
    round_to(meditation_minutes / CLARITY_TARGET_MINUTES * CLARITY_SCALE, 0).min(CLARITY_SCALE) as u8
}

pub fn mind_panel(observations: &[DailyObservation], as_of: NaiveDate) -> MindPanel {
    let w = Windows::ending(as_of);
    let latest = latest_log(observations, as_of);

    let meditation = latest.and_then(|o| o.meditation_minutes);
    let current = mean_present(values_in(observations, w.short, Metric::MeditationMinutes));
    let previous = mean_present(values_in(observations, w.previous, Metric::MeditationMinutes));

    let learning_today = latest
        .map(|o| o.study_minutes.unwrap_or(0.0) + o.reading_minutes.unwrap_or(0.0))
        .unwrap_or(0.0);
    let learning_weekly: f64 = present_in(observations, w.short, Metric::StudyMinutes)
        .iter()
        .chain(present_in(observations, w.short, Metric::ReadingMinutes).iter())
        .sum();

    MindPanel {
        clarity: ClarityCard {
            rating: clarity_rating(meditation.unwrap_or(0.0)),
            delta: round_to(relative_change_percent(current, previous), 0) as i64,
        },
        learning: LearningCard {
            today: learning_today,
            weekly: learning_weekly,
        },
        rituals: RitualsCard {
            am: meditation.is_some_and(|m| m > 0.0),
            pm: latest.and_then(|o| o.reading_minutes).is_some_and(|m| m > 0.0),
        },
    }
}

// ── Wealth ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeCard {
    pub monthly: f64,
    pub passive: f64,
    pub labor: f64,
    pub ytd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendCard {
    pub today: Option<f64>,
    pub seven_day_avg: f64,
    /// Percent change of average spend, this week against last week.
    pub trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsCard {
    pub today: Option<f64>,
    pub seven_day_avg: f64,
    /// `(monthly income - 30 * avg daily spend) / monthly income`, percent.
    pub monthly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WealthPanel {
    pub income: IncomeCard,
    pub spend: SpendCard,
    pub savings: SavingsCard,
}

/// Net of a day's logged income and spend. `None` when neither side was logged.
fn daily_savings(o: &DailyObservation) -> Option<f64> {
    match (o.income_today, o.spend_today) {
        (None, None) => None,
        (income, spend) => Some(income.unwrap_or(0.0) - spend.unwrap_or(0.0)),
    }
}

pub fn wealth_panel(
    observations: &[DailyObservation],
    income: &[IncomeRecord],
    as_of: NaiveDate,
) -> WealthPanel {
    let w = Windows::ending(as_of);
    let latest = latest_log(observations, as_of);

    let month = month_range(as_of);
    let monthly = sum_in_range(income, month);
    let passive: Vec<IncomeRecord> = income
        .iter()
        .filter(|r| r.income_type == IncomeType::Passive)
        .cloned()
        .collect();
    let monthly_passive = sum_in_range(&passive, month);

    let spend_now = mean_present(values_in(observations, w.short, Metric::SpendToday));
    let spend_before = mean_present(values_in(observations, w.previous, Metric::SpendToday));

    let savings_avg = mean_present(
        observations
            .iter()
            .filter(|o| w.short.contains(o.date))
            .map(daily_savings),
    );

    let monthly_rate = if monthly > 0.0 {
        round_to((monthly - spend_now * DAYS_PER_MONTH) / monthly * 100.0, 1)
    } else {
        0.0
    };

    WealthPanel {
        income: IncomeCard {
            monthly,
            passive: monthly_passive,
            labor: round_to(monthly - monthly_passive, 2),
            ytd: sum_in_range(income, year_range(as_of)),
        },
        spend: SpendCard {
            today: latest.and_then(|o| o.spend_today),
            seven_day_avg: round_to(spend_now, 2),
            trend: round_to(relative_change_percent(spend_now, spend_before), 1),
        },
        savings: SavingsCard {
            today: latest.and_then(daily_savings),
            seven_day_avg: round_to(savings_avg, 2),
            monthly_rate,
        },
    }
}

// ── Expenses ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub monthly: f64,
    pub ytd: f64,
}

pub fn expense_summary(expenses: &[ExpenseRecord], as_of: NaiveDate) -> ExpenseSummary {
    ExpenseSummary {
        monthly: sum_in_range(expenses, month_range(as_of)),
        ytd: sum_in_range(expenses, year_range(as_of)),
    }
}
