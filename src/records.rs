use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Daily check-in ──

/// One user's logged metrics for a single calendar day.
/// `None` means "not logged", which is different from a logged zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub pushups: Option<f64>,
    pub steps: Option<f64>,
    pub bike_minutes: Option<f64>,
    pub water_intake: Option<f64>,
    pub meditation_minutes: Option<f64>,
    pub study_minutes: Option<f64>,
    pub reading_minutes: Option<f64>,
    pub spend_today: Option<f64>,
    pub income_today: Option<f64>,
    pub consistency_score: Option<f64>,
    #[serde(default)]
    pub weight_training: bool,
    #[serde(default)]
    pub stretching: bool,
}

impl DailyObservation {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }

    #[inline]
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Weight => self.weight,
            Metric::Pushups => self.pushups,
            Metric::Steps => self.steps,
            Metric::BikeMinutes => self.bike_minutes,
            Metric::WaterIntake => self.water_intake,
            Metric::MeditationMinutes => self.meditation_minutes,
            Metric::StudyMinutes => self.study_minutes,
            Metric::ReadingMinutes => self.reading_minutes,
            Metric::SpendToday => self.spend_today,
            Metric::IncomeToday => self.income_today,
            Metric::ConsistencyScore => self.consistency_score,
        }
    }
}

/// Selector for one optional numeric field of a [`DailyObservation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight,
    Pushups,
    Steps,
    BikeMinutes,
    WaterIntake,
    MeditationMinutes,
    StudyMinutes,
    ReadingMinutes,
    SpendToday,
    IncomeToday,
    ConsistencyScore,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::Weight,
        Metric::Pushups,
        Metric::Steps,
        Metric::BikeMinutes,
        Metric::WaterIntake,
        Metric::MeditationMinutes,
        Metric::StudyMinutes,
        Metric::ReadingMinutes,
        Metric::SpendToday,
        Metric::IncomeToday,
        Metric::ConsistencyScore,
    ];

    /// Column name in the `daily_logs` table.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Weight => "weight",
            Metric::Pushups => "pushups",
            Metric::Steps => "steps",
            Metric::BikeMinutes => "bike_minutes",
            Metric::WaterIntake => "water_intake",
            Metric::MeditationMinutes => "meditation_minutes",
            Metric::StudyMinutes => "study_minutes",
            Metric::ReadingMinutes => "reading_minutes",
            Metric::SpendToday => "spend_today",
            Metric::IncomeToday => "income_today",
            Metric::ConsistencyScore => "consistency_score",
        }
    }

    /// Decimal places used when a dashboard shows this metric's 7-day average.
    pub fn average_precision(self) -> u32 {
        match self {
            Metric::Weight => 1,
            Metric::SpendToday | Metric::IncomeToday => 2,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    /// Accepts snake_case, camelCase and kebab-case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Metric::ALL
            .into_iter()
            .find(|m| m.column().replace('_', "") == normalized)
            .ok_or_else(|| format!("unknown metric: {s}"))
    }
}

// ── Income ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeType {
    Labor,
    Passive,
}

impl IncomeType {
    pub fn as_str(self) -> &'static str {
        match self {
            IncomeType::Labor => "labor",
            IncomeType::Passive => "passive",
        }
    }

    /// Anything that is not explicitly passive counts as labor.
    pub fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("passive") {
            IncomeType::Passive
        } else {
            IncomeType::Labor
        }
    }
}

impl std::fmt::Display for IncomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub id: String,
    pub received_date: NaiveDate,
    pub amount: f64,
    pub income_type: IncomeType,
    pub source: String,
    pub currency: String,
}

impl IncomeRecord {
    pub fn new(received_date: NaiveDate, amount: f64, income_type: IncomeType, source: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            received_date,
            amount,
            income_type,
            source: source.to_string(),
            currency: "USD".to_string(),
        }
    }
}

// ── Journal ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub date: NaiveDate,
    pub content: String,
}

// ── Expenses ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub category: String,
}

/// Anything with a calendar date and an amount; lets income and expenses
/// share the range-sum helpers.
pub trait DatedAmount {
    fn date(&self) -> NaiveDate;
    fn amount(&self) -> f64;
}

impl DatedAmount for IncomeRecord {
    #[inline]
    fn date(&self) -> NaiveDate {
        self.received_date
    }
    #[inline]
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl DatedAmount for ExpenseRecord {
    #[inline]
    fn date(&self) -> NaiveDate {
        self.expense_date
    }
    #[inline]
    fn amount(&self) -> f64 {
        self.amount
    }
}

// ── Date window ──

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `days` back from `end`, inclusive of both endpoints.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(chrono::Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_metric_parse_variants() {
        assert_eq!("weight".parse::<Metric>().unwrap(), Metric::Weight);
        assert_eq!("meditation_minutes".parse::<Metric>().unwrap(), Metric::MeditationMinutes);
        assert_eq!("meditationMinutes".parse::<Metric>().unwrap(), Metric::MeditationMinutes);
        assert_eq!("spend-today".parse::<Metric>().unwrap(), Metric::SpendToday);
        assert!("heartbeat".parse::<Metric>().is_err());
    }

    #[test]
    fn test_get_reads_the_named_column() {
        let obs = DailyObservation {
            weight: Some(1.0),
            pushups: Some(2.0),
            steps: Some(3.0),
            bike_minutes: Some(4.0),
            water_intake: Some(5.0),
            meditation_minutes: Some(6.0),
            study_minutes: Some(7.0),
            reading_minutes: Some(8.0),
            spend_today: Some(9.0),
            income_today: Some(10.0),
            consistency_score: Some(11.0),
            ..DailyObservation::new(d("2024-01-01"))
        };
        for (i, m) in Metric::ALL.into_iter().enumerate() {
            assert_eq!(obs.get(m), Some(i as f64 + 1.0), "metric {m}");
        }
        assert_eq!(DailyObservation::new(d("2024-01-01")).get(Metric::Steps), None);
    }

    #[test]
    fn test_income_type_lenient() {
        assert_eq!(IncomeType::parse_lenient("PASSIVE"), IncomeType::Passive);
        assert_eq!(IncomeType::parse_lenient("labor"), IncomeType::Labor);
        assert_eq!(IncomeType::parse_lenient("SALARY"), IncomeType::Labor);
    }

    #[test]
    fn test_trailing_range() {
        let r = DateRange::trailing(d("2024-03-01"), 7);
        assert_eq!(r.start, d("2024-02-23"));
        assert!(r.contains(d("2024-02-23")));
        assert!(r.contains(d("2024-03-01")));
        assert!(!r.contains(d("2024-03-02")));
        assert_eq!(r.num_days(), 8);
    }
}
