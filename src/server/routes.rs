use crate::analytics::buckets::year_range;
use crate::analytics::{panels, report, text};
use crate::config::AppConfig;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::records::{DailyObservation, DateRange, ExpenseRecord, IncomeRecord, IncomeType, JournalRecord, Metric};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{Datelike, NaiveDate};
use portable_atomic::Ordering::Relaxed;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type ApiResult = Result<Json<serde_json::Value>, AppError>;
type CreatedResult = Result<(StatusCode, Json<serde_json::Value>), AppError>;
type QueryParams<T> = Result<Query<T>, QueryRejection>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days: Option<u32>,
    /// Year for the running income total; defaults to the window's end year.
    pub year: Option<i32>,
    /// Moving-average window; defaults to config.
    pub window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsOfQuery {
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeBody {
    pub amount: f64,
    pub source: String,
    pub currency: Option<String>,
    pub income_type: Option<String>,
    pub received_date: String,
}

#[derive(Debug, Deserialize)]
pub struct JournalBody {
    pub date: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBody {
    pub amount: f64,
    pub category: Option<String>,
    pub expense_date: Option<String>,
}

// ── Helpers ──

/// The only place the service reads the clock.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

/// Unwrap an extractor so malformed input goes through `AppError` like
/// every other failure.
fn query<T>(params: QueryParams<T>) -> AppResult<T> {
    params.map(|Query(p)| p).map_err(AppError::from)
}

fn body<T>(payload: JsonBody<T>) -> AppResult<T> {
    payload.map(|Json(b)| b).map_err(AppError::from)
}

fn tracked<T>(state: &AppState, result: AppResult<T>) -> AppResult<T> {
    if result.is_err() {
        state.counters.requests_failed.fetch_add(1, Relaxed);
    }
    result
}

pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::Parse(format!("{field}: {e}")))
}

/// Resolve the request window: explicit `startDate`/`endDate`, else `days`
/// back from `today`, else the configured default.
pub fn resolve_range(query: &RangeQuery, today: NaiveDate, config: &AppConfig) -> AppResult<DateRange> {
    let range = match (&query.start_date, &query.end_date) {
        (Some(start), Some(end)) => {
            let range = DateRange::new(parse_date("startDate", start)?, parse_date("endDate", end)?);
            if range.start > range.end {
                return Err(AppError::InvalidInput("startDate is after endDate".into()));
            }
            range
        }
        (None, None) => {
            let days = query.days.unwrap_or(config.default_window_days);
            DateRange::trailing(today, days)
        }
        _ => {
            return Err(AppError::InvalidInput(
                "startDate and endDate must be given together".into(),
            ))
        }
    };

    if range.num_days() > i64::from(config.max_window_days) + 1 {
        return Err(AppError::InvalidInput(format!(
            "window of {} days exceeds the {} day limit",
            range.num_days(),
            config.max_window_days
        )));
    }
    Ok(range)
}

fn resolve_as_of(query: &AsOfQuery) -> AppResult<NaiveDate> {
    match &query.as_of {
        Some(s) => parse_date("asOf", s),
        None => Ok(today()),
    }
}

fn ma_window(query: &RangeQuery, config: &AppConfig) -> usize {
    query.window.unwrap_or(config.moving_average_window).max(1)
}

// ── Analytics (reads) ──

/// GET /api/users/{user_id}/analytics -- full chart report for a window
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: QueryParams<RangeQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| analytics_for(&state, &user_id, &params));
    tracked(&state, result).map(ok)
}

fn analytics_for(state: &AppState, user_id: &str, params: &RangeQuery) -> AppResult<serde_json::Value> {
    let range = resolve_range(params, today(), &state.config)?;
    let observations = db::get_daily_observations(&state.db, user_id, range)?;
    let income = db::get_income(&state.db, user_id, range)?;
    let journal = db::get_journal(&state.db, user_id, range)?;
    state.counters.add_rows(observations.len() + income.len() + journal.len());

    let year = params.year.unwrap_or(range.end.year());
    let analytics = report::build_report(
        &observations,
        &income,
        &journal,
        year,
        ma_window(params, &state.config),
    );

    tracing::info!(
        user_id = %user_id,
        start = %range.start,
        end = %range.end,
        observations = observations.len(),
        income = income.len(),
        journal = journal.len(),
        "analytics computed"
    );
    state.counters.analytics_served.fetch_add(1, Relaxed);
    Ok(serde_json::json!({ "range": range, "analytics": analytics }))
}

/// GET /api/users/{user_id}/series/{metric} -- one metric with moving average
pub async fn get_metric_series(
    State(state): State<Arc<AppState>>,
    Path((user_id, metric)): Path<(String, String)>,
    params: QueryParams<RangeQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| series_for(&state, &user_id, &metric, &params));
    tracked(&state, result).map(ok)
}

fn series_for(
    state: &AppState,
    user_id: &str,
    metric: &str,
    params: &RangeQuery,
) -> AppResult<serde_json::Value> {
    let metric: Metric = metric.parse().map_err(AppError::InvalidInput)?;
    let range = resolve_range(params, today(), &state.config)?;
    let observations = db::get_daily_observations(&state.db, user_id, range)?;
    state.counters.add_rows(observations.len());

    let trend = report::smoothed_trend(&observations, metric, ma_window(params, &state.config));
    tracing::debug!(user_id = %user_id, metric = %metric, points = trend.data.len(), "series computed");
    state.counters.analytics_served.fetch_add(1, Relaxed);
    Ok(serde_json::json!({ "metric": metric, "range": range, "trend": trend }))
}

/// Rows a panel needs: the 30-day daily window ending at `as_of`.
fn panel_observations(state: &AppState, user_id: &str, as_of: NaiveDate) -> AppResult<Vec<DailyObservation>> {
    let observations = db::get_daily_observations(&state.db, user_id, DateRange::trailing(as_of, 30))?;
    state.counters.add_rows(observations.len());
    state.counters.panels_served.fetch_add(1, Relaxed);
    Ok(observations)
}

/// GET /api/users/{user_id}/health
pub async fn get_health(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: QueryParams<AsOfQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| resolve_as_of(&params)).and_then(|as_of| {
        let observations = panel_observations(&state, &user_id, as_of)?;
        Ok(panels::health_panel(&observations, as_of))
    });
    tracked(&state, result).map(ok)
}

/// GET /api/users/{user_id}/mind
pub async fn get_mind(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: QueryParams<AsOfQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| resolve_as_of(&params)).and_then(|as_of| {
        let observations = panel_observations(&state, &user_id, as_of)?;
        Ok(panels::mind_panel(&observations, as_of))
    });
    tracked(&state, result).map(ok)
}

/// GET /api/users/{user_id}/wealth
pub async fn get_wealth(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: QueryParams<AsOfQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| resolve_as_of(&params)).and_then(|as_of| {
        let observations = panel_observations(&state, &user_id, as_of)?;
        let income = db::get_income(&state.db, &user_id, year_range(as_of))?;
        state.counters.add_rows(income.len());
        Ok(panels::wealth_panel(&observations, &income, as_of))
    });
    tracked(&state, result).map(ok)
}

/// GET /api/users/{user_id}/expenses/summary
pub async fn get_expense_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: QueryParams<AsOfQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| resolve_as_of(&params)).and_then(|as_of| {
        let expenses = db::get_expenses(&state.db, &user_id, year_range(as_of))?;
        state.counters.add_rows(expenses.len());
        state.counters.panels_served.fetch_add(1, Relaxed);
        Ok(panels::expense_summary(&expenses, as_of))
    });
    tracked(&state, result).map(ok)
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    ok(state.counters.snapshot())
}

/// GET /api/users/{user_id}/daily-log -- one day's check-in (default today)
pub async fn get_daily_log(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: QueryParams<DayQuery>,
) -> ApiResult {
    let result = query(params).and_then(|params| daily_log_for(&state, &user_id, &params));
    tracked(&state, result).map(ok)
}

fn daily_log_for(state: &AppState, user_id: &str, params: &DayQuery) -> AppResult<DailyObservation> {
    let date = match &params.date {
        Some(s) => parse_date("date", s)?,
        None => today(),
    };
    db::get_daily_log(&state.db, user_id, date)?
        .ok_or_else(|| AppError::NotFound(format!("no log for {date}")))
}

// ── Ingestion (writes) ──

/// POST /api/users/{user_id}/daily-log -- upsert one day's check-in (default today)
pub async fn post_daily_log(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: JsonBody<serde_json::Value>,
) -> ApiResult {
    let result = body(payload).and_then(|b| save_daily_log(&state, &user_id, b));
    tracked(&state, result).map(ok)
}

fn save_daily_log(state: &AppState, user_id: &str, body: serde_json::Value) -> AppResult<DailyObservation> {
    let serde_json::Value::Object(mut fields) = body else {
        return Err(AppError::InvalidInput("daily log body must be a JSON object".into()));
    };
    fields
        .entry("date")
        .or_insert_with(|| serde_json::Value::String(today().to_string()));
    let obs: DailyObservation = serde_json::from_value(serde_json::Value::Object(fields))?;

    db::upsert_daily_log(&state.db, user_id, &obs)?;
    state.counters.writes_accepted.fetch_add(1, Relaxed);
    tracing::info!(user_id = %user_id, date = %obs.date, "daily log saved");
    Ok(obs)
}

/// POST /api/users/{user_id}/income
pub async fn post_income(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: JsonBody<IncomeBody>,
) -> CreatedResult {
    let result = body(payload).and_then(|b| save_income(&state, &user_id, b));
    tracked(&state, result).map(|r| (StatusCode::CREATED, ok(r)))
}

fn save_income(state: &AppState, user_id: &str, body: IncomeBody) -> AppResult<IncomeRecord> {
    let income_type = body
        .income_type
        .as_deref()
        .map(IncomeType::parse_lenient)
        .unwrap_or(IncomeType::Labor);
    let mut record = IncomeRecord::new(
        parse_date("receivedDate", &body.received_date)?,
        body.amount,
        income_type,
        body.source.trim(),
    );
    if let Some(currency) = body.currency.as_deref().filter(|c| !c.trim().is_empty()) {
        record.currency = currency.trim().to_uppercase();
    }

    db::insert_income(&state.db, user_id, &record)?;
    state.counters.writes_accepted.fetch_add(1, Relaxed);
    tracing::info!(user_id = %user_id, amount = record.amount, kind = %record.income_type, "income logged");
    Ok(record)
}

/// POST /api/users/{user_id}/journal -- save the entry for a day (default today)
pub async fn post_journal(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: JsonBody<JournalBody>,
) -> ApiResult {
    let result = body(payload).and_then(|b| save_journal(&state, &user_id, b));
    tracked(&state, result).map(ok)
}

fn save_journal(state: &AppState, user_id: &str, body: JournalBody) -> AppResult<serde_json::Value> {
    let date = match &body.date {
        Some(s) => parse_date("date", s)?,
        None => today(),
    };
    let entry = JournalRecord {
        date,
        content: body.content,
    };

    db::upsert_journal(&state.db, user_id, &entry)?;
    state.counters.writes_accepted.fetch_add(1, Relaxed);
    let words = text::word_count(&entry.content);
    tracing::debug!(user_id = %user_id, date = %date, words, "journal saved");
    Ok(serde_json::json!({ "date": date, "wordCount": words }))
}

/// POST /api/users/{user_id}/expenses
pub async fn post_expense(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: JsonBody<ExpenseBody>,
) -> CreatedResult {
    let result = body(payload).and_then(|b| save_expense(&state, &user_id, b));
    tracked(&state, result).map(|r| (StatusCode::CREATED, ok(r)))
}

fn save_expense(state: &AppState, user_id: &str, body: ExpenseBody) -> AppResult<ExpenseRecord> {
    let expense_date = match &body.expense_date {
        Some(s) => parse_date("expenseDate", s)?,
        None => today(),
    };
    let record = ExpenseRecord {
        id: uuid::Uuid::new_v4().to_string(),
        expense_date,
        amount: body.amount,
        category: body
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "general".to_string()),
    };

    db::insert_expense(&state.db, user_id, &record)?;
    state.counters.writes_accepted.fetch_add(1, Relaxed);
    tracing::info!(user_id = %user_id, amount = record.amount, "expense logged");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_resolve_range_defaults_to_config_window() {
        let cfg = AppConfig::default();
        let range = resolve_range(&RangeQuery::default(), d("2024-03-31"), &cfg).unwrap();
        assert_eq!(range, DateRange::new(d("2024-03-01"), d("2024-03-31")));
    }

    #[test]
    fn test_resolve_range_explicit_dates() {
        let cfg = AppConfig::default();
        let q = RangeQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-10".into()),
            ..Default::default()
        };
        let range = resolve_range(&q, d("2030-01-01"), &cfg).unwrap();
        assert_eq!(range, DateRange::new(d("2024-01-01"), d("2024-01-10")));
    }

    #[test]
    fn test_resolve_range_rejects_bad_input() {
        let cfg = AppConfig::default();
        let today = d("2024-03-31");

        let reversed = RangeQuery {
            start_date: Some("2024-02-01".into()),
            end_date: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(matches!(resolve_range(&reversed, today, &cfg), Err(AppError::InvalidInput(_))));

        let half = RangeQuery { start_date: Some("2024-02-01".into()), ..Default::default() };
        assert!(matches!(resolve_range(&half, today, &cfg), Err(AppError::InvalidInput(_))));

        let garbage = RangeQuery {
            start_date: Some("yesterday".into()),
            end_date: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(matches!(resolve_range(&garbage, today, &cfg), Err(AppError::Parse(_))));

        let too_long = RangeQuery { days: Some(5000), ..Default::default() };
        assert!(matches!(resolve_range(&too_long, today, &cfg), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_ma_window_never_zero() {
        let cfg = AppConfig::default();
        let q = RangeQuery { window: Some(0), ..Default::default() };
        assert_eq!(ma_window(&q, &cfg), 1);
        assert_eq!(ma_window(&RangeQuery::default(), &cfg), 7);
    }
}
