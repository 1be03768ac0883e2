use crate::errors::{AppError, AppResult};
use crate::records::{
    DailyObservation, DateRange, ExpenseRecord, IncomeRecord, IncomeType, JournalRecord, Metric,
};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub type DbPool = Arc<Mutex<Connection>>;

pub fn init_db(data_dir: &Path) -> AppResult<DbPool> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("brotherhood_os.db");
    let conn = Connection::open(&db_path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA cache_size=-64000;")?;

    let pool = init_conn(conn)?;
    tracing::info!("database initialized at {}", db_path.display());
    Ok(pool)
}

/// Apply the schema to an open connection and wrap it in a pool.
pub fn init_conn(conn: Connection) -> AppResult<DbPool> {
    let schema = include_str!("../migrations/001_init.sql");
    conn.execute_batch(schema)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn lock(db: &DbPool) -> AppResult<MutexGuard<'_, Connection>> {
    db.lock().map_err(|e| AppError::Database(format!("lock poisoned: {e}")))
}

// ── Input validation (the aggregator trusts whatever it is given) ──

fn check_amount(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::InvalidInput(format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(AppError::InvalidInput(format!("{field} must not be negative")));
    }
    Ok(())
}

pub fn validate_observation(obs: &DailyObservation) -> AppResult<()> {
    for metric in Metric::ALL {
        if let Some(v) = obs.get(metric) {
            check_amount(metric.column(), v)?;
        }
    }
    Ok(())
}

fn validate_user(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user id must not be empty".into()));
    }
    Ok(())
}

// ── Writes ──

/// Insert or replace the check-in for `(user_id, obs.date)`.
pub fn upsert_daily_log(db: &DbPool, user_id: &str, obs: &DailyObservation) -> AppResult<()> {
    validate_user(user_id)?;
    validate_observation(obs)?;
    let conn = lock(db)?;
    conn.execute(
        "INSERT INTO daily_logs (user_id, date, weight, pushups, steps, bike_minutes, water_intake,
             meditation_minutes, study_minutes, reading_minutes, spend_today, income_today,
             consistency_score, weight_training, stretching)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT (user_id, date) DO UPDATE SET
             weight = excluded.weight,
             pushups = excluded.pushups,
             steps = excluded.steps,
             bike_minutes = excluded.bike_minutes,
             water_intake = excluded.water_intake,
             meditation_minutes = excluded.meditation_minutes,
             study_minutes = excluded.study_minutes,
             reading_minutes = excluded.reading_minutes,
             spend_today = excluded.spend_today,
             income_today = excluded.income_today,
             consistency_score = excluded.consistency_score,
             weight_training = excluded.weight_training,
             stretching = excluded.stretching,
             updated_at = datetime('now')",
        rusqlite::params![
            user_id,
            obs.date,
            obs.weight,
            obs.pushups,
            obs.steps,
            obs.bike_minutes,
            obs.water_intake,
            obs.meditation_minutes,
            obs.study_minutes,
            obs.reading_minutes,
            obs.spend_today,
            obs.income_today,
            obs.consistency_score,
            obs.weight_training,
            obs.stretching,
        ],
    )?;
    Ok(())
}

pub fn insert_income(db: &DbPool, user_id: &str, record: &IncomeRecord) -> AppResult<()> {
    validate_user(user_id)?;
    check_amount("amount", record.amount)?;
    if record.source.trim().is_empty() {
        return Err(AppError::InvalidInput("source must not be empty".into()));
    }
    let conn = lock(db)?;
    conn.execute(
        "INSERT INTO income_logs (id, user_id, amount, source, currency, income_type, received_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            record.id,
            user_id,
            record.amount,
            record.source,
            record.currency,
            record.income_type.as_str(),
            record.received_date,
        ],
    )?;
    Ok(())
}

/// One journal entry per user per day; saving again replaces the content.
pub fn upsert_journal(db: &DbPool, user_id: &str, entry: &JournalRecord) -> AppResult<()> {
    validate_user(user_id)?;
    let conn = lock(db)?;
    conn.execute(
        "INSERT INTO journal_entries (user_id, date, content) VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id, date) DO UPDATE SET content = excluded.content, updated_at = datetime('now')",
        rusqlite::params![user_id, entry.date, entry.content],
    )?;
    Ok(())
}

pub fn insert_expense(db: &DbPool, user_id: &str, record: &ExpenseRecord) -> AppResult<()> {
    validate_user(user_id)?;
    check_amount("amount", record.amount)?;
    let conn = lock(db)?;
    conn.execute(
        "INSERT INTO expense_logs (id, user_id, amount, category, expense_date) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![record.id, user_id, record.amount, record.category, record.expense_date],
    )?;
    Ok(())
}

// ── Reads (ascending by date, which the aggregator relies on) ──

const DAILY_COLUMNS: &str = "date, weight, pushups, steps, bike_minutes, water_intake, \
    meditation_minutes, study_minutes, reading_minutes, spend_today, income_today, \
    consistency_score, weight_training, stretching";

fn map_daily(row: &Row<'_>) -> rusqlite::Result<DailyObservation> {
    Ok(DailyObservation {
        date: row.get(0)?,
        weight: row.get(1)?,
        pushups: row.get(2)?,
        steps: row.get(3)?,
        bike_minutes: row.get(4)?,
        water_intake: row.get(5)?,
        meditation_minutes: row.get(6)?,
        study_minutes: row.get(7)?,
        reading_minutes: row.get(8)?,
        spend_today: row.get(9)?,
        income_today: row.get(10)?,
        consistency_score: row.get(11)?,
        weight_training: row.get(12)?,
        stretching: row.get(13)?,
    })
}

pub fn get_daily_observations(
    db: &DbPool,
    user_id: &str,
    range: DateRange,
) -> AppResult<Vec<DailyObservation>> {
    let conn = lock(db)?;
    let sql = format!(
        "SELECT {DAILY_COLUMNS} FROM daily_logs
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params![user_id, range.start, range.end], map_daily)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_daily_log(
    db: &DbPool,
    user_id: &str,
    date: chrono::NaiveDate,
) -> AppResult<Option<DailyObservation>> {
    let mut logs = get_daily_observations(db, user_id, DateRange::new(date, date))?;
    Ok(logs.pop())
}

pub fn get_income(db: &DbPool, user_id: &str, range: DateRange) -> AppResult<Vec<IncomeRecord>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, received_date, amount, income_type, source, currency FROM income_logs
         WHERE user_id = ?1 AND received_date >= ?2 AND received_date <= ?3
         ORDER BY received_date ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, range.start, range.end], |row| {
        Ok(IncomeRecord {
            id: row.get(0)?,
            received_date: row.get(1)?,
            amount: row.get(2)?,
            income_type: IncomeType::parse_lenient(&row.get::<_, String>(3)?),
            source: row.get(4)?,
            currency: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_journal(db: &DbPool, user_id: &str, range: DateRange) -> AppResult<Vec<JournalRecord>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT date, content FROM journal_entries
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, range.start, range.end], |row| {
        Ok(JournalRecord {
            date: row.get(0)?,
            content: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_expenses(db: &DbPool, user_id: &str, range: DateRange) -> AppResult<Vec<ExpenseRecord>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, expense_date, amount, category FROM expense_logs
         WHERE user_id = ?1 AND expense_date >= ?2 AND expense_date <= ?3
         ORDER BY expense_date ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, range.start, range.end], |row| {
        Ok(ExpenseRecord {
            id: row.get(0)?,
            expense_date: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pool() -> DbPool {
        init_conn(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn all_of_2024() -> DateRange {
        DateRange::new(d("2024-01-01"), d("2024-12-31"))
    }

    #[test]
    fn test_upsert_keeps_one_row_per_day() {
        let db = pool();
        let first = DailyObservation { weight: Some(200.0), steps: Some(5000.0), ..DailyObservation::new(d("2024-01-02")) };
        upsert_daily_log(&db, "u1", &first).unwrap();
        let second = DailyObservation { weight: Some(199.5), ..DailyObservation::new(d("2024-01-02")) };
        upsert_daily_log(&db, "u1", &second).unwrap();

        let logs = get_daily_observations(&db, "u1", all_of_2024()).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].weight, Some(199.5));
        assert_eq!(logs[0].steps, None, "upsert replaces the whole check-in");
    }

    #[test]
    fn test_daily_logs_are_ascending_and_scoped() {
        let db = pool();
        for (date, w) in [("2024-01-05", 3.0), ("2024-01-01", 1.0), ("2024-01-03", 2.0), ("2023-12-31", 0.0)] {
            let obs = DailyObservation { weight: Some(w), ..DailyObservation::new(d(date)) };
            upsert_daily_log(&db, "u1", &obs).unwrap();
        }
        upsert_daily_log(&db, "u2", &DailyObservation::new(d("2024-01-02"))).unwrap();

        let logs = get_daily_observations(&db, "u1", all_of_2024()).unwrap();
        let dates: Vec<_> = logs.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![d("2024-01-01"), d("2024-01-03"), d("2024-01-05")]);
    }

    #[test]
    fn test_nulls_round_trip_as_absent() {
        let db = pool();
        let obs = DailyObservation {
            meditation_minutes: Some(0.0),
            weight_training: true,
            ..DailyObservation::new(d("2024-02-02"))
        };
        upsert_daily_log(&db, "u1", &obs).unwrap();
        let got = get_daily_log(&db, "u1", d("2024-02-02")).unwrap().unwrap();
        assert_eq!(got, obs);
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let db = pool();
        let bad = DailyObservation { steps: Some(-1.0), ..DailyObservation::new(d("2024-01-01")) };
        assert!(matches!(upsert_daily_log(&db, "u1", &bad), Err(AppError::InvalidInput(_))));

        let nan = IncomeRecord::new(d("2024-01-01"), f64::NAN, IncomeType::Labor, "x");
        assert!(matches!(insert_income(&db, "u1", &nan), Err(AppError::InvalidInput(_))));

        let no_source = IncomeRecord::new(d("2024-01-01"), 10.0, IncomeType::Labor, "  ");
        assert!(matches!(insert_income(&db, "u1", &no_source), Err(AppError::InvalidInput(_))));

        let ok = DailyObservation::new(d("2024-01-01"));
        assert!(matches!(upsert_daily_log(&db, "", &ok), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_income_round_trip_in_date_order() {
        let db = pool();
        let late = IncomeRecord::new(d("2024-03-01"), 20.0, IncomeType::Passive, "dividends");
        let early = IncomeRecord::new(d("2024-01-15"), 1000.0, IncomeType::Labor, "salary");
        insert_income(&db, "u1", &late).unwrap();
        insert_income(&db, "u1", &early).unwrap();

        let rows = get_income(&db, "u1", all_of_2024()).unwrap();
        assert_eq!(rows, vec![early, late]);
    }

    #[test]
    fn test_journal_upsert() {
        let db = pool();
        let day = d("2024-04-04");
        upsert_journal(&db, "u1", &JournalRecord { date: day, content: "first draft".into() }).unwrap();
        upsert_journal(&db, "u1", &JournalRecord { date: day, content: "final words here".into() }).unwrap();
        let entries = get_journal(&db, "u1", all_of_2024()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "final words here");
    }

    #[test]
    fn test_expenses_scoped_to_range() {
        let db = pool();
        let inside = ExpenseRecord { id: "a".into(), expense_date: d("2024-06-01"), amount: 9.99, category: "food".into() };
        let outside = ExpenseRecord { id: "b".into(), expense_date: d("2025-01-01"), amount: 1.0, category: "food".into() };
        insert_expense(&db, "u1", &inside).unwrap();
        insert_expense(&db, "u1", &outside).unwrap();
        assert_eq!(get_expenses(&db, "u1", all_of_2024()).unwrap(), vec![inside]);
    }
}
