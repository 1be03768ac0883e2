use crate::config::AppConfig;
use crate::db::DbPool;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Request counters (lock-free) ──

pub struct RequestCounters {
    pub analytics_served: AtomicU64,
    pub panels_served: AtomicU64,
    pub rows_loaded: AtomicU64,
    pub writes_accepted: AtomicU64,
    pub requests_failed: AtomicU64,
}

impl RequestCounters {
    pub fn new() -> Self {
        Self {
            analytics_served: AtomicU64::new(0),
            panels_served: AtomicU64::new(0),
            rows_loaded: AtomicU64::new(0),
            writes_accepted: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn add_rows(&self, n: usize) {
        self.rows_loaded.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        use Ordering::Relaxed;
        CounterSnapshot {
            analytics_served: self.analytics_served.load(Relaxed),
            panels_served: self.panels_served.load(Relaxed),
            rows_loaded: self.rows_loaded.load(Relaxed),
            writes_accepted: self.writes_accepted.load(Relaxed),
            requests_failed: self.requests_failed.load(Relaxed),
        }
    }
}

impl Default for RequestCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CounterSnapshot {
    pub analytics_served: u64,
    pub panels_served: u64,
    pub rows_loaded: u64,
    pub writes_accepted: u64,
    pub requests_failed: u64,
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub counters: RequestCounters,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            counters: RequestCounters::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_snapshot() {
        let c = RequestCounters::new();
        c.add_rows(12);
        c.add_rows(3);
        c.writes_accepted.fetch_add(1, Ordering::Relaxed);
        let snap = c.snapshot();
        assert_eq!(snap.rows_loaded, 15);
        assert_eq!(snap.writes_accepted, 1);
        assert_eq!(snap.analytics_served, 0);
    }
}
