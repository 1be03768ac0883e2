use crate::errors::{AppError, AppResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub dashboard_dir: PathBuf,
    /// Window used when a request gives neither `startDate`/`endDate` nor `days`.
    pub default_window_days: u32,
    /// Upper bound on any requested window.
    pub max_window_days: u32,
    /// Trailing window for moving-average series.
    pub moving_average_window: usize,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("SERVER_PORT: {e}")))?;

        let default_window_days = env_var_or("DEFAULT_WINDOW_DAYS", "30")
            .parse::<u32>()
            .map_err(|e| AppError::Config(format!("DEFAULT_WINDOW_DAYS: {e}")))?;

        let max_window_days = env_var_or("MAX_WINDOW_DAYS", "366")
            .parse::<u32>()
            .map_err(|e| AppError::Config(format!("MAX_WINDOW_DAYS: {e}")))?;

        let moving_average_window = env_var_or("MOVING_AVERAGE_WINDOW", "7")
            .parse::<usize>()
            .map_err(|e| AppError::Config(format!("MOVING_AVERAGE_WINDOW: {e}")))?;

        if moving_average_window == 0 {
            return Err(AppError::Config("MOVING_AVERAGE_WINDOW must be at least 1".into()));
        }
        if default_window_days > max_window_days {
            return Err(AppError::Config(format!(
                "DEFAULT_WINDOW_DAYS ({default_window_days}) exceeds MAX_WINDOW_DAYS ({max_window_days})"
            )));
        }

        Ok(Self {
            server_port,
            data_dir: PathBuf::from(env_var_or("DATA_DIR", "data")),
            dashboard_dir: PathBuf::from(env_var_or("DASHBOARD_DIR", "dashboard/dist")),
            default_window_days,
            max_window_days,
            moving_average_window,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            data_dir: PathBuf::from("data"),
            dashboard_dir: PathBuf::from("dashboard/dist"),
            default_window_days: 30,
            max_window_days: 366,
            moving_average_window: 7,
        }
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
