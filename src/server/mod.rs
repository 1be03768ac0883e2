pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    let dashboard = &state.config.dashboard_dir;
    let static_files = ServeDir::new(dashboard).fallback(ServeFile::new(dashboard.join("index.html")));

    Router::new()
        .route("/api/users/{user_id}/analytics", get(routes::get_analytics))
        .route("/api/users/{user_id}/series/{metric}", get(routes::get_metric_series))
        .route("/api/users/{user_id}/health", get(routes::get_health))
        .route("/api/users/{user_id}/mind", get(routes::get_mind))
        .route("/api/users/{user_id}/wealth", get(routes::get_wealth))
        .route("/api/users/{user_id}/expenses/summary", get(routes::get_expense_summary))
        .route(
            "/api/users/{user_id}/daily-log",
            get(routes::get_daily_log).post(routes::post_daily_log),
        )
        .route("/api/users/{user_id}/income", post(routes::post_income))
        .route("/api/users/{user_id}/journal", post(routes::post_journal))
        .route("/api/users/{user_id}/expenses", post(routes::post_expense))
        .route("/api/counters", get(routes::get_counters))
        .fallback_service(static_files)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let pool = db::init_conn(rusqlite::Connection::open_in_memory().unwrap()).unwrap();
        router(AppState::new(AppConfig::default(), pool))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_logged_weights_flow_into_analytics() {
        let app = app();
        let weights = [200.0, 199.0, 198.0, 197.0, 196.0, 195.0, 194.0, 193.0, 192.0, 191.0];
        for (i, w) in weights.iter().enumerate() {
            let body = serde_json::json!({ "date": format!("2024-01-{:02}", i + 1), "weight": w });
            let (status, _) = call(&app, Method::POST, "/api/users/u1/daily-log", Some(body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, json) = call(
            &app,
            Method::GET,
            "/api/users/u1/analytics?startDate=2024-01-01&endDate=2024-01-10",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        let weight = &json["data"]["analytics"]["weight"];
        assert_eq!(weight["data"].as_array().map(Vec::len), Some(10));
        assert_eq!(weight["data"][9]["movingAverage"], 194.0);
        assert_eq!(weight["summary"]["latest"], 191.0);
    }

    #[tokio::test]
    async fn test_income_buckets_over_http() {
        let app = app();
        for (amount, kind, date) in [(1000.0, "labor", "2024-01-15"), (500.0, "passive", "2024-01-20"), (2000.0, "labor", "2024-02-01")] {
            let body = serde_json::json!({ "amount": amount, "source": "acme", "incomeType": kind, "receivedDate": date });
            let (status, _) = call(&app, Method::POST, "/api/users/u1/income", Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, json) = call(
            &app,
            Method::GET,
            "/api/users/u1/analytics?startDate=2024-01-01&endDate=2024-02-28",
            None,
        )
        .await;
        let monthly = &json["data"]["analytics"]["income"]["monthly"];
        assert_eq!(monthly[0]["month"], "2024-01");
        assert_eq!(monthly[0]["total"], 1500.0);
        assert_eq!(monthly[1]["passive"], 0.0);
        let ytd = json["data"]["analytics"]["income"]["ytd"].as_array().cloned().unwrap_or_default();
        assert_eq!(ytd.last().map(|p| p["cumulative"].clone()), Some(serde_json::json!(3500.0)));
    }

    #[tokio::test]
    async fn test_metric_series_and_bad_metric() {
        let app = app();
        let body = serde_json::json!({ "date": "2024-05-01", "steps": 4000 });
        call(&app, Method::POST, "/api/users/u1/daily-log", Some(body)).await;

        let (status, json) = call(
            &app,
            Method::GET,
            "/api/users/u1/series/steps?startDate=2024-05-01&endDate=2024-05-31",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["trend"]["summary"]["sevenDayAverage"], 4000.0);

        let (status, json) = call(&app, Method::GET, "/api/users/u1/daily-log?date=2024-05-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["steps"], 4000.0);
        let (status, _) = call(&app, Method::GET, "/api/users/u1/daily-log?date=2024-05-02", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = call(&app, Method::GET, "/api/users/u1/series/heartbeat", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_rejects_negative_income_and_counts_failure() {
        let app = app();
        let body = serde_json::json!({ "amount": -5.0, "source": "acme", "receivedDate": "2024-01-01" });
        let (status, json) = call(&app, Method::POST, "/api/users/u1/income", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);

        let (_, counters) = call(&app, Method::GET, "/api/counters", None).await;
        assert_eq!(counters["data"]["requests_failed"], 1);
    }

    #[tokio::test]
    async fn test_malformed_input_uses_error_envelope() {
        let app = app();
        let body = serde_json::json!({ "amount": "lots", "source": "acme", "receivedDate": "2024-01-01" });
        let (status, json) = call(&app, Method::POST, "/api/users/u1/income", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());

        let (status, json) = call(&app, Method::GET, "/api/users/u1/analytics?days=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);

        // No JSON content type at all
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users/u1/journal")
            .body(Body::from("dear diary"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (_, counters) = call(&app, Method::GET, "/api/counters", None).await;
        assert_eq!(counters["data"]["requests_failed"], 3);
    }

    #[tokio::test]
    async fn test_panels_with_explicit_as_of() {
        let app = app();
        let body = serde_json::json!({ "date": "2024-03-20", "meditationMinutes": 20, "readingMinutes": 15 });
        call(&app, Method::POST, "/api/users/u1/daily-log", Some(body)).await;
        let body = serde_json::json!({ "date": "2024-03-20", "content": "  hello   world  " });
        let (_, journal) = call(&app, Method::POST, "/api/users/u1/journal", Some(body)).await;
        assert_eq!(journal["data"]["wordCount"], 2);

        let (status, mind) = call(&app, Method::GET, "/api/users/u1/mind?asOf=2024-03-20", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mind["data"]["clarity"]["rating"], 10);
        assert_eq!(mind["data"]["rituals"]["pm"], true);

        let (status, health) = call(&app, Method::GET, "/api/users/u1/health?asOf=2024-03-20", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(health["data"]["weight"]["latest"].is_null());

        let (status, _) = call(&app, Method::GET, "/api/users/u1/wealth?asOf=not-a-date", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expense_summary_over_http() {
        let app = app();
        for (amount, date) in [(12.5, "2024-03-02"), (100.0, "2024-01-10")] {
            let body = serde_json::json!({ "amount": amount, "category": "food", "expenseDate": date });
            let (status, _) = call(&app, Method::POST, "/api/users/u1/expenses", Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (_, json) = call(&app, Method::GET, "/api/users/u1/expenses/summary?asOf=2024-03-20", None).await;
        assert_eq!(json["data"]["monthly"], 12.5);
        assert_eq!(json["data"]["ytd"], 112.5);
    }
}
