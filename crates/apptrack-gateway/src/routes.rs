//! API route handlers for the gateway.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::server::AppState;

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "apptrack-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Run both reminder jobs now. Token already checked by middleware.
pub async fn trigger_reminders(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    tracing::info!("⚡ Reminder trigger received");

    let deadline_sent = match state.scheduler.run_deadline_reminders().await {
        Ok(n) => n,
        Err(e) => return run_failed("deadline", e),
    };
    let result_sent = match state.scheduler.run_result_reminders().await {
        Ok(n) => n,
        Err(e) => return run_failed("result", e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "message": format!(
                "Reminders processed: {deadline_sent} deadline, {result_sent} result"
            ),
            "deadline_reminders_sent": deadline_sent,
            "result_reminders_sent": result_sent,
        })),
    )
}

fn run_failed(
    which: &str,
    e: apptrack_core::AppTrackError,
) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!("❌ Triggered {which} reminder run failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "error": format!("{which} reminders failed: {e}"),
        })),
    )
}

/// Recent delivery outcomes (in-memory, newest last).
pub async fn reminder_history(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let history = state.scheduler.history();
    Json(serde_json::json!({
        "success": true,
        "count": history.len(),
        "outcomes": history,
    }))
}

#[cfg(test)]
mod tests {
    use crate::server::{AppState, TOKEN_HEADER, build_router};
    use apptrack_core::config::ReminderConfig;
    use apptrack_core::error::{AppTrackError, Result};
    use apptrack_core::traits::{ApplicationStore, NotificationSender};
    use apptrack_core::types::{
        Application, ApplicationStatus, DateField, NewApplication, RenderedMessage,
    };
    use apptrack_db::ApplicationDb;
    use apptrack_scheduler::ReminderScheduler;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const SECRET: &str = "s3cret-token";

    #[derive(Default)]
    struct CountingSender {
        subjects: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSender for CountingSender {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, _to: &str, message: &RenderedMessage) -> Result<()> {
            self.subjects.lock().unwrap().push(message.subject.clone());
            Ok(())
        }
    }

    struct DownStore;

    impl ApplicationStore for DownStore {
        fn find_by_date(
            &self,
            _field: DateField,
            _date: NaiveDate,
            _statuses: &[ApplicationStatus],
        ) -> Result<Vec<Application>> {
            Err(AppTrackError::Database("connection refused".into()))
        }
    }

    struct Fixture {
        db: Arc<ApplicationDb>,
        sender: Arc<CountingSender>,
        scheduler: Arc<ReminderScheduler>,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(ApplicationDb::in_memory().unwrap());
        let sender = Arc::new(CountingSender::default());
        let scheduler = Arc::new(ReminderScheduler::new(
            db.clone(),
            sender.clone(),
            "admin@example.com",
            ReminderConfig::default(),
        ));
        Fixture { db, sender, scheduler }
    }

    fn seed(f: &Fixture) {
        let today = f.scheduler.today();
        f.db.insert(
            &NewApplication::new("ACME Internship", "ACME", today)
                .with_status(ApplicationStatus::Applied)
                .with_result_date(today),
        )
        .unwrap();
    }

    async fn call(router: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_trigger_with_query_token() {
        let f = fixture();
        seed(&f);
        let router = build_router(AppState::new(f.scheduler.clone(), SECRET));

        let (status, body) = call(router, get(&format!("/reminders/trigger?token={SECRET}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["deadline_reminders_sent"], 1);
        assert_eq!(body["result_reminders_sent"], 1);
        assert!(body["message"].is_string());
        assert_eq!(f.sender.subjects.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trigger_post_with_header_token() {
        let f = fixture();
        seed(&f);
        let router = build_router(AppState::new(f.scheduler.clone(), SECRET));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/reminders/trigger")
            .header(TOKEN_HEADER, SECRET)
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deadline_reminders_sent"], 1);
    }

    #[tokio::test]
    async fn test_trigger_accepts_either_token_source() {
        let f = fixture();
        seed(&f);

        let stale_header = Request::builder()
            .uri(format!("/reminders/trigger?token={SECRET}"))
            .header(TOKEN_HEADER, "stale")
            .body(Body::empty())
            .unwrap();
        let router = build_router(AppState::new(f.scheduler.clone(), SECRET));
        let (status, _) = call(router, stale_header).await;
        assert_eq!(status, StatusCode::OK);

        let stale_query = Request::builder()
            .uri("/reminders/trigger?token=stale")
            .header(TOKEN_HEADER, SECRET)
            .body(Body::empty())
            .unwrap();
        let router = build_router(AppState::new(f.scheduler.clone(), SECRET));
        let (status, _) = call(router, stale_query).await;
        assert_eq!(status, StatusCode::OK);

        let both_wrong = Request::builder()
            .uri("/reminders/trigger?token=stale")
            .header(TOKEN_HEADER, "also-stale")
            .body(Body::empty())
            .unwrap();
        let router = build_router(AppState::new(f.scheduler.clone(), SECRET));
        let (status, _) = call(router, both_wrong).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_trigger_rejects_wrong_or_missing_token() {
        let f = fixture();
        seed(&f);

        for uri in [
            "/reminders/trigger",
            "/reminders/trigger?token=wrong",
            "/reminders/trigger?token=",
            "/reminders/trigger?token=s3cret-token-extra",
        ] {
            let router = build_router(AppState::new(f.scheduler.clone(), SECRET));
            let (status, body) = call(router, get(uri)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "uri: {uri}");
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }
        assert!(f.sender.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_disabled_without_secret() {
        let f = fixture();
        seed(&f);
        let router = build_router(AppState::new(f.scheduler.clone(), ""));

        let (status, _) = call(router, get("/reminders/trigger?token=")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(f.sender.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_store_failure_is_structured() {
        let scheduler = Arc::new(ReminderScheduler::new(
            Arc::new(DownStore),
            Arc::new(CountingSender::default()),
            "admin@example.com",
            ReminderConfig::default(),
        ));
        let router = build_router(AppState::new(scheduler, SECRET));

        let (status, body) = call(router, get(&format!("/reminders/trigger?token={SECRET}"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_history_requires_token() {
        let f = fixture();
        seed(&f);
        let state = Arc::new(AppState::new(f.scheduler.clone(), SECRET));
        let router = crate::server::build_router_from_arc(state);

        let (status, _) = call(router.clone(), get("/reminders/history")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        call(router.clone(), get(&format!("/reminders/trigger?token={SECRET}"))).await;
        let (status, body) = call(router, get(&format!("/reminders/history?token={SECRET}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let f = fixture();
        let router = build_router(AppState::new(f.scheduler.clone(), SECRET));
        let (status, body) = call(router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
