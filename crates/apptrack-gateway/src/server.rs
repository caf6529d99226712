//! HTTP server implementation using Axum.

use std::collections::HashMap;
use std::sync::Arc;

use apptrack_core::config::GatewayConfig;
use apptrack_scheduler::ReminderScheduler;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

/// Header carrying the cron secret, as an alternative to `?token=`.
pub const TOKEN_HEADER: &str = "X-Cron-Token";

/// Shared state for the gateway server.
pub struct AppState {
    pub scheduler: Arc<ReminderScheduler>,
    /// Shared secret for the trigger endpoint. Empty means the endpoint is disabled.
    pub cron_secret: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(scheduler: Arc<ReminderScheduler>, cron_secret: impl Into<String>) -> Self {
        Self {
            scheduler,
            cron_secret: cron_secret.into(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Whether `supplied` exactly matches the configured secret.
    pub fn token_matches(&self, supplied: Option<&str>) -> bool {
        !self.cron_secret.is_empty() && supplied == Some(self.cron_secret.as_str())
    }
}

/// Tokens supplied in the `X-Cron-Token` header and the `?token=` query.
fn supplied_tokens(req: &Request) -> Vec<String> {
    let mut tokens = Vec::new();
    if let Some(value) = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        tokens.push(value.to_string());
    }
    if let Some(value) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(params)| params.get("token").cloned())
    {
        tokens.push(value);
    }
    tokens
}

/// Cron token middleware — rejects with 403 before any reminder logic runs.
async fn require_cron_token(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.cron_secret.is_empty() {
        tracing::warn!("⚠️ Trigger request rejected: no cron secret configured (set CRON_SECRET_TOKEN)");
    } else if supplied_tokens(&req)
        .iter()
        .any(|t| state.token_matches(Some(t.as_str())))
    {
        return next.run(req).await;
    } else {
        tracing::warn!("🚫 Trigger request rejected: invalid or missing token ({})", req.uri().path());
    }

    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({
            "success": false,
            "error": "Forbidden — invalid or missing token",
        })),
    )
        .into_response()
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    // Protected routes — require the cron secret
    let protected = Router::new()
        .route(
            "/reminders/trigger",
            get(super::routes::trigger_reminders).post(super::routes::trigger_reminders),
        )
        .route("/reminders/history", get(super::routes::reminder_history))
        .layer(axum::middleware::from_fn_with_state(
            shared.clone(),
            require_cron_token,
        ));

    // Public routes
    let public = Router::new().route("/health", get(super::routes::health_check));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Bind and serve until the process exits.
pub async fn start_server(state: AppState, config: &GatewayConfig) -> anyhow::Result<()> {
    if state.cron_secret.is_empty() {
        tracing::warn!("⚠️ No cron secret configured — /reminders/trigger will reject every request");
    }

    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
