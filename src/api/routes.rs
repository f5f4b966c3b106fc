//! REST endpoints for previewing, sending and auditing notifications.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::config::CorsPolicy;
use crate::service::{NotificationRequest, NotificationService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: NotificationService,
}

/// Build the Axum router for the notification API.
pub fn notification_routes(service: NotificationService, cors: &CorsPolicy) -> Router {
    let state = AppState { service };

    let mut router = Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
        .route("/api/notifications/preview", post(preview))
        .route("/api/notifications/send", post(send))
        .route("/api/notifications/{id}", get(find_log))
        .with_state(state);

    if let Some(layer) = cors_layer(cors) {
        router = router.layer(layer);
    }
    router.layer(TraceLayer::new_for_http())
}

/// `None` when cross-origin access is disabled.
pub fn cors_layer(policy: &CorsPolicy) -> Option<CorsLayer> {
    let origin = match policy {
        CorsPolicy::Disabled => return None,
        CorsPolicy::AnyOrigin => AllowOrigin::from(Any),
        CorsPolicy::Origins(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(Duration::from_secs(3600)),
    )
}

// ── Health ──────────────────────────────────────────────────────────────

async fn ping() -> impl IntoResponse {
    Json(serde_json::json!({"ok": true}))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "notify-orchestrator"
    }))
}

// ── Notifications ───────────────────────────────────────────────────────

fn request_body(
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<NotificationRequest, ApiError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            debug!(error = %rejection, "Rejected request body");
            Err(ApiError::InvalidJson(rejection.body_text()))
        }
    }
}

async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = request_body(payload)?;
    let preview = state.service.preview(request).await?;
    Ok(Json(preview))
}

async fn send(
    State(state): State<AppState>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = request_body(payload)?;
    let sent = state.service.send(request).await?;
    Ok(Json(sent))
}

async fn find_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.service.find_log(&id).await? {
        Some(log) => Ok((StatusCode::OK, Json(serde_json::json!(log)))),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "LOG_NOT_FOUND",
                "message": format!("No notification log with id {id}"),
            })),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_disabled_has_no_layer() {
        assert!(cors_layer(&CorsPolicy::Disabled).is_none());
    }

    #[test]
    fn cors_enabled_policies_build_layers() {
        assert!(cors_layer(&CorsPolicy::AnyOrigin).is_some());
        assert!(
            cors_layer(&CorsPolicy::Origins(vec![
                "http://localhost:5173".into(),
                "bad\norigin".into(),
            ]))
            .is_some()
        );
    }
}
