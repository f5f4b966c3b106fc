//! Mapping from pipeline errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::NotificationError;

/// Handler error: a pipeline error, or a body that was not JSON at all.
#[derive(Debug)]
pub enum ApiError {
    Notification(NotificationError),
    InvalidJson(String),
}

impl From<NotificationError> for ApiError {
    fn from(e: NotificationError) -> Self {
        Self::Notification(e)
    }
}

/// HTTP status for each error category.
pub fn status_for(err: &NotificationError) -> StatusCode {
    match err {
        NotificationError::Validation(_) => StatusCode::BAD_REQUEST,
        NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
        NotificationError::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
        NotificationError::Forbidden(_) => StatusCode::FORBIDDEN,
        NotificationError::Delivery { .. } => StatusCode::BAD_GATEWAY,
        NotificationError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        NotificationError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
        NotificationError::StageOrder { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidJson(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "INVALID_JSON", "message": message})),
            )
                .into_response(),
            Self::Notification(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    error!(code = err.code(), error = %err, "Request failed");
                }
                let mut body = serde_json::json!({
                    "error": err.code(),
                    "message": err.to_string(),
                });
                if let NotificationError::Validation(v) = &err {
                    body["field"] = serde_json::json!(v.field());
                }
                (status, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, ForbiddenKind, NotFoundKind, RenderError, ValidationError};

    #[test]
    fn status_mapping() {
        let cases = [
            (
                NotificationError::Validation(ValidationError::MissingField { field: "ruleCode" }),
                StatusCode::BAD_REQUEST,
            ),
            (
                NotificationError::NotFound(NotFoundKind::Rule { code: "X".into() }),
                StatusCode::NOT_FOUND,
            ),
            (
                NotificationError::Render(RenderError::MissingVariable { name: "n".into() }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                NotificationError::Forbidden(ForbiddenKind::RecipientNotWhitelisted {
                    recipient: "a@b.c".into(),
                }),
                StatusCode::FORBIDDEN,
            ),
            (
                NotificationError::Delivery { reason: "down".into() },
                StatusCode::BAD_GATEWAY,
            ),
            (
                NotificationError::Persistence {
                    source: DatabaseError::Query("full".into()),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                NotificationError::Repository(DatabaseError::Query("offline".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }

    #[test]
    fn validation_response_names_field() {
        let response = ApiError::from(NotificationError::Validation(
            ValidationError::MissingField { field: "variables" },
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
