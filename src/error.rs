use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::annotations::{model::ValidationErrors, store::StoreError};

/// Errors a handler can return. Every variant renders as a
/// `{ "success": false, ... }` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("annotation not found")]
    NotFound,

    /// Path id that is not a UUID. Answered like a missing record.
    #[error("invalid annotation id")]
    InvalidId,

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// `action` names what was being done ("creating annotation"); `cause`
    /// is logged and never sent to the caller.
    #[error("internal error while {action}: {cause}")]
    Internal {
        action: &'static str,
        cause: anyhow::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn from_store(err: StoreError, action: &'static str) -> Self {
        match err {
            StoreError::Validation(errors) => AppError::Validation(errors),
            StoreError::NotFound => AppError::NotFound,
            StoreError::Unexpected(cause) => AppError::Internal { action, cause },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound | AppError::InvalidId => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(errors) => json!({
                "success": false,
                "errors": errors,
            }),
            AppError::NotFound => json!({
                "success": false,
                "message": "Annotation not found",
            }),
            AppError::InvalidId => json!({
                "success": false,
                "message": "Invalid annotation ID",
            }),
            AppError::Unauthorized(msg) => json!({
                "success": false,
                "message": msg,
            }),
            AppError::Internal { action, cause } => {
                tracing::error!(error = ?cause, action = *action, "internal error");
                json!({
                    "success": false,
                    "message": format!("Server error while {action}"),
                })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn validation_lists_field_errors() {
        let mut errors = ValidationErrors::default();
        errors.push("x", "X coordinate must be a number");
        errors.push("width", "Width must be at least 1");
        let (status, body) = body_json(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["field"], "x");
        assert_eq!(body["errors"][1]["message"], "Width must be at least 1");
    }

    #[tokio::test]
    async fn not_found_and_invalid_id_share_status() {
        let (a, body_a) = body_json(AppError::NotFound).await;
        let (b, body_b) = body_json(AppError::InvalidId).await;
        assert_eq!(a, StatusCode::NOT_FOUND);
        assert_eq!(b, StatusCode::NOT_FOUND);
        assert_eq!(body_a["message"], "Annotation not found");
        assert_eq!(body_b["message"], "Invalid annotation ID");
    }

    #[tokio::test]
    async fn internal_errors_hide_their_source() {
        let err = AppError::from_store(
            StoreError::Unexpected(anyhow::anyhow!("connection refused on 10.0.0.7")),
            "creating annotation",
        );
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error while creating annotation");
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    #[test]
    fn store_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            AppError::from_store(StoreError::NotFound, "fetching annotation"),
            AppError::NotFound
        ));
        let errors = ValidationErrors::single("height", "Height must be at least 1");
        assert!(matches!(
            AppError::from_store(StoreError::Validation(errors), "updating annotation"),
            AppError::Validation(_)
        ));
    }
}
