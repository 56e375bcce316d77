use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::errors::{ErrorEnvelope, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match self {
            AppError::Service(error) => error,
            AppError::Internal(ref e) => {
                tracing::error!(error = ?e, "Internal error");
                ServiceError::internal("Internal server error")
            }
        };

        match error.category.log_level() {
            "error" => tracing::error!(code = %error.code, message = %error.message, "Request failed"),
            "warn" => tracing::warn!(code = %error.code, message = %error.message, "Request failed"),
            _ => tracing::info!(code = %error.code, message = %error.message, "Request failed"),
        }
        metrics::counter!(
            "errors_total",
            "category" => format!("{:?}", error.category),
            "code" => error.code.clone()
        )
        .increment(1);

        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorEnvelope::from(error))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
