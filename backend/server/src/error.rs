use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use store::StoreError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        source: StoreError,
    },

    #[error("Webhook URL not configured")]
    WebhookNotConfigured,

    #[error("Failed to send to Discord")]
    DownstreamSendFailed(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Tags a store failure with what the handler was doing.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Store { context, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Store { .. }
            | AppError::WebhookNotConfigured
            | AppError::DownstreamSendFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            AppError::Store { context, source } => {
                error!("{context}: {source}");
                ErrorBody {
                    error: context.to_string(),
                    details: Some(source.to_string()),
                }
            }
            AppError::DownstreamSendFailed(ref reason) => {
                error!("Discord webhook failed: {reason}");
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                }
            }
            AppError::WebhookNotConfigured => {
                error!("DISCORD_WEBHOOK_URL not configured");
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
