use std::fmt;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// External data feed a provider error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Weather,
    Gdp,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Weather => "weather",
            Feed::Gdp => "GDP",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a weather or economic provider call. The display text is what
/// ends up in the user-facing summary. A payload that does not parse reads
/// as missing data there; its parser reason is only logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Failed to fetch {feed} data: {status}")]
    Http { feed: Feed, status: u16 },

    #[error("No {feed} data available")]
    NoData { feed: Feed },

    #[error("No {feed} data available")]
    Data { feed: Feed, reason: String },

    #[error("Failed to fetch {feed} data: {reason}")]
    Transport { feed: Feed, reason: String },
}

impl ProviderError {
    pub fn feed(&self) -> Feed {
        match self {
            ProviderError::Http { feed, .. }
            | ProviderError::NoData { feed }
            | ProviderError::Data { feed, .. }
            | ProviderError::Transport { feed, .. } => *feed,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Http { .. } => "http_status",
            ProviderError::NoData { .. } => "no_data",
            ProviderError::Data { .. } => "malformed_payload",
            ProviderError::Transport { .. } => "transport",
        }
    }

    /// The request URL is stripped since it carries the provider API key.
    pub(crate) fn transport(feed: Feed, err: reqwest::Error) -> Self {
        let err = err.without_url();
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };
        ProviderError::Transport { feed, reason }
    }

    pub(crate) fn data(feed: Feed, err: impl fmt::Display) -> Self {
        ProviderError::Data {
            feed,
            reason: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Undecodable request bodies get the same JSON error shape as any other
/// validation failure.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => {
                tracing::warn!(error = %msg, "Rejected request");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
