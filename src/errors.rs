use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// An upstream API rejected the call. Carries the upstream status (when
    /// one was received) and the raw upstream payload or transport message.
    Upstream {
        status: Option<u16>,
        body: Value,
    },
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Internal server error.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Upstream { status, body } => match status {
                Some(code) => write!(f, "Upstream error {}: {}", code, body),
                None => write!(f, "Upstream error: {}", body),
            },
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Upstream failures are relayed with the upstream's own status when one
    /// exists (500 otherwise) and the raw upstream payload under `error`,
    /// so callers see exactly what the third-party API said.
    fn into_response(self) -> Response {
        match self {
            AppError::Upstream { status, body } => {
                tracing::error!("Upstream error ({:?}): {}", status, body);
                let code = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (code, Json(json!({ "error": body }))).into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a transport-level `reqwest::Error` into an `AppError`,
    /// preserving the response status when the error carries one.
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            body: Value::String(err.to_string()),
        }
    }
}

impl AppError {
    /// Builds an `Upstream` error from a non-success response, exposing the
    /// upstream body as JSON when it parses, or as a plain string otherwise.
    pub async fn from_upstream_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        AppError::Upstream {
            status: Some(status),
            body: read_error_body(response).await,
        }
    }
}

/// Reads a response body as JSON, falling back to the raw text (or a
/// placeholder) when the body is not valid JSON.
pub async fn read_error_body(response: reqwest::Response) -> Value {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(_) => Value::String("Unknown error".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_includes_status() {
        let err = AppError::Upstream {
            status: Some(502),
            body: serde_json::json!({"message": "bad gateway"}),
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn upstream_display_without_status() {
        let err = AppError::Upstream {
            status: None,
            body: Value::String("connection refused".into()),
        };
        assert!(err.to_string().contains("connection refused"));
    }
}
