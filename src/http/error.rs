//! HTTP-layer errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced while handling one request.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// Classification or search call to the commerce backend failed.
    #[error("Backend request failed: {0}")]
    Backend(#[from] BackendError),

    /// The page renderer could not be reached.
    #[error("Renderer request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// A redirect or rewrite target could not be turned into a URI/header.
    #[error("Invalid rewrite target: {0}")]
    InvalidRewrite(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::Backend(_) | EdgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            EdgeError::InvalidRewrite(_) | EdgeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, error = %self, "Request failed");
        (status, status.canonical_reason().unwrap_or("Error")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = EdgeError::from(BackendError::Status(500));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Backend request failed: Backend returned HTTP 500");

        let err = EdgeError::InvalidRewrite("bad".into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_response_body_is_reason_phrase() {
        use http_body_util::BodyExt;

        let response = EdgeError::from(BackendError::Timeout(10)).into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Bad Gateway");
    }
}
