use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};
use veritas_protocol::ErrorBody;

use crate::upstream::UpstreamError;

#[derive(Debug, thiserror::Error)]
pub(crate) enum EdgeError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Rate limits exceeded, please try again later.")]
    RateLimited,
    #[error("Payment required, please add funds.")]
    PaymentRequired,
    #[error("AI gateway error")]
    Gateway,
    #[error("{0}")]
    Internal(String),
}

impl From<UpstreamError> for EdgeError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::RateLimited => EdgeError::RateLimited,
            UpstreamError::PaymentRequired => EdgeError::PaymentRequired,
            UpstreamError::Status { .. } | UpstreamError::MissingContent => EdgeError::Gateway,
            other => EdgeError::Internal(other.to_string()),
        }
    }
}

impl EdgeError {
    fn status(&self) -> StatusCode {
        match self {
            EdgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EdgeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            EdgeError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            EdgeError::Gateway | EdgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = %status, error = %message, "request failed");
        } else {
            warn!(status = %status, error = %message, "request rejected");
        }
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_map_to_client_statuses() {
        assert_eq!(
            EdgeError::from(UpstreamError::RateLimited).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            EdgeError::from(UpstreamError::PaymentRequired).status(),
            StatusCode::PAYMENT_REQUIRED
        );
        let gateway = EdgeError::from(UpstreamError::Status {
            status: 503,
            body: "down".to_string(),
        });
        assert_eq!(gateway.to_string(), "AI gateway error");
        let missing = EdgeError::from(UpstreamError::NotConfigured("LOVABLE_API_KEY"));
        assert_eq!(missing.to_string(), "LOVABLE_API_KEY is not configured");
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
