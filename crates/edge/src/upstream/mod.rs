mod gateway;
mod vision;

pub(crate) use gateway::HttpChatGateway;
pub(crate) use vision::OpenAiVision;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use reqwest::{Response, StatusCode};
use std::pin::Pin;
use std::time::Duration;
use veritas_protocol::WireMessage;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub(crate) type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum UpstreamError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("upstream rate limit exceeded")]
    RateLimited,
    #[error("upstream requires payment")]
    PaymentRequired,
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream response missing content")]
    MissingContent,
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => UpstreamError::PaymentRequired,
            other => UpstreamError::Status {
                status: other.as_u16(),
                body,
            },
        }
    }
}

/// Hosted LLM that answers the assistant conversation as an SSE stream.
#[async_trait]
pub(crate) trait ChatGateway: Send + Sync {
    async fn stream_chat(&self, messages: Vec<WireMessage>) -> Result<ByteStream, UpstreamError>;
}

/// Vision model that describes a publicly reachable image.
#[async_trait]
pub(crate) trait VisionModel: Send + Sync {
    /// Returns the raw text of the model reply.
    async fn analyze_image(&self, image_url: &str) -> Result<String, UpstreamError>;
}

async fn ensure_success(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::from_status(status, body))
}

pub(crate) fn join_base_path(base: &str, path: &str) -> Result<String, UpstreamError> {
    if base.trim().is_empty() {
        return Err(UpstreamError::InvalidUrl("base_url is empty".to_string()));
    }
    let normalized_base = base.trim_end_matches('/');
    let normalized_path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    Ok(format!("{normalized_base}{normalized_path}"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_billing_statuses() {
        assert!(matches!(
            UpstreamError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            UpstreamError::RateLimited
        ));
        assert!(matches!(
            UpstreamError::from_status(StatusCode::PAYMENT_REQUIRED, String::new()),
            UpstreamError::PaymentRequired
        ));
        assert!(matches!(
            UpstreamError::from_status(StatusCode::BAD_GATEWAY, "oops".to_string()),
            UpstreamError::Status { status: 502, .. }
        ));
    }

    #[test]
    fn joins_paths() {
        assert_eq!(
            join_base_path("https://api.openai.com/", "v1/chat/completions").unwrap(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert!(join_base_path(" ", "/v1").is_err());
    }
}
