use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use veritas_protocol::{FacialRecognitionRequest, FacialRecognitionResponse};
use veritas_scanner::parse_assessment;

use super::parse_body;
use crate::cache::AnalysisCache;
use crate::error::EdgeError;
use crate::state::AppState;
use crate::upstream::UpstreamError;

const FALLBACK_ANALYSIS: &str =
    "Automated analysis is unavailable right now. Treat this image with caution and verify it manually.";

pub(crate) async fn facial_recognition(
    State(state): State<AppState>,
    payload: Result<Json<FacialRecognitionRequest>, JsonRejection>,
) -> Result<Json<FacialRecognitionResponse>, EdgeError> {
    let request = parse_body(payload)?;
    let image_url = validate_image_url(&request.image_url)?;

    let response = match state.vision.analyze_image(image_url).await {
        Ok(content) => classify_reply(&content),
        Err(err @ (UpstreamError::Status { .. } | UpstreamError::MissingContent)) => {
            warn!(error = %err, "vision reply unusable, returning fallback");
            FacialRecognitionResponse::fallback(FALLBACK_ANALYSIS, err.to_string())
        }
        Err(err) => return Err(err.into()),
    };
    info!(
        risk_level = %response.risk_level,
        fallback = response.is_fallback(),
        confidence = ?response.confidence_score,
        "image analyzed"
    );

    if let Some(cache) = &state.cache {
        tokio::spawn(record_analysis(
            Arc::clone(cache),
            state.cache_timeout,
            image_url.to_string(),
            response.clone(),
        ));
    }
    Ok(Json(response))
}

/// Runs detached from the request; failures and stalls are only logged.
async fn record_analysis(
    cache: Arc<dyn AnalysisCache>,
    timeout: Duration,
    image_url: String,
    response: FacialRecognitionResponse,
) {
    match tokio::time::timeout(timeout, cache.record(&image_url, &response)).await {
        Ok(Ok(())) => debug!(image_url = %image_url, "image analysis cached"),
        Ok(Err(err)) => warn!(error = %err, "failed to cache image analysis"),
        Err(_) => warn!(timeout = ?timeout, "caching image analysis timed out"),
    }
}

fn validate_image_url(raw: &str) -> Result<&str, EdgeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EdgeError::BadRequest("imageUrl is required".to_string()));
    }
    let url = Url::parse(trimmed)
        .map_err(|err| EdgeError::BadRequest(format!("imageUrl is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EdgeError::BadRequest(
            "imageUrl must use http or https".to_string(),
        ));
    }
    Ok(trimmed)
}

fn classify_reply(content: &str) -> FacialRecognitionResponse {
    match parse_assessment(content) {
        Ok(assessment) => FacialRecognitionResponse::assessed(
            assessment.analysis,
            assessment.risk_level,
            assessment.confidence_score,
        ),
        Err(err) => {
            warn!(error = %err, "vision reply did not follow the verdict format");
            let analysis = match content.trim() {
                "" => FALLBACK_ANALYSIS,
                text => text,
            };
            FacialRecognitionResponse::fallback(analysis, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_protocol::RiskLevel;

    #[test]
    fn validates_image_urls() {
        assert_eq!(
            validate_image_url(" https://cdn.example/p.jpg ").unwrap(),
            "https://cdn.example/p.jpg"
        );
        assert!(validate_image_url("").is_err());
        assert!(validate_image_url("not a url").is_err());
        assert!(validate_image_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn prose_reply_falls_back_to_medium() {
        let response = classify_reply("Looks like high risk.");
        assert_eq!(response.risk_level, RiskLevel::Medium);
        assert!(response.is_fallback());
        assert_eq!(response.analysis, "Looks like high risk.");
        assert!(response.error.is_some());
    }

    #[test]
    fn structured_reply_is_used_as_is() {
        let response = classify_reply(r#"{"riskLevel":"low","analysis":"Natural photo","confidence":70}"#);
        assert_eq!(response.risk_level, RiskLevel::Low);
        assert_eq!(response.confidence_score, Some(70));
        assert!(!response.is_fallback());
    }
}
