use serde::Deserialize;
use veritas_protocol::RiskLevel;

/// What the vision model is instructed to reply with.
pub const ASSESSMENT_FORMAT: &str = r#"{"riskLevel": "low" | "medium" | "high", "analysis": "<short explanation>", "confidence": <0-100>}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAssessment {
    #[serde(alias = "risk", alias = "risk_level")]
    risk_level: String,
    #[serde(default, alias = "reason")]
    analysis: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAssessment {
    pub risk_level: RiskLevel,
    pub analysis: String,
    pub confidence_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error("model reply is empty")]
    Empty,
    #[error("model reply is not valid JSON: {0}")]
    Malformed(String),
    #[error("{0}")]
    UnknownRisk(String),
}

/// Parses the structured verdict out of a model reply.
///
/// The reply may wrap the JSON object in prose or a code fence; the outermost
/// `{...}` block is used.
pub fn parse_assessment(content: &str) -> Result<ImageAssessment, AssessmentError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AssessmentError::Empty);
    }
    let payload = extract_json_block(content).unwrap_or(content);
    let parsed: ModelAssessment =
        serde_json::from_str(payload).map_err(|err| AssessmentError::Malformed(err.to_string()))?;
    let risk_level = parsed
        .risk_level
        .parse::<RiskLevel>()
        .map_err(AssessmentError::UnknownRisk)?;
    let analysis = parsed
        .analysis
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| format!("Assessed as {risk_level} risk."));
    Ok(ImageAssessment {
        risk_level,
        analysis,
        confidence_score: parsed.confidence.map(normalize_confidence),
    })
}

fn extract_json_block(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&input[start..=end])
}

fn normalize_confidence(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
