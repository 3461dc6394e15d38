use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod sse;

pub const VOICE_ASSISTANT_PATH: &str = "/functions/v1/voice-assistant";
pub const FACIAL_RECOGNITION_PATH: &str = "/functions/v1/facial-recognition";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A conversation entry as held by a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// The `{role, content}` shape exchanged with the edge function and the
/// upstream chat-completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: ChatRole,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnglishUs,
    #[serde(rename = "hi-IN")]
    Hindi,
    #[serde(rename = "kn-IN")]
    Kannada,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::EnglishUs, Language::Hindi, Language::Kannada];

    pub fn code(self) -> &'static str {
        match self {
            Language::EnglishUs => "en-US",
            Language::Hindi => "hi-IN",
            Language::Kannada => "kn-IN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::EnglishUs => "English",
            Language::Hindi => "Hindi",
            Language::Kannada => "Kannada",
        }
    }

    pub fn native_label(self) -> &'static str {
        match self {
            Language::EnglishUs => "English",
            Language::Hindi => "हिंदी",
            Language::Kannada => "ಕನ್ನಡ",
        }
    }

    /// Primary language subtag, e.g. `kn` for `kn-IN`.
    pub fn primary_subtag(self) -> &'static str {
        self.code().split('-').next().unwrap_or("en")
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_code(value).ok_or_else(|| {
            format!("unsupported language {value}; expected one of en-US, hi-IN, kn-IN")
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceAssistantRequest {
    pub messages: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl VoiceAssistantRequest {
    /// Requested language; unknown or missing codes fall back to the default.
    pub fn language(&self) -> Language {
        self.language
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("risk must be low|medium|high, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacialRecognitionRequest {
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacialRecognitionResponse {
    pub analysis: String,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fallback: Option<bool>,
}

impl FacialRecognitionResponse {
    pub fn assessed(
        analysis: impl Into<String>,
        risk_level: RiskLevel,
        confidence_score: Option<u8>,
    ) -> Self {
        Self {
            analysis: analysis.into(),
            risk_level,
            confidence_score,
            error: None,
            is_fallback: None,
        }
    }

    /// Medium-risk placeholder returned when the model reply cannot be used.
    pub fn fallback(analysis: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            analysis: analysis.into(),
            risk_level: RiskLevel::Medium,
            confidence_score: None,
            error: Some(error.into()),
            is_fallback: Some(true),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
