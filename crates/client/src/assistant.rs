use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use std::fmt::Display;
use tracing::{debug, warn};
use veritas_protocol::sse::{Progress, SseAssembler};
use veritas_protocol::{Language, VoiceAssistantRequest, WireMessage, VOICE_ASSISTANT_PATH};

use crate::join_base_path;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,
    #[error("Service credits exhausted. Please try again later.")]
    CreditsExhausted,
    #[error("Failed to connect to assistant")]
    Connection {
        status: Option<u16>,
        detail: String,
    },
    #[error("Connection to assistant was interrupted: {0}")]
    Interrupted(String),
}

impl AssistantError {
    fn connection(detail: impl Into<String>) -> Self {
        AssistantError::Connection {
            status: None,
            detail: detail.into(),
        }
    }
}

/// Anything that can answer a conversation with one assistant reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(
        &self,
        messages: &[WireMessage],
        language: Language,
    ) -> Result<String, AssistantError>;
}

/// Talks to the voice-assistant edge function.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    endpoint: String,
    publishable_key: String,
}

impl AssistantClient {
    pub fn new(http: Client, functions_url: &str, publishable_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: join_base_path(functions_url, VOICE_ASSISTANT_PATH),
            publishable_key: publishable_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts the conversation and returns the fully assembled reply text.
    pub async fn stream_chat(
        &self,
        messages: &[WireMessage],
        language: Language,
    ) -> Result<String, AssistantError> {
        let body = VoiceAssistantRequest {
            messages: messages.to_vec(),
            language: Some(language.code().to_string()),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.publishable_key)
            .header("apikey", &self.publishable_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AssistantError::connection(err.to_string()))?;
        check_status(response.status().as_u16())?;
        debug!(endpoint = %self.endpoint, "assistant stream opened");
        read_event_stream(response.bytes_stream()).await
    }
}

#[async_trait]
impl ChatBackend for AssistantClient {
    async fn reply(
        &self,
        messages: &[WireMessage],
        language: Language,
    ) -> Result<String, AssistantError> {
        self.stream_chat(messages, language).await
    }
}

pub fn check_status(status: u16) -> Result<(), AssistantError> {
    match status {
        200..=299 => Ok(()),
        429 => Err(AssistantError::RateLimited),
        402 => Err(AssistantError::CreditsExhausted),
        other => Err(AssistantError::Connection {
            status: Some(other),
            detail: format!("unexpected status {other}"),
        }),
    }
}

/// Drains an SSE byte stream into the reply text, stopping at `[DONE]`.
pub async fn read_event_stream<S, E>(stream: S) -> Result<String, AssistantError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    futures_util::pin_mut!(stream);
    let mut assembler = SseAssembler::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| AssistantError::Interrupted(err.to_string()))?;
        if assembler.push(&chunk) == Progress::Done {
            break;
        }
    }
    let assembled = assembler.finish();
    if assembled.discarded_bytes > 0 {
        warn!(
            discarded_bytes = assembled.discarded_bytes,
            "assistant stream ended with an incomplete event"
        );
    }
    Ok(assembled.content)
}
