use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use super::{ensure_success, join_base_path, UpstreamError, VisionModel};
use crate::config::{VisionConfig, OPENAI_API_KEY};
use crate::prompts::{vision_system_prompt, VISION_USER_PROMPT};

pub(crate) struct OpenAiVision {
    http: Client,
    url: String,
    model: String,
    temperature: f32,
    timeout: std::time::Duration,
    api_key: Option<String>,
}

impl OpenAiVision {
    pub(crate) fn new(
        http: Client,
        config: &VisionConfig,
        api_key: Option<String>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            http,
            url: join_base_path(&config.base_url, &config.chat_path)?,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout,
            api_key,
        })
    }

    fn request_body(&self, image_url: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": vision_system_prompt() },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": VISION_USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": image_url } }
                    ]
                }
            ],
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
        })
    }
}

#[async_trait]
impl VisionModel for OpenAiVision {
    async fn analyze_image(&self, image_url: &str) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured(OPENAI_API_KEY))?;
        let started = Instant::now();
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&self.request_body(image_url))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    UpstreamError::Timeout(self.timeout)
                } else {
                    UpstreamError::Transport(err)
                }
            })?;
        let response = ensure_success(response).await?;
        let value: Value = response.json().await?;
        info!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vision reply received"
        );
        message_content(&value)
            .map(str::to_string)
            .ok_or(UpstreamError::MissingContent)
    }
}

fn message_content(value: &Value) -> Option<&str> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/choices/0/text").and_then(Value::as_str))
        .map(str::trim)
        .filter(|content| !content.is_empty())
}
