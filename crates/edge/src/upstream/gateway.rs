use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};
use veritas_protocol::WireMessage;

use super::{ensure_success, join_base_path, BoxError, ByteStream, ChatGateway, UpstreamError};
use crate::config::{GatewayConfig, LOVABLE_API_KEY};

pub(crate) struct HttpChatGateway {
    http: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    connect_timeout: std::time::Duration,
}

impl HttpChatGateway {
    pub(crate) fn new(
        http: Client,
        config: &GatewayConfig,
        api_key: Option<String>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            http,
            url: join_base_path(&config.base_url, &config.chat_path)?,
            model: config.model.clone(),
            api_key,
            connect_timeout: config.connect_timeout,
        })
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn stream_chat(&self, messages: Vec<WireMessage>) -> Result<ByteStream, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured(LOVABLE_API_KEY))?;
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        info!(
            url = %self.url,
            model = %self.model,
            messages = messages.len(),
            "gateway request start"
        );

        let started = Instant::now();
        let send = self.http.post(&self.url).bearer_auth(api_key).json(&body).send();
        let response = tokio::time::timeout(self.connect_timeout, send)
            .await
            .map_err(|_| UpstreamError::Timeout(self.connect_timeout))??;
        let response = ensure_success(response).await.map_err(|err| {
            warn!(error = %err, "gateway request rejected");
            err
        })?;
        info!(
            status = %response.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gateway stream open"
        );

        let stream = response
            .bytes_stream()
            .map_err(|err| Box::new(err) as BoxError);
        Ok(Box::pin(stream))
    }
}
