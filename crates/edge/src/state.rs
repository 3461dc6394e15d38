use anyhow::Context;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use veritas_supabase::{Credentials, RestClient};

use crate::cache::{AnalysisCache, SupabaseAnalysisCache};
use crate::config::{EdgeConfig, Secrets};
use crate::upstream::{ChatGateway, HttpChatGateway, OpenAiVision, VisionModel};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: Arc<dyn ChatGateway>,
    pub(crate) vision: Arc<dyn VisionModel>,
    pub(crate) cache: Option<Arc<dyn AnalysisCache>>,
    pub(crate) cache_timeout: Duration,
    /// Cancelled on shutdown; open assistant streams end when it fires.
    pub(crate) shutdown: CancellationToken,
}

pub(crate) fn build_app_state(
    config: &EdgeConfig,
    secrets: Secrets,
    shutdown: CancellationToken,
) -> anyhow::Result<AppState> {
    let http = Client::builder()
        .user_agent(concat!("veritas-edge/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")?;

    let gateway = HttpChatGateway::new(http.clone(), &config.gateway, secrets.lovable_api_key)
        .context("invalid gateway config")?;
    let vision = OpenAiVision::new(http.clone(), &config.vision, secrets.openai_api_key)
        .context("invalid vision config")?;

    let cache = match (
        config.cache.enabled,
        secrets.supabase_url,
        secrets.supabase_service_role_key,
    ) {
        (true, Some(url), Some(key)) => {
            info!(table = %config.cache.table, "analysis cache enabled");
            let rest = RestClient::new(http, Credentials::new(url, key));
            Some(Arc::new(SupabaseAnalysisCache::new(rest, config.cache.table.clone()))
                as Arc<dyn AnalysisCache>)
        }
        _ => {
            info!("analysis cache disabled");
            None
        }
    };

    Ok(AppState {
        gateway: Arc::new(gateway),
        vision: Arc::new(vision),
        cache,
        cache_timeout: config.cache.timeout,
        shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_requires_both_supabase_secrets() {
        let config = EdgeConfig::default();
        let secrets = Secrets {
            supabase_url: Some("http://localhost:54321".to_string()),
            ..Secrets::default()
        };
        let state = build_app_state(&config, secrets, CancellationToken::new()).unwrap();
        assert!(state.cache.is_none());

        let secrets = Secrets {
            supabase_url: Some("http://localhost:54321".to_string()),
            supabase_service_role_key: Some("service".to_string()),
            ..Secrets::default()
        };
        let state = build_app_state(&config, secrets, CancellationToken::new()).unwrap();
        assert!(state.cache.is_some());
    }
}
