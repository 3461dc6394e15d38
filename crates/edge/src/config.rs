use anyhow::Context;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev";
const DEFAULT_GATEWAY_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_VISION_URL: &str = "https://api.openai.com";
const DEFAULT_VISION_MODEL: &str = "gpt-4o";
const DEFAULT_CHAT_PATH: &str = "/v1/chat/completions";
const DEFAULT_CACHE_TABLE: &str = "image_analyses";

pub(crate) const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub(crate) const LOVABLE_API_KEY: &str = "LOVABLE_API_KEY";
pub(crate) const SUPABASE_URL: &str = "SUPABASE_URL";
pub(crate) const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EdgeConfig {
    pub(crate) gateway: GatewayConfig,
    pub(crate) vision: VisionConfig,
    pub(crate) cache: CacheConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GatewayConfig {
    pub(crate) base_url: String,
    pub(crate) chat_path: String,
    pub(crate) model: String,
    /// Limit on waiting for response headers; the stream itself is not bounded.
    #[serde(deserialize_with = "deserialize_duration")]
    pub(crate) connect_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            model: DEFAULT_GATEWAY_MODEL.to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct VisionConfig {
    pub(crate) base_url: String,
    pub(crate) chat_path: String,
    pub(crate) model: String,
    pub(crate) temperature: f32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub(crate) timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VISION_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.5,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CacheConfig {
    pub(crate) enabled: bool,
    pub(crate) table: String,
    /// Upper bound on one background insert.
    #[serde(deserialize_with = "deserialize_duration")]
    pub(crate) timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            table: DEFAULT_CACHE_TABLE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

fn validate_edge_config(config: &EdgeConfig) -> anyhow::Result<()> {
    for (label, base_url, model) in [
        ("gateway", &config.gateway.base_url, &config.gateway.model),
        ("vision", &config.vision.base_url, &config.vision.model),
    ] {
        if base_url.trim().is_empty() {
            anyhow::bail!("{label}.base_url must not be empty");
        }
        if model.trim().is_empty() {
            anyhow::bail!("{label}.model must not be empty");
        }
    }
    if !(0.0..=2.0).contains(&config.vision.temperature) {
        anyhow::bail!("vision.temperature must be between 0 and 2");
    }
    if config.cache.enabled && config.cache.table.trim().is_empty() {
        anyhow::bail!("cache.table must be set when the cache is enabled");
    }
    if config.cache.timeout.is_zero() {
        anyhow::bail!("cache.timeout must be greater than zero");
    }
    Ok(())
}

pub(crate) fn load_edge_config(path: &Path) -> anyhow::Result<EdgeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: EdgeConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    validate_edge_config(&config)?;
    Ok(config)
}

/// Server-side API keys. Only ever read from the environment.
#[derive(Clone, Default)]
pub(crate) struct Secrets {
    pub(crate) openai_api_key: Option<String>,
    pub(crate) lovable_api_key: Option<String>,
    pub(crate) supabase_url: Option<String>,
    pub(crate) supabase_service_role_key: Option<String>,
}

impl Secrets {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            openai_api_key: read(OPENAI_API_KEY),
            lovable_api_key: read(LOVABLE_API_KEY),
            supabase_url: read(SUPABASE_URL),
            supabase_service_role_key: read(SUPABASE_SERVICE_ROLE_KEY),
        }
    }

    pub(crate) fn warn_missing(&self) {
        for (key, value) in [
            (OPENAI_API_KEY, &self.openai_api_key),
            (LOVABLE_API_KEY, &self.lovable_api_key),
            (SUPABASE_URL, &self.supabase_url),
            (SUPABASE_SERVICE_ROLE_KEY, &self.supabase_service_role_key),
        ] {
            if value.is_none() {
                warn!(key, "environment variable not set");
            }
        }
    }
}
