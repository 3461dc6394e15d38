use anyhow::Context;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use veritas_protocol::Language;

use crate::speech::Voice;

pub const FUNCTIONS_URL: &str = "VERITAS_FUNCTIONS_URL";
pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_PUBLISHABLE_KEY: &str = "SUPABASE_PUBLISHABLE_KEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the edge functions; defaults to `storage_url`.
    pub functions_url: Option<String>,
    pub storage_url: Option<String>,
    pub publishable_key: Option<String>,
    /// Connect timeout for outbound requests.
    #[serde(deserialize_with = "deserialize_optional_duration")]
    pub timeout: Option<Duration>,
    pub language: Option<Language>,
    pub voices: Vec<Voice>,
}

/// Settings with every required value present.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub functions_url: String,
    pub storage_url: String,
    pub publishable_key: String,
    pub timeout: Duration,
    pub language: Language,
    pub voices: Vec<Voice>,
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn apply_env(&mut self) {
        self.apply_lookup(|key| std::env::var(key).ok());
    }

    /// Environment values win over the file; blank values are ignored.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(url) = read(SUPABASE_URL) {
            self.storage_url = Some(url);
        }
        if let Some(url) = read(FUNCTIONS_URL) {
            self.functions_url = Some(url);
        }
        if let Some(key) = read(SUPABASE_PUBLISHABLE_KEY) {
            self.publishable_key = Some(key);
        }
    }

    pub fn resolve(self) -> anyhow::Result<ResolvedConfig> {
        let storage_url = self
            .storage_url
            .or_else(|| self.functions_url.clone())
            .with_context(|| format!("storage_url or {SUPABASE_URL} must be set"))?;
        let functions_url = self.functions_url.unwrap_or_else(|| storage_url.clone());
        let publishable_key = self
            .publishable_key
            .with_context(|| format!("publishable_key or {SUPABASE_PUBLISHABLE_KEY} must be set"))?;
        Ok(ResolvedConfig {
            functions_url,
            storage_url,
            publishable_key,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            language: self.language.unwrap_or_default(),
            voices: self.voices,
        })
    }
}

fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim())
        .map(Some)
        .map_err(serde::de::Error::custom)
}
