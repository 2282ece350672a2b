use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use analysis::AnalysisConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub provider: ProviderConfig,
    pub request_timeout_secs: u64,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub embedding_model: String,
    /// Per-request HTTP timeout for the embedding and chat clients.
    pub http_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: index::EmbeddingClient::DEFAULT_MODEL.to_string(),
            http_timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            provider: ProviderConfig::default(),
            request_timeout_secs: 300,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let workspace = lookup("RISK_ANALYZER_WORKSPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let api_key = lookup("IFI_API_KEY").unwrap_or_default();
        config.analysis = AnalysisConfig::for_workspace(&workspace, api_key);

        if let Some(bind) = lookup("RISK_ANALYZER_BIND") {
            config.bind_addr = bind;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            config.provider.base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_EMBEDDING_MODEL") {
            config.provider.embedding_model = model;
        }
        if let Some(model) = lookup("OPENAI_CHAT_MODEL") {
            config.analysis.generation.model = model;
        }
        if let Some(query) = lookup("RISK_ANALYZER_QUERY") {
            config.analysis.query = query;
        }

        if let Some(top_k) = parse(&lookup, "RISK_ANALYZER_TOP_K")? {
            config.analysis.retrieval.top_k = top_k;
        }
        if let Some(temperature) = parse(&lookup, "RISK_ANALYZER_TEMPERATURE")? {
            config.analysis.generation.temperature = temperature;
        }
        if let Some(concurrency) = parse(&lookup, "RISK_ANALYZER_EMBED_CONCURRENCY")? {
            config.analysis.index.concurrency = concurrency;
        }
        if let Some(timeout) = parse(&lookup, "RISK_ANALYZER_TIMEOUT_SECS")? {
            config.request_timeout_secs = timeout;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.http_timeout_secs)
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("invalid value for {}", key))
}
