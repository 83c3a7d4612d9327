//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets and deployment details are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`. Every field has a
//! default, so a missing file yields a working Azure OpenAI setup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

/// Which chat-completions flavour to talk to.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Azure,
    OpenAi,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,
    #[serde(default = "default_api_version_env")]
    pub api_version_env: String,
    #[serde(default = "default_deployment_env")]
    pub deployment_env: String,
    /// Model id for the `openai` provider (Azure uses the deployment name).
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override for the `openai` provider.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key_env: default_api_key_env(),
            endpoint_env: default_endpoint_env(),
            api_version_env: default_api_version_env(),
            deployment_env: default_deployment_env(),
            model: None,
            base_url: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in hardcoded records.
    #[default]
    Demo,
    /// JSON array of scraped deals on disk.
    File,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_api_key_env() -> String {
    "AZURE_OPENAI_API_KEY".to_string()
}

fn default_endpoint_env() -> String {
    "AZURE_OPENAI_ENDPOINT".to_string()
}

fn default_api_version_env() -> String {
    "AZURE_OPENAI_API_VERSION".to_string()
}

fn default_deployment_env() -> String {
    "AZURE_OPENAI_MODEL_DEPLOYMENT_NAME".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
