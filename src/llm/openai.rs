//! OpenAI / Azure OpenAI chat-completions integration.
//!
//! Implements the `StructuredChat` trait against the Chat Completions API
//! with a strict `json_schema` response format. Azure deployments and the
//! public OpenAI endpoint share the same wire format and differ only in
//! URL layout and auth header.
//!
//! No retries: a failed call is reported to the caller as-is.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatMessage, StructuredChat, StructuredRequest};
use crate::config::{AppConfig, LlmConfig, Provider};
use crate::types::ScanError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Where requests go and which model/deployment serves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
    OpenAi {
        base_url: String,
        model: String,
    },
}

impl Endpoint {
    /// Full chat-completions URL for this endpoint.
    pub fn url(&self) -> String {
        match self {
            Endpoint::Azure { endpoint, deployment, api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                urlencoding::encode(deployment),
                urlencoding::encode(api_version),
            ),
            Endpoint::OpenAi { base_url, .. } => {
                let base = base_url.trim_end_matches('/');
                if base.ends_with("/v1") {
                    format!("{base}/chat/completions")
                } else {
                    format!("{base}/v1/chat/completions")
                }
            }
        }
    }

    /// Model identifier sent in the request body.
    pub fn model(&self) -> &str {
        match self {
            Endpoint::Azure { deployment, .. } => deployment,
            Endpoint::OpenAi { model, .. } => model,
        }
    }
}

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiClient {
    http: Client,
    endpoint: Endpoint,
    api_key: Secret<String>,
    max_tokens: Option<u32>,
    total_tokens: AtomicU64,
    total_calls: AtomicU64,
}

impl OpenAiClient {
    pub fn new(
        endpoint: Endpoint,
        api_key: Secret<String>,
        max_tokens: Option<u32>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build chat-completions HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            max_tokens,
            total_tokens: AtomicU64::new(0),
            total_calls: AtomicU64::new(0),
        })
    }

    /// Build a client from config, resolving secrets and deployment details
    /// from the environment variables the config names.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let endpoint = match cfg.provider {
            Provider::Azure => Endpoint::Azure {
                endpoint: AppConfig::resolve_env(&cfg.endpoint_env)?,
                deployment: AppConfig::resolve_env(&cfg.deployment_env)?,
                api_version: AppConfig::resolve_env(&cfg.api_version_env)?,
            },
            Provider::OpenAi => Endpoint::OpenAi {
                base_url: cfg.base_url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                model: cfg.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
        };
        let api_key = Secret::new(AppConfig::resolve_env(&cfg.api_key_env)?);

        Self::new(
            endpoint,
            api_key,
            cfg.max_tokens,
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn model_name(&self) -> &str {
        self.endpoint.model()
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens.load(Ordering::Relaxed)
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.api_key.expose_secret();
        match self.endpoint {
            Endpoint::Azure { .. } => builder.header("api-key", key),
            Endpoint::OpenAi { .. } => builder.header("Authorization", format!("Bearer {key}")),
        }
    }

    /// Pull the structured JSON text out of a successful response body.
    fn extract_content(body: ChatResponse) -> Result<String, ScanError> {
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ScanError::ExternalService("response contained no choices".into()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            return Err(ScanError::SchemaValidation(
                "output truncated by token limit before the JSON was complete".into(),
            ));
        }
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(ScanError::SchemaValidation("output blocked by content filter".into()));
        }

        let message = choice
            .message
            .ok_or_else(|| ScanError::ExternalService("choice contained no message".into()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(ScanError::SchemaValidation(format!("model refused: {refusal}")));
        }

        message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ScanError::SchemaValidation("model returned empty content".into()))
    }

    /// Prefer the provider's own error message over the raw body.
    fn describe_error_body(text: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(text)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| text.to_string())
    }
}

#[async_trait]
impl StructuredChat for OpenAiClient {
    async fn complete(&self, request: &StructuredRequest) -> Result<String, ScanError> {
        let body = ChatRequest {
            model: self.endpoint.model(),
            messages: &request.messages,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    strict: true,
                    schema: &request.schema,
                },
            },
        };

        let url = self.endpoint.url();
        debug!(url = %url, model = %self.endpoint.model(), "Sending structured chat request");

        let response = self
            .authorize(self.http.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::ExternalService(format!("request error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Chat-completions API returned an error");
            return Err(ScanError::ExternalService(format!(
                "HTTP {status}: {}",
                Self::describe_error_body(&text)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScanError::ExternalService(format!("unreadable response body: {e}")))?;

        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(usage) = &parsed.usage {
            self.total_tokens
                .fetch_add(usage.prompt_tokens + usage.completion_tokens, Ordering::Relaxed);
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }

        Self::extract_content(parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
