//! Chat-completions reasoning client
//!
//! Sends validation prompts to an OpenAI-compatible
//! `POST {endpoint}/v1/chat/completions` API and decodes the assistant's
//! JSON answer. Features:
//! - Async, non-blocking requests over a pooled rustls client
//! - Retry with exponential backoff on transient failures
//! - No retries on permanent failures (auth, bad request, undecodable body)
//!
//! The orchestrator wraps every call in its own hard timeout; the request
//! timeout configured here only bounds a single HTTP attempt.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use super::{ClientError, PromptContext, ReasoningService};
use crate::config::EngineConfig;

const SYSTEM_PROMPT: &str = "You are a validation assistant specialized in verifying AI outputs. \
Your task is to analyze AI-generated content and determine if it meets both structural \
and semantic requirements. You evaluate coherence, relevance, factual accuracy, \
and alignment with the expected output type. \
Provide detailed feedback on validation failures and specific suggestions for improvements. \
Always answer with a single JSON object.";

/// Configuration for the chat reasoning client
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Base URL, without the `/v1/chat/completions` suffix
    pub endpoint: String,

    /// Bearer token; the client refuses to build without one
    pub api_key: Option<String>,

    pub model: String,

    /// Per-attempt request timeout in milliseconds
    pub timeout_ms: u64,

    pub max_retries: u32,

    pub initial_backoff_ms: u64,

    pub max_backoff_ms: u64,

    pub backoff_multiplier: f64,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            timeout_ms: 12_000,
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 2000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ChatClientConfig {
    /// Derive client settings from engine configuration.
    ///
    /// The per-attempt timeout is the semantic budget plus a small margin so
    /// the orchestrator's timeout always fires first.
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self {
            endpoint: config.reasoning_endpoint.clone(),
            api_key: config.reasoning_api_key.clone(),
            model: config.reasoning_model.clone(),
            timeout_ms: config.semantic_timeout_ms.saturating_add(2000),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// HTTP reasoning client for chat-completions APIs
pub struct ChatReasoningClient {
    client: Client,
    config: ChatClientConfig,
    api_key: String,
}

impl std::fmt::Debug for ChatReasoningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatReasoningClient")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .finish()
    }
}

impl ChatReasoningClient {
    /// Create a client for an endpoint with default retry settings
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_config(ChatClientConfig {
            endpoint: endpoint.into(),
            api_key: Some(api_key.into()),
            ..Default::default()
        })
    }

    /// Create a client from explicit configuration
    pub fn with_config(config: ChatClientConfig) -> Result<Self, ClientError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClientError::NotConfigured("no API key configured".to_string()))?;

        if config.endpoint.trim().is_empty() {
            return Err(ClientError::NotConfigured("no endpoint configured".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn builder() -> ChatReasoningClientBuilder {
        ChatReasoningClientBuilder::new()
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    /// Send one completion request
    async fn send(&self, url: &str, prompt: &str) -> Result<Value, ClientError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: json!({"type": "json_object"}),
            temperature: 0.0,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("invalid completion body: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::Decode("completion has no message content".to_string()))?;

        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| ClientError::Decode(format!("message content is not JSON: {}", e)))
    }
}

#[async_trait]
impl ReasoningService for ChatReasoningClient {
    fn name(&self) -> &str {
        "chat-completions"
    }

    async fn run(&self, context: &PromptContext) -> Result<Value, ClientError> {
        let url = self.completions_url();
        let prompt = context.render_prompt();

        let mut last_error = None;
        let mut backoff_ms = self.config.initial_backoff_ms;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    attempt = attempt,
                    backoff_ms = backoff_ms,
                    kind = %context.kind,
                    "Retrying reasoning request"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms as f64 * self.config.backoff_multiplier) as u64;
                backoff_ms = backoff_ms.min(self.config.max_backoff_ms);
            }

            match self.send(&url, &prompt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt,
                        error = %e,
                        kind = %context.kind,
                        "Reasoning request failed"
                    );
                    let permanent = is_permanent_error(&e);
                    last_error = Some(e);
                    if permanent {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::Http("no request attempted".to_string())))
    }
}

/// Models sometimes wrap JSON in a markdown fence despite `json_object` mode
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.strip_prefix("json").unwrap_or(rest);
            body.strip_suffix("```").unwrap_or(body).trim()
        }
        None => trimmed,
    }
}

/// Determine if an error is permanent (should not retry)
fn is_permanent_error(error: &ClientError) -> bool {
    match error {
        ClientError::Status { status, .. } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
        }
        ClientError::Decode(_) | ClientError::NotConfigured(_) | ClientError::Config(_) => true,
        ClientError::Http(_) => false,
    }
}

/// Builder for ChatReasoningClient
pub struct ChatReasoningClientBuilder {
    config: ChatClientConfig,
}

impl ChatReasoningClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ChatClientConfig::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.config.timeout_ms = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn initial_backoff_ms(mut self, backoff: u64) -> Self {
        self.config.initial_backoff_ms = backoff;
        self
    }

    pub fn max_backoff_ms(mut self, backoff: u64) -> Self {
        self.config.max_backoff_ms = backoff;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.config.backoff_multiplier = multiplier;
        self
    }

    pub fn build(self) -> Result<ChatReasoningClient, ClientError> {
        ChatReasoningClient::with_config(self.config)
    }
}

impl Default for ChatReasoningClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
