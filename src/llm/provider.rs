// Wistro Coder: LLM Provider Abstraction
// Completion backends for the supported providers:
// - OpenAI: text completions endpoint
// - Anthropic: Human/Assistant completions endpoint
// The provider is fixed when the backend is built and never re-checked per call.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{AgentError, LlmError};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "text-davinci-003";
pub const OPENAI_MAX_TOKENS: u32 = 500;
pub const OPENAI_TEMPERATURE: f64 = 0.7;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_MODEL: &str = "claude-2.1";
pub const ANTHROPIC_MAX_TOKENS_TO_SAMPLE: u32 = 1000;

/// Turn delimiters of the Anthropic completions API
pub const HUMAN_PROMPT: &str = "\n\nHuman:";
pub const AI_PROMPT: &str = "\n\nAssistant:";

/// Supported LLM providers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
        }
    }

    /// Environment variable conventionally holding this provider's key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => OPENAI_BASE_URL,
            ProviderType::Anthropic => ANTHROPIC_BASE_URL,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            other => Err(AgentError::Configuration(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }
}

/// Provider selection and credential, immutable once a backend is built
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderType,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Parse a provider identifier. Unknown identifiers fail here, never at call time.
    pub fn new(provider: &str, api_key: &str) -> Result<Self, AgentError> {
        Ok(Self::for_provider(provider.parse()?, api_key))
    }

    pub fn for_provider(provider: ProviderType, api_key: &str) -> Self {
        Self {
            provider,
            api_key: api_key.to_string(),
            base_url: None,
        }
    }

    /// Point the backend at a different host (proxies, local mocks)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url());
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

/// Anything that can turn a rendered prompt into completion text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt).await
    }
}

/// Closed set of provider backends, chosen once at construction
#[derive(Debug)]
pub enum LlmBackend {
    OpenAI(OpenAiBackend),
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    pub fn new(config: ProviderConfig) -> Self {
        match config.provider {
            ProviderType::OpenAI => LlmBackend::OpenAI(OpenAiBackend::new(config)),
            ProviderType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
        }
    }

    pub fn provider(&self) -> ProviderType {
        match self {
            LlmBackend::OpenAI(_) => ProviderType::OpenAI,
            LlmBackend::Anthropic(_) => ProviderType::Anthropic,
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match self {
            LlmBackend::OpenAI(backend) => backend.generate(prompt).await,
            LlmBackend::Anthropic(backend) => backend.generate(prompt).await,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiCompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    text: String,
}

/// OpenAI text completions
#[derive(Debug)]
pub struct OpenAiBackend {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiBackend {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let endpoint = self.config.endpoint("/v1/completions");
        debug!("POST {} (model {})", endpoint, OPENAI_MODEL);

        let body = OpenAiCompletionRequest {
            model: OPENAI_MODEL,
            prompt,
            max_tokens: OPENAI_MAX_TOKENS,
            temperature: OPENAI_TEMPERATURE,
        };

        let request = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let response: OpenAiCompletionResponse = send_json(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| LlmError::Response("no choices in completion response".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicCompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens_to_sample: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicCompletionResponse {
    completion: String,
}

/// Anthropic Human/Assistant completions
#[derive(Debug)]
pub struct AnthropicBackend {
    client: Client,
    config: ProviderConfig,
}

impl AnthropicBackend {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Wrap a prompt in the provider's turn delimiters
    pub fn wrap_prompt(prompt: &str) -> String {
        format!("{}{}{}", HUMAN_PROMPT, prompt, AI_PROMPT)
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let endpoint = self.config.endpoint("/v1/complete");
        debug!("POST {} (model {})", endpoint, ANTHROPIC_MODEL);

        let body = AnthropicCompletionRequest {
            model: ANTHROPIC_MODEL,
            prompt: Self::wrap_prompt(prompt),
            max_tokens_to_sample: ANTHROPIC_MAX_TOKENS_TO_SAMPLE,
        };

        let request = self
            .client
            .post(&endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: AnthropicCompletionResponse = send_json(request).await?;
        Ok(response.completion.trim().to_string())
    }
}

/// Send a request and decode a JSON body, turning non-2xx statuses into errors
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, LlmError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| LlmError::Response(e.to_string()))
}
