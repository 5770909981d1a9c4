// Wistro Coder: Error Types
// Failure modes of the script generation pipeline

use thiserror::Error;

use crate::llm::prompts::TemplateError;

/// Errors raised while talking to a completion provider.
///
/// These are surfaced verbatim: no retry, no transient/permanent
/// classification.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    Response(String),
}

/// Errors that end a [`ScriptAgent`](crate::agents::ScriptAgent) invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Raised while building the agent, before any network activity.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("LLM invocation failed: {0}")]
    Transport(#[from] LlmError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
