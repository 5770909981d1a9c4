// Wistro Coder: LLM Layer
// Provider backends and the prompts sent to them

pub mod prompts;
pub mod provider;

pub use prompts::{PromptTemplate, Prompts, TemplateError};
pub use provider::{
    AnthropicBackend, CompletionBackend, LlmBackend, OpenAiBackend, ProviderConfig, ProviderType,
};
