// Wistro Coder: Script Agent
// sanitize -> query -> score -> render, one linear pass per request

use log::{debug, info};
use std::time::Instant;

use super::ScriptRequest;
use crate::error::Result;
use crate::generators::{sanitize_name, ComplexityReport, GeneratedScript};
use crate::llm::{CompletionBackend, LlmBackend, Prompts, ProviderConfig, ProviderType};
use crate::templates::{ScriptContext, ScriptTemplater};

/// Generates step scripts from task descriptions.
///
/// Holds only the backend (with its immutable provider configuration) and
/// the templater, so one agent can serve concurrent requests.
pub struct ScriptAgent<B = LlmBackend> {
    backend: B,
    templater: ScriptTemplater,
}

impl ScriptAgent<LlmBackend> {
    /// Build an agent for `provider` (`openai` or `anthropic`).
    ///
    /// Unknown providers fail here with a configuration error.
    pub fn new(provider: &str, api_key: &str) -> Result<Self> {
        Ok(Self::from_config(ProviderConfig::new(provider, api_key)?))
    }

    pub fn from_config(config: ProviderConfig) -> Self {
        Self::with_backend(LlmBackend::new(config))
    }

    pub fn provider(&self) -> ProviderType {
        self.backend.provider()
    }
}

impl<B: CompletionBackend> ScriptAgent<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            templater: ScriptTemplater::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate the complete script text for a request
    pub async fn generate(&self, request: &ScriptRequest) -> Result<String> {
        Ok(self.generate_report(request).await?.script)
    }

    /// Generate a script and keep the intermediate results.
    ///
    /// The language tag is only checked when rendering, after the backend
    /// has been queried.
    pub async fn generate_report(&self, request: &ScriptRequest) -> Result<GeneratedScript> {
        let start = Instant::now();

        let name = sanitize_name(&request.task_description);

        let prompt = Prompts::for_task(&request.language, &request.task_description)?;
        debug!("Querying backend for '{}' ({})", name, request.language);
        let logic = self.backend.generate(&prompt).await?;

        let complexity = ComplexityReport::analyze(&logic);

        let script = self.templater.render(&ScriptContext {
            name: &name,
            input_event: &request.input_event,
            output_event: &request.output_event,
            workflow: &request.workflow,
            logic: &logic,
            language: &request.language,
        })?;

        let score = complexity.score();
        info!("Complexity Score: {}/100", score);

        Ok(GeneratedScript {
            name,
            language: request.language.clone(),
            logic,
            complexity,
            score,
            script,
            generation_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
