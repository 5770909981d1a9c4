// Wistro Coder: Wistro Generate Step
// Runs the script agent for each requested task and emits the scripts

use async_trait::async_trait;
use log::info;
use serde_json::{json, Value};

use super::{first_input, Emitter, Step, StepConfig, StepEvent};
use crate::agents::{ScriptAgent, ScriptRequest};
use crate::llm::{CompletionBackend, LlmBackend};

pub const FACTORIAL_TASK: &str =
    "Write a function that calculates the factorial of a number using recursion.";
pub const STRING_FILTER_TASK: &str =
    "Write a function that filters an array of strings to only include items with more than 5 characters.";

pub struct WistroGenerateStep<B = LlmBackend> {
    config: StepConfig,
    agent: ScriptAgent<B>,
    requests: Vec<ScriptRequest>,
}

impl<B: CompletionBackend> WistroGenerateStep<B> {
    pub fn new(agent: ScriptAgent<B>) -> Self {
        Self {
            config: StepConfig::new(
                "Wistro Generate Step",
                "wistro.generate.step",
                "wistro.generate.result",
                "wistro",
            ),
            agent,
            requests: Self::default_requests(),
        }
    }

    /// Python factorial and TypeScript string filter
    pub fn default_requests() -> Vec<ScriptRequest> {
        vec![
            ScriptRequest::new(FACTORIAL_TASK, "python"),
            ScriptRequest::new(STRING_FILTER_TASK, "typescript"),
        ]
    }

    pub fn with_requests(mut self, requests: Vec<ScriptRequest>) -> Self {
        self.requests = requests;
        self
    }

    /// Requests carried by the event, if any, else the configured ones
    fn requests_for(&self, input: &Value) -> anyhow::Result<Vec<ScriptRequest>> {
        match first_input(input).get("requests") {
            Some(requests) => Ok(serde_json::from_value(requests.clone())?),
            None => Ok(self.requests.clone()),
        }
    }
}

#[async_trait]
impl<B: CompletionBackend> Step for WistroGenerateStep<B> {
    fn config(&self) -> &StepConfig {
        &self.config
    }

    async fn execute(&self, input: Value, emit: &dyn Emitter) -> anyhow::Result<()> {
        info!("[{}] Received event {}", self.config.name, input);

        let mut scripts = Vec::new();
        for request in self.requests_for(&input)? {
            let report = self.agent.generate_report(&request).await?;
            info!("Generated {} script:\n{}", report.language, report.script);
            scripts.push(json!({
                "name": report.name,
                "language": report.language,
                "complexity": report.score,
                "script": report.script,
            }));
        }

        for topic in &self.config.emits {
            emit.emit(StepEvent {
                topic: topic.clone(),
                data: json!({ "scripts": scripts }),
            })
            .await?;
        }

        Ok(())
    }
}
