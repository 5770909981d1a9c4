// Wistro Coder: Agent System
// Script agent that turns task descriptions into step scripts

pub mod script_agent;

pub use script_agent::ScriptAgent;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "python";
pub const DEFAULT_INPUT_EVENT: &str = "input.event";
pub const DEFAULT_OUTPUT_EVENT: &str = "output.event";
pub const DEFAULT_WORKFLOW: &str = "default_workflow";

/// One script generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub task_description: String,
    /// Target language tag; only `python` and `typescript` render
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_input_event")]
    pub input_event: String,
    #[serde(default = "default_output_event")]
    pub output_event: String,
    #[serde(default = "default_workflow")]
    pub workflow: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_input_event() -> String {
    DEFAULT_INPUT_EVENT.to_string()
}

fn default_output_event() -> String {
    DEFAULT_OUTPUT_EVENT.to_string()
}

fn default_workflow() -> String {
    DEFAULT_WORKFLOW.to_string()
}

impl ScriptRequest {
    pub fn new(task_description: &str, language: &str) -> Self {
        Self {
            task_description: task_description.to_string(),
            language: language.to_string(),
            input_event: default_input_event(),
            output_event: default_output_event(),
            workflow: default_workflow(),
        }
    }

    pub fn with_input_event(mut self, event: &str) -> Self {
        self.input_event = event.to_string();
        self
    }

    pub fn with_output_event(mut self, event: &str) -> Self {
        self.output_event = event.to_string();
        self
    }

    pub fn with_workflow(mut self, workflow: &str) -> Self {
        self.workflow = workflow.to_string();
        self
    }
}
