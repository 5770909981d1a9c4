// Wistro Coder: Script Generation Agent
// Turns natural-language task descriptions into event-driven step scripts

// Agent orchestrating naming, generation, scoring and rendering
pub mod agents;

// Settings file and credential resolution
pub mod config;

pub mod error;

// Naming and complexity scoring of generated logic
pub mod generators;

// LLM abstraction layer - provider backends and prompts
pub mod llm;

// Workflow steps built on the agent and the vision model
pub mod steps;

// Per-language step script templates
pub mod templates;

// Image download and vision model collaborators
pub mod vision;

pub use agents::{ScriptAgent, ScriptRequest};
pub use config::Settings;
pub use error::{AgentError, LlmError, Result};
pub use generators::{calculate_complexity, sanitize_name, ComplexityReport, GeneratedScript};
pub use llm::{CompletionBackend, LlmBackend, ProviderConfig, ProviderType};
pub use steps::{Emitter, Step, StepConfig, StepEvent, VisionEvaluateStep, WistroGenerateStep};
pub use templates::{ScriptContext, ScriptLanguage, ScriptTemplater};
pub use vision::{DownloadedImage, ImageFetcher, VisionError, VisionModel};
