// Wistro Coder: Settings
// JSON settings file with environment fallbacks for provider credentials

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::agents::{ScriptRequest, DEFAULT_INPUT_EVENT, DEFAULT_OUTPUT_EVENT, DEFAULT_WORKFLOW};
use crate::error::AgentError;
use crate::llm::{ProviderConfig, ProviderType};
use crate::vision::{DEFAULT_VISION_MAX_TOKENS, DEFAULT_VISION_MODEL};

/// Settings for the vision evaluation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Falls back to `ANTHROPIC_API_KEY`
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_VISION_MODEL.to_string(),
            max_tokens: DEFAULT_VISION_MAX_TOKENS,
            api_key: None,
            base_url: None,
        }
    }
}

impl VisionSettings {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var(ProviderType::Anthropic.api_key_env()).ok())
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `openai` or `anthropic`
    pub provider: String,
    /// Falls back to the provider's conventional environment variable
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub input_event: String,
    pub output_event: String,
    pub workflow: String,
    pub vision: VisionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderType::Anthropic.as_str().to_string(),
            api_key: None,
            base_url: None,
            input_event: DEFAULT_INPUT_EVENT.to_string(),
            output_event: DEFAULT_OUTPUT_EVENT.to_string(),
            workflow: DEFAULT_WORKFLOW.to_string(),
            vision: VisionSettings::default(),
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("wistro-coder").join("settings.json")
    }

    /// Load settings from `path`, or from [`Settings::default_path`].
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                bail!("Settings file not found: {}", path.display());
            }
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// Build the provider configuration the agent is constructed with
    pub fn provider_config(&self) -> Result<ProviderConfig, AgentError> {
        let provider: ProviderType = self.provider.parse()?;
        let api_key = self
            .api_key
            .clone()
            .or_else(|| env::var(provider.api_key_env()).ok())
            .ok_or_else(|| {
                AgentError::Configuration(format!(
                    "API key not configured for {}; set {} or api_key in settings",
                    provider,
                    provider.api_key_env()
                ))
            })?;

        let config = ProviderConfig::for_provider(provider, &api_key);
        Ok(match &self.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }

    /// Request for `task_description` using the configured event names
    pub fn script_request(&self, task_description: &str, language: &str) -> ScriptRequest {
        ScriptRequest::new(task_description, language)
            .with_input_event(&self.input_event)
            .with_output_event(&self.output_event)
            .with_workflow(&self.workflow)
    }
}
