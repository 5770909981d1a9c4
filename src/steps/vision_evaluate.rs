// Wistro Coder: Vision Evaluate Step
// Downloads the referenced image and asks the vision model about it

use anyhow::Context;
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::{first_input, Emitter, Step, StepConfig, StepEvent};
use crate::vision::{ImageFetcher, VisionModel};

pub const DEFAULT_PROMPT: &str = "Describe this image";

#[derive(Debug, Clone, Deserialize)]
pub struct VisionRequest {
    pub image_url: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

pub struct VisionEvaluateStep {
    config: StepConfig,
    fetcher: ImageFetcher,
    model: VisionModel,
    /// Fixed download target; when unset each invocation gets its own file
    /// under `save_dir`
    save_path: Option<PathBuf>,
    save_dir: PathBuf,
}

impl VisionEvaluateStep {
    pub fn new(model: VisionModel) -> Self {
        Self {
            config: StepConfig::new("Vision evaluate", "vision.evaluate", "vision.result", "vision"),
            fetcher: ImageFetcher::new(),
            model,
            save_path: None,
            save_dir: std::env::temp_dir(),
        }
    }

    /// Always download to `save_path`. Concurrent invocations then share the file.
    pub fn with_save_path(mut self, save_path: PathBuf) -> Self {
        self.save_path = Some(save_path);
        self
    }

    pub fn with_save_dir(mut self, save_dir: PathBuf) -> Self {
        self.save_dir = save_dir;
        self
    }
}

#[async_trait]
impl Step for VisionEvaluateStep {
    fn config(&self) -> &StepConfig {
        &self.config
    }

    /// A failed download (non-200) is not an error: the model is still asked,
    /// with the prompt alone, and the emitted `image` is null.
    async fn execute(&self, input: Value, emit: &dyn Emitter) -> anyhow::Result<()> {
        info!("[{}] Received vision-agent event {}", self.config.name, input);

        let request: VisionRequest = serde_json::from_value(first_input(&input).clone())
            .context("vision event needs an image_url")?;

        let image = match &self.save_path {
            Some(path) => self.fetcher.download(&request.image_url, path).await?,
            None => {
                self.fetcher
                    .download_unique(&request.image_url, &self.save_dir)
                    .await?
            }
        };

        let prompt = request.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
        let response = self.model.describe(prompt, image.as_ref()).await?;
        info!("{}", response);

        for topic in &self.config.emits {
            emit.emit(StepEvent {
                topic: topic.clone(),
                data: json!({
                    "image_url": request.image_url,
                    "image": image.as_ref().map(|i| i.path.display().to_string()),
                    "media_type": image.as_ref().map(|i| i.media_type),
                    "prompt": prompt,
                    "response": response,
                }),
            })
            .await?;
        }

        Ok(())
    }
}
