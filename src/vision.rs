// Wistro Coder: Vision Collaborators
// Image download and a one-shot vision model call for the vision step

use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::VisionSettings;
use crate::error::LlmError;
use crate::llm::provider::{send_json, ANTHROPIC_BASE_URL, ANTHROPIC_VERSION};

pub const DEFAULT_VISION_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const DEFAULT_VISION_MAX_TOKENS: u32 = 4096;
/// Save path of the `evaluate-image` command. Steps default to a fresh file
/// per invocation instead, see [`ImageFetcher::download_unique`].
pub const DEFAULT_IMAGE_PATH: &str = "image.png";

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vision model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A downloaded image and the media type of its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    pub path: PathBuf,
    pub media_type: &'static str,
}

/// Downloads images referenced by vision events
#[derive(Debug, Clone, Default)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Download `image_url` into `save_path`.
    ///
    /// Any status other than 200 yields `Ok(None)` rather than an error, and
    /// nothing is written. Callers carry on without an image.
    pub async fn download(
        &self,
        image_url: &str,
        save_path: &Path,
    ) -> Result<Option<DownloadedImage>, VisionError> {
        let Some((bytes, media_type)) = self.fetch(image_url, Some(save_path)).await? else {
            return Ok(None);
        };

        tokio::fs::write(save_path, &bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), save_path.display());

        Ok(Some(DownloadedImage {
            path: save_path.to_path_buf(),
            media_type,
        }))
    }

    /// Download `image_url` into a new `image-*` file under `dir`, named with
    /// the extension of the detected media type. The file is kept.
    pub async fn download_unique(
        &self,
        image_url: &str,
        dir: &Path,
    ) -> Result<Option<DownloadedImage>, VisionError> {
        let Some((bytes, media_type)) = self.fetch(image_url, None).await? else {
            return Ok(None);
        };

        let (_, path) = tempfile::Builder::new()
            .prefix("image-")
            .suffix(&format!(".{}", extension(media_type)))
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| e.error)?;

        tokio::fs::write(&path, &bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), path.display());

        Ok(Some(DownloadedImage { path, media_type }))
    }

    async fn fetch(
        &self,
        image_url: &str,
        save_path: Option<&Path>,
    ) -> Result<Option<(Vec<u8>, &'static str)>, VisionError> {
        let response = self.client.get(image_url).send().await?;

        if response.status() != StatusCode::OK {
            warn!(
                "Image fetch from {} returned {}; continuing without image",
                image_url,
                response.status()
            );
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        let media_type = sniff_media_type(&bytes)
            .or_else(|| content_type.as_deref().and_then(media_type_from_header))
            .or_else(|| save_path.and_then(media_type_from_extension))
            .unwrap_or("image/png");

        Ok(Some((bytes, media_type)))
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic messages API with image input
#[derive(Debug, Clone)]
pub struct VisionModel {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl VisionModel {
    pub fn new(api_key: &str) -> Self {
        Self::from_settings(&VisionSettings::default(), api_key)
    }

    pub fn from_settings(settings: &VisionSettings, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model about an image. Without an image the prompt is sent alone.
    pub async fn describe(
        &self,
        prompt: &str,
        image: Option<&DownloadedImage>,
    ) -> Result<String, VisionError> {
        let mut content = Vec::new();

        if let Some(image) = image {
            let bytes = tokio::fs::read(&image.path).await?;
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.media_type,
                    "data": general_purpose::STANDARD.encode(&bytes),
                }
            }));
        }
        content.push(json!({ "type": "text", "text": prompt }));

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": content }],
        });

        let endpoint = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        debug!("POST {} (model {})", endpoint, self.model);

        let request = self
            .client
            .post(&endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json(request).await?;

        Ok(response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

/// Media type from the leading bytes of the image
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Media type from a `Content-Type` header, ignoring parameters
pub fn media_type_from_header(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/gif" => Some("image/gif"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

/// Media type from the file extension
pub fn media_type_from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn extension(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}
