#![allow(dead_code)]

//! Vision client — scores a résumé's visual design from page screenshots.
//!
//! All pages go out in a single multimodal call so the model judges the
//! document as a whole; per-page calls gave inconsistent scores.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm_client::{
    build_http_client, parse_structured, post_chat, prompts, ChatMessage, ChatRequest,
    ContentPart, ImageUrl, LlmError,
};
use crate::models::CreativityAssessment;
use crate::ratelimit::RateLimiter;

const MAX_TOKENS: u32 = 1024;
/// Minimum spacing between vision calls, per client instance. Vision models
/// are the slowest and most aggressively limited upstream.
const VISION_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Design assessment over rendered résumé pages. The pipeline depends on this
/// trait so stage tests can script assessments without a model.
#[async_trait]
pub trait VisionService: Send + Sync {
    /// One assessment for the whole document. `None` means the model refused
    /// to assess it.
    async fn describe_pages(
        &self,
        images: &[PathBuf],
    ) -> Result<Option<CreativityAssessment>, LlmError>;
}

/// Chat-completions client for the vision model.
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    limiter: RateLimiter,
}

impl VisionClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: build_http_client(),
            base_url,
            api_key,
            model,
            limiter: RateLimiter::new(VISION_MIN_INTERVAL),
        }
    }
}

#[async_trait]
impl VisionService for VisionClient {
    async fn describe_pages(
        &self,
        images: &[PathBuf],
    ) -> Result<Option<CreativityAssessment>, LlmError> {
        self.limiter.wait().await;

        let mut parts = vec![ContentPart::Text {
            text: prompts::vision_assessment_prompt(images.len()),
        }];
        for image in images {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: png_data_url(image).await?,
                },
            });
        }

        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![
                ChatMessage::system(prompts::VISION_SYSTEM),
                ChatMessage::user_parts(parts),
            ],
        };

        let response = post_chat(&self.client, &self.base_url, &self.api_key, &request).await?;
        parse_structured(&response)
    }
}

/// Reads a rendered page and encodes it as a `data:image/png;base64,...` URL.
async fn png_data_url(path: &Path) -> Result<String, LlmError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LlmError::Image(format!("{}: {e}", path.display())))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:image/png;base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_png_data_url_encodes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-1.png");
        tokio::fs::write(&path, b"fake png bytes").await.unwrap();

        let url = png_data_url(&path).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"fake png bytes");
    }

    #[tokio::test]
    async fn test_png_data_url_missing_file_is_image_error() {
        let result = png_data_url(Path::new("/nonexistent/page-1.png")).await;
        assert!(matches!(result, Err(LlmError::Image(_))));
    }
}
