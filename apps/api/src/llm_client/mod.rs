/// LLM Client — the single point of entry for chat-completion calls.
///
/// ARCHITECTURAL RULE: no other module may talk to the inference API
/// directly. The vision and embedding clients live alongside this one and
/// share its transport; pipeline stages only ever see the service traits.
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub mod embeddings;
pub mod prompts;
pub mod vision;

use crate::models::{CandidateExtraction, CreativityAssessment, ListingExtraction};
use crate::ratelimit::RateLimiter;

const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
/// Minimum spacing between chat-completion calls, per client instance.
const TEXT_MIN_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("model returned empty content")]
    EmptyContent,

    #[error("failed to read image: {0}")]
    Image(String),
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    pub(crate) fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    pub(crate) fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub(crate) enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    fn refusal(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.refusal.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub(crate) fn build_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_default()
}

/// Posts a chat-completion request, retrying 429s and 5xx responses with
/// exponential backoff. Shared by the text and vision clients.
pub(crate) async fn post_chat(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<ChatResponse, LlmError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "chat call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("inference API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "chat call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        return Ok(chat_response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

/// Parses a chat response as JSON after stripping code fences. A refusal is
/// `Ok(None)`: the model declined, which callers treat as "no result", not as
/// a transport failure.
pub(crate) fn parse_structured<T: DeserializeOwned>(
    response: &ChatResponse,
) -> Result<Option<T>, LlmError> {
    if let Some(refusal) = response.refusal() {
        warn!("model refused structured output: {refusal}");
        return Ok(None);
    }

    let text = response.text().ok_or(LlmError::EmptyContent)?;
    let text = strip_json_fences(text);
    Ok(Some(serde_json::from_str(text)?))
}

/// Typed extraction over résumé and job-description text. The pipeline
/// depends on this trait, not on the HTTP client, so stage tests can swap in
/// scripted extractors.
#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    /// Structured candidate profile from résumé paragraphs plus the vision
    /// stage's design assessment. `None` means the model refused.
    async fn extract_candidate(
        &self,
        paragraphs: &[String],
        assessment: &CreativityAssessment,
    ) -> Result<Option<CandidateExtraction>, LlmError>;

    /// Structured listing from job-description paragraphs. `None` on refusal.
    async fn extract_listing(
        &self,
        paragraphs: &[String],
    ) -> Result<Option<ListingExtraction>, LlmError>;
}

/// Chat-completions client for text extraction. Owns its own rate limiter:
/// text calls are spaced independently of vision and embedding traffic.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    limiter: RateLimiter,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: build_http_client(),
            base_url,
            api_key,
            model,
            limiter: RateLimiter::new(TEXT_MIN_INTERVAL),
        }
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: String,
    ) -> Result<Option<T>, LlmError> {
        self.limiter.wait().await;

        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
        };

        let response = post_chat(&self.client, &self.base_url, &self.api_key, &request).await?;
        parse_structured(&response)
    }
}

#[async_trait]
impl ProfileExtractor for LlmClient {
    async fn extract_candidate(
        &self,
        paragraphs: &[String],
        assessment: &CreativityAssessment,
    ) -> Result<Option<CandidateExtraction>, LlmError> {
        let prompt = prompts::candidate_extraction_prompt(paragraphs, assessment);
        self.call_json(prompts::CANDIDATE_SYSTEM, prompt).await
    }

    async fn extract_listing(
        &self,
        paragraphs: &[String],
    ) -> Result<Option<ListingExtraction>, LlmError> {
        let prompt = prompts::listing_extraction_prompt(paragraphs);
        self.call_json(prompts::LISTING_SYSTEM, prompt).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_structured_refusal_is_none() {
        let response = ChatResponse {
            choices: vec![ChatChoice {
                message: ResponseMessage {
                    content: None,
                    refusal: Some("I cannot assess this document".to_string()),
                },
            }],
            usage: None,
        };
        let parsed: Option<serde_json::Value> = parse_structured(&response).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_structured_empty_is_error() {
        let response = ChatResponse {
            choices: vec![],
            usage: None,
        };
        let parsed: Result<Option<serde_json::Value>, _> = parse_structured(&response);
        assert!(matches!(parsed, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_parse_structured_strips_fences() {
        let response = ChatResponse {
            choices: vec![ChatChoice {
                message: ResponseMessage {
                    content: Some("```json\n{\"title\": \"Engineer\"}\n```".to_string()),
                    refusal: None,
                },
            }],
            usage: None,
        };
        let parsed: Option<serde_json::Value> = parse_structured(&response).unwrap();
        assert_eq!(parsed.unwrap()["title"], "Engineer");
    }
}
