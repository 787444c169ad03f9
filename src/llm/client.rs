//! Async LLM client for chat command parsing
//!
//! This is a model-agnostic HTTP client for calling LLM APIs.
//! Supports Gemini, Anthropic and OpenAI-compatible APIs (DeepSeek, etc).
//! Every call is one request and one response: no retries, no streaming,
//! no conversation memory.

use crate::core::config::AppConfig;
use crate::core::error::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The single capability the resolver needs from a language model
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Turn a prompt into raw, untrusted text
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Gemini,
    Anthropic,
    OpenAI,
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let api_format = Self::detect_api_format(&api_url);
        Ok(Self {
            client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            max_tokens,
            api_format,
        })
    }

    /// Build a client from config, or `None` when no API key is configured
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.llm_api_key.clone() else {
            return Ok(None);
        };
        Self::new(
            api_key,
            config.llm_api_url.clone(),
            config.llm_model.clone(),
            config.llm_max_tokens,
            Duration::from_secs(config.llm_timeout_secs),
        )
        .map(Some)
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("generativelanguage.googleapis.com") {
            ApiFormat::Gemini
        } else if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_gemini(&self, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.into(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        };
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(invocation_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LedgerError::ModelInvocation(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: GeminiResponse = response.json().await.map_err(invocation_error)?;

        completion
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or_else(|| LedgerError::ModelInvocation("Empty response".into()))
    }

    async fn complete_anthropic(&self, prompt: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(invocation_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LedgerError::ModelInvocation(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: AnthropicResponse = response.json().await.map_err(invocation_error)?;

        completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| LedgerError::ModelInvocation("Empty response".into()))
    }

    async fn complete_openai(&self, prompt: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(invocation_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LedgerError::ModelInvocation(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: OpenAIResponse = response.json().await.map_err(invocation_error)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LedgerError::ModelInvocation("Empty response".into()))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let text = match self.api_format {
            ApiFormat::Gemini => self.complete_gemini(prompt).await?,
            ApiFormat::Anthropic => self.complete_anthropic(prompt).await?,
            ApiFormat::OpenAI => self.complete_openai(prompt).await?,
        };
        if text.trim().is_empty() {
            return Err(LedgerError::ModelInvocation("Empty response".into()));
        }
        Ok(text)
    }
}

fn invocation_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::ModelInvocation("Model call timed out".into())
    } else {
        LedgerError::ModelInvocation(e.to_string())
    }
}

// Gemini generateContent format
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
