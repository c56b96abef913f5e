//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use field_pipeline::SummaryRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{AdvisoryError, Result};
use crate::prompts::{custom_prompt, default_prompt};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Commentary on a summary record.
#[async_trait]
pub trait Advisory: Send + Sync {
    /// Ask for commentary. `custom_prompt` replaces the default risk prompt.
    ///
    /// `Ok(None)` means the service is not configured.
    async fn analyze(
        &self,
        summary: &SummaryRecord,
        custom_prompt: Option<&str>,
    ) -> Result<Option<String>>;

    fn is_configured(&self) -> bool;
}

/// Advisory that is never configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvisory;

#[async_trait]
impl Advisory for NoAdvisory {
    async fn analyze(&self, _summary: &SummaryRecord, _prompt: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Gemini client settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub thinking_budget: u32,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            thinking_budget: 0,
            api_key: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    /// Defaults with `GEMINI_API_KEY` and `GEMINI_MODEL` from the environment.
    pub fn from_env() -> Self {
        let mut config = Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            ..Self::default()
        };
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        config
    }

    fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// All text parts of all candidates, concatenated.
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

// =============================================================================
// Client
// =============================================================================

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a prompt and return the generated text.
    #[instrument(skip(self, key, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, key: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(AdvisoryError::InvalidResponse(
                "response contained no text".to_string(),
            ));
        }
        debug!(chars = text.len(), "Model response received");
        Ok(text)
    }
}

#[async_trait]
impl Advisory for GeminiClient {
    async fn analyze(
        &self,
        summary: &SummaryRecord,
        prompt_override: Option<&str>,
    ) -> Result<Option<String>> {
        let Some(key) = self.config.key() else {
            warn!("GEMINI_API_KEY not set, skipping model analysis");
            return Ok(None);
        };

        let prompt = match prompt_override {
            Some(custom) => custom_prompt(custom, summary)?,
            None => default_prompt(summary)?,
        };

        info!(model = %self.config.model, "Requesting model analysis");
        self.generate(key, &prompt).await.map(Some)
    }

    fn is_configured(&self) -> bool {
        self.config.key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"summary\": "}, {"text": "\"dry\"}"}]}},
                {"finishReason": "SAFETY"}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), r#"{"summary": "dry"}"#);
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let config = GeminiConfig {
            api_key: Some("   ".to_string()),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();
        assert!(!client.is_configured());
    }
}
