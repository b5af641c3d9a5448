//! Structured text generation
//!
//! Wraps the Gemini `generateContent` endpoint with fixed sampling parameters
//! and JSON-only output.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::types::{Result, TextframeError};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Text plus the number of tokens the upstream billed for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    /// JSON-encoded response text
    pub text: String,
    pub total_token_count: u64,
}

/// Runs a prompt against a language model
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationOutput>;
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u64,
}

/// Extract the first candidate's text and the token usage from a response body
fn parse_generate_response(body: &str) -> Result<GenerationOutput> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| TextframeError::Upstream(format!("Malformed generation response: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(TextframeError::Upstream(
            "Generation response contained no text".into(),
        ));
    }

    Ok(GenerationOutput {
        text,
        total_token_count: response
            .usage_metadata
            .map(|u| u.total_token_count)
            .unwrap_or(0),
    })
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(api_base: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TextframeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            config: GenerationConfig::default(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationOutput> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": self.config,
        });

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let snippet: String = text.chars().take(200).collect();
            return Err(TextframeError::Upstream(format!(
                "Generation upstream returned {}: {}",
                status, snippet
            )));
        }

        let output = parse_generate_response(&text)?;
        debug!(
            model = %self.model,
            tokens = output.total_token_count,
            "Generation completed"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_wire_format() {
        let value = serde_json::to_value(GenerationConfig::default()).unwrap();

        assert_eq!(value["temperature"], 1.0);
        assert_eq!(value["topK"], 64);
        assert_eq!(value["maxOutputTokens"], 8192);
        assert_eq!(value["responseMimeType"], "application/json");
        assert!(value.get("topP").is_some());
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "[\"12.5\","}, {"text": "\"40\"]"}],
                    "role": "model"
                }
            }],
            "usageMetadata": {
                "promptTokenCount": 900,
                "candidatesTokenCount": 12,
                "totalTokenCount": 912
            }
        }"#;

        let output = parse_generate_response(body).unwrap();
        assert_eq!(output.text, r#"["12.5","40"]"#);
        assert_eq!(output.total_token_count, 912);
    }

    #[test]
    fn test_parse_response_without_text() {
        let body = r#"{"candidates": [], "usageMetadata": {"totalTokenCount": 3}}"#;
        assert!(matches!(
            parse_generate_response(body),
            Err(TextframeError::Upstream(_))
        ));
        assert!(parse_generate_response("not json").is_err());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(
            "https://example.test/",
            "gemini-1.5-flash",
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
