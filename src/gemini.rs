//! Gemini `generateContent` client - the generation side of cache-or-generate.
//!
//! Every failure mode (connect error, non-2xx status, unparseable body, empty
//! candidate list) collapses into [`GenerateError`]; the resolver treats them
//! all the same way.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("response contained no answer text")]
    EmptyResponse,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url,
            model,
            api_key,
            client,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    // Single-turn request body - no history, the gateway is stateless
    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        })
    }

    // Join the text parts of the first candidate
    fn extract_text(response: &Value) -> Option<String> {
        let parts = response["candidates"][0]["content"]["parts"].as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        debug!(model = %self.model, "calling Gemini generateContent");

        let response = self
            .client
            .post(self.api_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            // Surface the API's own message when the error body is JSON
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(body);
            return Err(GenerateError::Api { status, message });
        }

        let body: Value = response.json().await?;
        Self::extract_text(&body).ok_or(GenerateError::EmptyResponse)
    }
}
