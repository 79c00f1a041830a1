//! Gemini client
//!
//! Blocking client for the Generative Language `generateContent` endpoint.
//! One prompt is sent as a single user turn with the configured generation
//! settings and the standard safety thresholds.

use super::{GenerationError, TextGenerator};
use crate::config::{InsightConfig, API_KEY_ENV};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// The key travels in a header so it never appears in URLs or error text
const API_KEY_HEADER: &str = "x-goog-api-key";
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
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

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Text generator backed by Google Gemini
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    generation_config: GenerationConfig,
    client: Client,
}

impl GeminiGenerator {
    /// Build a generator from configuration; fails when no API key is configured
    pub fn from_config(config: &InsightConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingCredential(format!("{} is not set", API_KEY_ENV)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: self.generation_config,
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }

    fn map_api_error(status: u16, body: &str) -> GenerationError {
        let message = serde_json::from_str::<GenerateResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| body.to_string(), |e| e.message);

        match status {
            429 => GenerationError::RateLimited(message),
            _ => GenerationError::Api { status, message },
        }
    }

    fn extract_text(response: GenerateResponse) -> Result<String, GenerationError> {
        if let Some(err) = response.error {
            return Err(GenerationError::InvalidResponse(err.message));
        }

        let text: String = response
            .candidates
            .into_iter()
            .flatten()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            Err(GenerationError::EmptyResponse)
        } else {
            Ok(text.to_string())
        }
    }
}

impl TextGenerator for GeminiGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!("Sending prompt to Gemini");

        let response = self
            .client
            .post(self.build_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .map_err(|e| GenerationError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GenerationError::Http(format!("Failed to read response: {}", e.without_url())))?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response");
            GenerationError::InvalidResponse(e.to_string())
        })?;

        let text = Self::extract_text(parsed)?;
        debug!(reply_len = text.len(), "Received Gemini reply");
        Ok(text)
    }
}

impl Debug for GeminiGenerator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
