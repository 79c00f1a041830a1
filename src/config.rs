//! Runtime configuration
//!
//! Text generation settings are read from the environment. A missing API key is
//! not an error: it only makes the assistant features unavailable.

use crate::error::InsightError;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "FERTILITY_LLM_MODEL";
pub const BASE_URL_ENV: &str = "FERTILITY_LLM_BASE_URL";
pub const TIMEOUT_ENV: &str = "FERTILITY_LLM_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the hosted text generator
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Debug for InsightConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InsightConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Whether assistant features can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl InsightConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, InsightError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InsightError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        config.api_key = non_empty(API_KEY_ENV);
        if let Some(model) = non_empty(MODEL_ENV) {
            config.model = model;
        }
        if let Some(url) = non_empty(BASE_URL_ENV) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = non_empty(TIMEOUT_ENV) {
            config.timeout_secs = timeout.parse().map_err(|_| {
                InsightError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_ENV, timeout
                ))
            })?;
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn availability(&self) -> Availability {
        if !cfg!(feature = "gemini") {
            return Availability::Unavailable(
                "built without the `gemini` feature".to_string(),
            );
        }
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Availability::Available,
            _ => Availability::Unavailable(format!("{} is not set", API_KEY_ENV)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = InsightConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, InsightConfig::default());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(!config.availability().is_available());
    }

    #[test]
    fn test_reads_overrides() {
        let config = InsightConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "abc123"),
            (MODEL_ENV, "gemini-1.5-pro"),
            (BASE_URL_ENV, "http://localhost:9000/"),
            (TIMEOUT_ENV, "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = InsightConfig::from_lookup(lookup(&[(API_KEY_ENV, "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_bad_timeout() {
        let err = InsightConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }

    #[test]
    fn test_key_is_hidden() {
        let config = InsightConfig::default().with_api_key("secret-key");
        assert!(!format!("{:?}", config).contains("secret-key"));
        assert!(!serde_json::to_string(&config).unwrap().contains("secret-key"));
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn test_available_with_key() {
        let config = InsightConfig::default().with_api_key("k");
        assert_eq!(config.availability(), Availability::Available);
    }
}
