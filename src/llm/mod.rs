//! Text generation
//!
//! The assistant features only need one capability: turn a prompt into a reply.
//! `TextGenerator` is that seam. The hosted Gemini client implements it when the
//! `gemini` feature is enabled; tests and embedders can supply their own.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::GeminiGenerator;

use thiserror::Error;

/// Failure of a single generation call. Callers log it and fall back; there is no retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Text generation unavailable: {0}")]
    MissingCredential(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Rate limited by the generation service: {0}")]
    RateLimited(String),

    #[error("Generation service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Generation service returned no text")]
    EmptyResponse,

    #[error("Invalid response from generation service: {0}")]
    InvalidResponse(String),
}

/// Single prompt in, single reply out
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str) -> Result<String, GenerationError>,
{
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self(prompt)
    }
}
