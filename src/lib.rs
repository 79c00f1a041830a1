//! fertility-insight - Fertile window estimation and cycle guidance
//!
//! Turns a cycle profile (and optionally a wearable series) into a fertile window
//! estimate through a deterministic pipeline: baseline window → lifestyle and
//! condition adjustments → wearable BBT override → confidence clamp. Around the
//! estimate sit rule-based advisories, health scores, a month calendar and an
//! assistant that uses a hosted text generator when one is configured.
//!
//! ## Modules
//!
//! - **Estimation**: `estimator`, `advisory`, `health`, `calendar`
//! - **Wearables**: CSV/JSON/NDJSON series parsing and summaries
//! - **Assistant**: prompt construction, chat sessions, text generation

pub mod advisory;
pub mod calendar;
pub mod chat;
pub mod config;
pub mod error;
pub mod estimator;
pub mod health;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod types;
pub mod wearable;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use advisory::{evaluate as evaluate_advisories, risk_factors, Advisory, Severity};
pub use calendar::CalendarMonth;
pub use chat::{ChatAssistant, ChatMessage, ChatReply, ChatSession, QuickQuestion};
pub use config::{Availability, InsightConfig};
pub use error::InsightError;
pub use estimator::{estimate, Estimator};
pub use health::HealthAssessment;
pub use llm::{GenerationError, TextGenerator};
pub use pipeline::{analyze, estimate_json, report_json, FertilityProcessor, FertilityReport};
pub use types::{BaselineWindow, CycleProfile, FertilityEstimate};
pub use wearable::{WearableFormat, WearableParser, WearableSeries, WearableSummary};

#[cfg(feature = "gemini")]
pub use llm::GeminiGenerator;

/// Library version embedded in every report
pub const INSIGHT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "fertility-insight";
