//! Pipeline orchestration
//!
//! This module provides the public API for fertility-insight. It wires the
//! stages together: profile and wearable parsing → estimation → advisories and
//! health scores → report, plus the assistant features behind a stateful
//! processor.

use crate::advisory::{self, Advisory};
use crate::chat::{ChatAssistant, ChatReply, ChatSession};
use crate::config::{Availability, InsightConfig};
use crate::error::InsightError;
use crate::estimator::Estimator;
use crate::health::HealthAssessment;
use crate::llm::{GenerationError, TextGenerator};
use crate::prompts;
use crate::types::{BaselineWindow, CycleProfile, FertilityEstimate};
use crate::wearable::{WearableParser, WearableSeries, WearableSummary};
use crate::{INSIGHT_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Producer metadata embedded in every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Everything derived from one profile (and optional wearable series)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilityReport {
    pub report_id: Uuid,
    pub computed_at_utc: String,
    pub producer: ReportProducer,
    pub baseline: BaselineWindow,
    pub estimate: FertilityEstimate,
    pub advisories: Vec<Advisory>,
    pub risk_factors: Vec<String>,
    pub health: HealthAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wearable: Option<WearableSummary>,
}

/// Build a full report.
///
/// Stages:
/// 1. Estimator - baseline and adjusted fertile window
/// 2. Advisory rules and risk factors
/// 3. Health assessment
/// 4. Wearable summary (when a non-empty series is supplied)
pub fn analyze(profile: &CycleProfile, wearable: Option<&WearableSeries>) -> FertilityReport {
    build_report(profile, wearable, &Uuid::new_v4().to_string())
}

fn build_report(
    profile: &CycleProfile,
    wearable: Option<&WearableSeries>,
    instance_id: &str,
) -> FertilityReport {
    let wearable = wearable.filter(|w| !w.is_empty());

    let report = FertilityReport {
        report_id: Uuid::new_v4(),
        computed_at_utc: Utc::now().to_rfc3339(),
        producer: ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: INSIGHT_VERSION.to_string(),
            instance_id: instance_id.to_string(),
        },
        baseline: Estimator::baseline(profile),
        estimate: Estimator::estimate(profile, wearable),
        advisories: advisory::evaluate(profile, wearable),
        risk_factors: advisory::risk_factors(profile),
        health: HealthAssessment::from_profile(profile),
        wearable: wearable.map(WearableSummary::from_series),
    };

    debug!(
        report_id = %report.report_id,
        advisories = report.advisories.len(),
        health = report.health.overall,
        "built fertility report"
    );
    report
}

fn parse_inputs(
    profile_json: &str,
    wearable_json: Option<&str>,
) -> Result<(CycleProfile, Option<WearableSeries>), InsightError> {
    let profile = CycleProfile::from_json(profile_json)?;
    let wearable = wearable_json.map(WearableParser::parse_array).transpose()?;
    Ok((profile, wearable))
}

/// Estimate from a profile JSON and an optional JSON array of wearable records.
///
/// # Example
/// ```ignore
/// let estimate = estimate_json(r#"{"startDate": "2024-01-01", "cycleLength": 28}"#, None)?;
/// ```
pub fn estimate_json(profile_json: &str, wearable_json: Option<&str>) -> Result<String, InsightError> {
    let (profile, wearable) = parse_inputs(profile_json, wearable_json)?;
    let estimate = Estimator::estimate(&profile, wearable.as_ref());
    serde_json::to_string(&estimate).map_err(|e| InsightError::EncodingError(e.to_string()))
}

/// Full report from a profile JSON and an optional JSON array of wearable records
pub fn report_json(profile_json: &str, wearable_json: Option<&str>) -> Result<String, InsightError> {
    let (profile, wearable) = parse_inputs(profile_json, wearable_json)?;
    let report = analyze(&profile, wearable.as_ref());
    serde_json::to_string(&report).map_err(|e| InsightError::EncodingError(e.to_string()))
}

/// Stateful processor holding the text generator and the chat session.
///
/// Estimation and reports never depend on the generator; only insights and chat do.
pub struct FertilityProcessor {
    generator: Option<Box<dyn TextGenerator>>,
    session: ChatSession,
    instance_id: String,
}

impl Default for FertilityProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FertilityProcessor {
    /// Create a processor without text generation
    pub fn new() -> Self {
        Self {
            generator: None,
            session: ChatSession::new(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_generator(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
            ..Self::new()
        }
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// Create a processor from configuration. Without a usable credential the
    /// assistant features degrade to fallbacks; this is reported once here.
    pub fn from_config(config: &InsightConfig) -> Self {
        match config.availability() {
            Availability::Available => match build_generator(config) {
                Ok(generator) => {
                    info!(model = %config.model, "text generation enabled");
                    Self::with_generator(generator)
                }
                Err(e) => {
                    warn!(error = %e, "text generation unavailable, assistant features disabled");
                    Self::new()
                }
            },
            Availability::Unavailable(reason) => {
                warn!(%reason, "text generation unavailable, assistant features disabled");
                Self::new()
            }
        }
    }

    pub fn ai_available(&self) -> bool {
        self.generator.is_some()
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn report(&self, profile: &CycleProfile, wearable: Option<&WearableSeries>) -> FertilityReport {
        build_report(profile, wearable, &self.instance_id)
    }

    /// Free-form insights for the profile. Errors are for the caller to display.
    pub fn insights(
        &self,
        profile: &CycleProfile,
        wearable: Option<&WearableSeries>,
    ) -> Result<String, GenerationError> {
        let generator = self.generator.as_deref().ok_or_else(|| {
            GenerationError::MissingCredential("text generation is not configured".to_string())
        })?;

        let prompt = prompts::insights_prompt(profile, wearable.filter(|w| !w.is_empty()));
        generator.generate(&prompt).map_err(|e| {
            warn!(error = %e, "insight generation failed");
            e
        })
    }

    /// Answer one chat question against the processor's session
    pub fn chat(
        &mut self,
        input: &str,
        profile: &CycleProfile,
        estimate: Option<&FertilityEstimate>,
    ) -> ChatReply {
        let assistant = ChatAssistant::new(self.generator.as_deref());
        assistant.respond(&mut self.session, input, profile, estimate)
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ChatSession {
        &mut self.session
    }

    /// Load a chat session from JSON
    pub fn load_session(&mut self, json: &str) -> Result<(), InsightError> {
        self.session =
            serde_json::from_str(json).map_err(|e| InsightError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Save the chat session to JSON
    pub fn save_session(&self) -> Result<String, InsightError> {
        serde_json::to_string(&self.session).map_err(|e| InsightError::EncodingError(e.to_string()))
    }
}

#[cfg(feature = "gemini")]
fn build_generator(config: &InsightConfig) -> Result<Box<dyn TextGenerator>, GenerationError> {
    let generator = crate::llm::GeminiGenerator::from_config(config)?;
    Ok(Box::new(generator))
}

#[cfg(not(feature = "gemini"))]
fn build_generator(_config: &InsightConfig) -> Result<Box<dyn TextGenerator>, GenerationError> {
    Err(GenerationError::MissingCredential(
        "built without the `gemini` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ReplySource;
    use crate::types::HealthCondition;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn profile() -> CycleProfile {
        CycleProfile::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 28)
    }

    fn sample_profile_json() -> &'static str {
        r#"{
            "startDate": "2024-01-01",
            "cycleLength": 28,
            "stressLevel": 9,
            "hydration": 4,
            "healthConditions": ["PCOS"]
        }"#
    }

    fn sample_wearable_json() -> &'static str {
        r#"[
            {"date": "2024-01-01", "BBT": 97.1, "Sleep": 6.5, "Steps": 4200},
            {"date": "2024-01-02", "BBT": 97.3, "Sleep": 6.0, "Steps": 3900},
            {"date": "2024-01-03", "BBT": 98.2, "Sleep": 6.2, "Steps": 5100}
        ]"#
    }

    #[test]
    fn test_report_json() {
        let json = report_json(sample_profile_json(), Some(sample_wearable_json())).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["producer"]["name"], "fertility-insight");
        assert_eq!(report["baseline"]["ovulation_date"], "2024-01-12");
        // three BBT samples: the peak on day 2 overrides the estimate
        assert_eq!(report["estimate"]["ovulation_date"], "2024-01-03");
        assert_eq!(report["estimate"]["wearable"]["blended"], false);
        assert_eq!(report["wearable"]["records"], 3);
        assert!(report["risk_factors"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r == "PCOS condition"));

        let rules: Vec<&str> = report["advisories"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|a| a["rule"].as_str())
            .collect();
        assert!(rules.contains(&"low_sleep_high_stress"));
        assert!(rules.contains(&"hydration_low"));
    }

    #[test]
    fn test_estimate_json_without_wearable() {
        let json = estimate_json(r#"{"startDate": "2024-01-01", "cycleLength": 28}"#, None).unwrap();
        let estimate: FertilityEstimate = serde_json::from_str(&json).unwrap();
        assert_eq!(
            estimate.fertile_window_start,
            NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
        );
        assert!(estimate.wearable.is_none());
    }

    #[test]
    fn test_invalid_profile_json() {
        assert!(matches!(
            estimate_json("not json", None),
            Err(InsightError::JsonError(_))
        ));
        assert!(estimate_json(sample_profile_json(), Some("{}")).is_err());
    }

    #[test]
    fn test_out_of_range_cycle_length_is_an_error() {
        let profile = r#"{"startDate": "2024-01-01", "cycleLength": 4000000000}"#;
        assert!(matches!(
            estimate_json(profile, None),
            Err(InsightError::InvalidProfile(_))
        ));
        assert!(matches!(
            report_json(profile, None),
            Err(InsightError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_empty_wearable_is_ignored() {
        let series = WearableSeries::default();
        let report = analyze(&profile(), Some(&series));
        assert!(report.wearable.is_none());
        assert!(report.estimate.wearable.is_none());
    }

    #[test]
    fn test_processor_without_generator() {
        let mut processor = FertilityProcessor::new().with_instance_id("test-instance");
        assert!(!processor.ai_available());

        let err = processor.insights(&profile(), None).unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential(_)));

        let reply = processor.chat("How can I reduce stress?", &profile(), None);
        assert_eq!(reply.source, ReplySource::Fallback);
        assert_eq!(processor.session().len(), 2);

        let report = processor.report(&profile(), None);
        assert_eq!(report.producer.instance_id, "test-instance");
    }

    #[test]
    fn test_processor_from_config_without_key() {
        let processor = FertilityProcessor::from_config(&InsightConfig::default());
        assert!(!processor.ai_available());
    }

    #[test]
    fn test_insights_prompt_reaches_generator() {
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);
        let generator = move |prompt: &str| -> Result<String, GenerationError> {
            *sink.borrow_mut() = prompt.to_string();
            Ok("Keep tracking.".to_string())
        };

        let mut p = profile();
        p.health_conditions.insert(HealthCondition::Pcos);
        let processor = FertilityProcessor::with_generator(Box::new(generator));
        let series = WearableParser::parse_array(sample_wearable_json()).unwrap();

        assert_eq!(processor.insights(&p, Some(&series)).unwrap(), "Keep tracking.");
        assert!(seen.borrow().contains("- Health conditions: PCOS"));
        assert!(seen.borrow().contains("- Average Sleep: 6.23"));
    }

    #[test]
    fn test_insights_error_is_returned() {
        let generator = |_: &str| -> Result<String, GenerationError> {
            Err(GenerationError::RateLimited("slow down".to_string()))
        };
        let processor = FertilityProcessor::with_generator(Box::new(generator));
        assert_eq!(
            processor.insights(&profile(), None),
            Err(GenerationError::RateLimited("slow down".to_string()))
        );
    }

    #[test]
    fn test_session_round_trip() {
        let mut processor = FertilityProcessor::new();
        processor.chat("What foods help fertility?", &profile(), None);
        let saved = processor.save_session().unwrap();

        let mut restored = FertilityProcessor::new();
        restored.load_session(&saved).unwrap();
        assert_eq!(restored.session(), processor.session());
    }
}
