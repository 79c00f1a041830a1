//! Chat assistant
//!
//! Session transcript, input validation, keyword fallback replies and the
//! medical disclaimer. Replies come from a `TextGenerator` when one is
//! available; any generation failure is logged and answered from the fallback
//! table instead.

use crate::llm::TextGenerator;
use crate::prompts;
use crate::types::{CycleProfile, FertilityEstimate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DISCLAIMER: &str = "\n\n*Remember: This is general information only. Please consult with a healthcare provider for personalized medical advice.*";

const DISCLAIMER_KEYWORDS: [&str; 6] = [
    "fertility",
    "pregnancy",
    "period",
    "cycle",
    "ovulation",
    "symptoms",
];

const BLOCKED_KEYWORDS: [&str; 4] = ["inject", "script", "eval", "exec"];

const MIN_QUESTION_CHARS: usize = 3;

const FERTILITY_REPLY: &str = "I understand you're interested in fertility topics. While I can't provide personalized medical advice, I can share some general information about fertility awareness and lifestyle factors that may support reproductive health. Consider consulting with a healthcare provider for personalized guidance.";
const CYCLE_REPLY: &str = "Menstrual cycle tracking can be very helpful for understanding your body better. General tips include tracking your cycle length, noting any symptoms, and maintaining a healthy lifestyle. A healthcare provider can help you interpret your specific patterns.";
const NUTRITION_REPLY: &str = "Good nutrition plays an important role in overall health. Focus on a balanced diet rich in fruits, vegetables, whole grains, and lean proteins. Staying hydrated and maintaining a healthy weight can support overall wellness.";
const STRESS_REPLY: &str = "Stress management is important for overall health. Consider practices like regular exercise, meditation, adequate sleep, and activities you enjoy. If stress is significantly impacting your life, consider speaking with a healthcare professional.";
const HELP_REPLY: &str = "I'm here to help with general information about fertility awareness and reproductive health. For personalized medical advice, diagnosis, or treatment, please consult with a qualified healthcare provider.";
const EXERCISE_REPLY: &str = "Moderate exercise 3-4 times weekly supports fertility. Avoid excessive high-intensity workouts that may affect your cycle.";
const SLEEP_REPLY: &str = "Aim for 7-9 hours nightly. Keep consistent sleep schedule and relaxing bedtime routine for hormonal balance.";
const BBT_REPLY: &str = "Measure BBT at same time daily. Track consistently for several cycles to identify ovulation patterns. Consult doctor for interpretation.";

pub const DEFAULT_REPLY: &str = "I appreciate you reaching out with your question. While I'm designed to provide general information about fertility and reproductive health, I always recommend consulting with healthcare professionals for personalized advice and concerns.";

/// Keyword to reply table; the first keyword contained in the question wins
pub const FALLBACK_RESPONSES: &[(&str, &str)] = &[
    ("fertility", FERTILITY_REPLY),
    ("cycle", CYCLE_REPLY),
    ("nutrition", NUTRITION_REPLY),
    ("stress", STRESS_REPLY),
    ("help", HELP_REPLY),
    ("conceive", FERTILITY_REPLY),
    ("period", CYCLE_REPLY),
    ("diet", NUTRITION_REPLY),
    ("food", NUTRITION_REPLY),
    ("anxiety", STRESS_REPLY),
    ("exercise", EXERCISE_REPLY),
    ("workout", EXERCISE_REPLY),
    ("sleep", SLEEP_REPLY),
    ("bbt", BBT_REPLY),
    ("temperature", BBT_REPLY),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Per-session chat state: an append-only transcript and whether the chat panel is open
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    active: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the active flag and return the new state
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The last `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        &self.messages[self.messages.len().saturating_sub(n)..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Check a question before it goes anywhere. Returns the trimmed question, or
/// the guidance message to show instead.
pub fn validate_input(input: &str) -> Result<String, String> {
    if input.is_empty() {
        return Err("Please provide a valid question.".to_string());
    }

    let trimmed = input.trim();
    if trimmed.chars().count() < MIN_QUESTION_CHARS {
        return Err("Please provide a more detailed question.".to_string());
    }

    let lower = trimmed.to_lowercase();
    if BLOCKED_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Err("I cannot process that type of request.".to_string());
    }

    Ok(trimmed.to_string())
}

/// Canned reply for a question, by first matching keyword
pub fn fallback_response(question: &str) -> &'static str {
    let lower = question.to_lowercase();
    FALLBACK_RESPONSES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

pub fn needs_disclaimer(question: &str) -> bool {
    let lower = question.to_lowercase();
    DISCLAIMER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Suggested starter questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickQuestion {
    FertilityTips,
    CycleTracking,
    Nutrition,
    StressManagement,
    WhenToSeekHelp,
    LifestyleFactors,
}

impl QuickQuestion {
    pub const ALL: [QuickQuestion; 6] = [
        QuickQuestion::FertilityTips,
        QuickQuestion::CycleTracking,
        QuickQuestion::Nutrition,
        QuickQuestion::StressManagement,
        QuickQuestion::WhenToSeekHelp,
        QuickQuestion::LifestyleFactors,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuickQuestion::FertilityTips => "Fertility Tips",
            QuickQuestion::CycleTracking => "Cycle Tracking",
            QuickQuestion::Nutrition => "Nutrition Advice",
            QuickQuestion::StressManagement => "Stress Management",
            QuickQuestion::WhenToSeekHelp => "When to Seek Help",
            QuickQuestion::LifestyleFactors => "Lifestyle Factors",
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            QuickQuestion::FertilityTips => "What are some general tips to support fertility?",
            QuickQuestion::CycleTracking => "How can I better track my menstrual cycle?",
            QuickQuestion::Nutrition => "What foods support reproductive health?",
            QuickQuestion::StressManagement => "How can I manage stress to support my health?",
            QuickQuestion::WhenToSeekHelp => "When should I see a doctor about fertility concerns?",
            QuickQuestion::LifestyleFactors => "What lifestyle factors affect fertility?",
        }
    }
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Generated,
    Fallback,
    /// The question failed validation and was not answered
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub source: ReplySource,
}

/// Answers chat questions against a session transcript
pub struct ChatAssistant<'a> {
    generator: Option<&'a dyn TextGenerator>,
}

impl<'a> ChatAssistant<'a> {
    pub fn new(generator: Option<&'a dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Validate, answer and record one question. Rejected input is answered with
    /// its guidance message and leaves the transcript untouched.
    pub fn respond(
        &self,
        session: &mut ChatSession,
        input: &str,
        profile: &CycleProfile,
        estimate: Option<&FertilityEstimate>,
    ) -> ChatReply {
        let question = match validate_input(input) {
            Ok(q) => q,
            Err(guidance) => {
                debug!("chat input rejected");
                return ChatReply {
                    content: guidance,
                    source: ReplySource::Rejected,
                };
            }
        };

        let (mut content, source) = match self.generator {
            Some(generator) => {
                let prompt = prompts::chat_prompt(profile, estimate, session.messages(), &question);
                match generator.generate(&prompt) {
                    Ok(text) => (text, ReplySource::Generated),
                    Err(e) => {
                        warn!(error = %e, "chat generation failed, using fallback reply");
                        (fallback_response(&question).to_string(), ReplySource::Fallback)
                    }
                }
            }
            None => (fallback_response(&question).to_string(), ReplySource::Fallback),
        };

        if needs_disclaimer(&question) {
            content.push_str(DISCLAIMER);
        }

        session.push(ChatMessage::user(question));
        session.push(ChatMessage::assistant(content.clone()));

        ChatReply { content, source }
    }
}
