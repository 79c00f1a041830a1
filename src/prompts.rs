//! Prompt assembly
//!
//! Builds the plain-text prompts handed to a text generator: one for
//! personalised insights and one for each chat turn.

use crate::chat::{ChatMessage, ChatRole};
use crate::types::{CycleProfile, FertilityEstimate};
use crate::wearable::WearableSeries;
use std::fmt::Write;

/// Number of transcript messages included as conversation context
pub const CONTEXT_MESSAGES: usize = 6;

pub const CHAT_SYSTEM_CONTEXT: &str = "\
You are an empathetic, knowledgeable fertility health assistant. Your role is to:

1. Provide accurate, evidence-based information about fertility and reproductive health
2. Be supportive and non-judgmental in all interactions
3. Encourage users to consult healthcare professionals for medical advice
4. Use clear, accessible language while being medically accurate
5. Focus on lifestyle factors, general wellness, and fertility awareness
6. Always prioritize user safety and well-being

Key topics you can help with:
- Menstrual cycle tracking and understanding
- Fertility awareness and natural family planning
- Lifestyle factors affecting fertility (nutrition, exercise, stress, sleep)
- General reproductive health education
- Emotional support and wellness tips
- When to seek professional medical help

Remember: You are not a substitute for professional medical advice. Always recommend consulting healthcare providers for personalized medical concerns.";

const CHAT_GUIDELINES: &str = "\
Please provide a helpful, empathetic response that:
1. Directly addresses the user's question
2. Uses the provided context when relevant
3. Provides practical, actionable advice
4. Encourages professional medical consultation when appropriate
5. Maintains a supportive and positive tone

Response format:
- Start with a brief, empathetic acknowledgment
- Provide clear, practical information
- End with an encouraging note or next step suggestion
- Keep the response conversational and easy to understand";

const INSIGHTS_PREAMBLE: &str = "You are a fertility health assistant. Given the following data, \
provide personalized fertility and lifestyle insights:";

pub const NO_PREDICTION: &str = "No fertility predictions available yet.";

fn join_or_none<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

/// Profile block shared by both prompts
pub fn profile_summary(profile: &CycleProfile) -> String {
    let medications = if profile.medications.trim().is_empty() {
        "None"
    } else {
        profile.medications.trim()
    };

    let mut out = String::from("User Profile:\n");
    let _ = writeln!(out, "- Menstrual cycle start date: {}", profile.cycle_start_date.format("%Y-%m-%d"));
    let _ = writeln!(out, "- Average cycle length: {} days", profile.cycle_length_days);
    let _ = writeln!(out, "- Period duration: {} days", profile.period_duration_days);
    let _ = writeln!(out, "- Flow intensity: {}", profile.flow_intensity.as_str());
    let _ = writeln!(out, "- Current BBT: {:.1}°F", profile.current_bbt);
    let _ = writeln!(out, "- BBT tracking method: {}", profile.bbt_tracking_method.as_str());
    let _ = writeln!(out, "- BBT measurement consistency: {}/10", profile.bbt_consistency);
    let _ = writeln!(out, "- Stress level (1-10): {}", profile.stress_level);
    let _ = writeln!(out, "- Daily hydration (cups): {}", profile.hydration_cups);
    let _ = writeln!(out, "- Nutrition quality: {}", profile.nutrition_quality.as_str());
    let _ = writeln!(out, "- Average sleep hours: {}", profile.sleep_hours);
    let _ = writeln!(out, "- Exercise frequency: {}", profile.exercise_frequency.as_str());
    let _ = writeln!(out, "- Alcohol consumption: {}", profile.alcohol_consumption.as_str());
    let _ = writeln!(out, "- Smoking status: {}", profile.smoking_status.as_str());
    let _ = writeln!(out, "- Current supplements: {}", join_or_none(&profile.supplements));
    let _ = writeln!(
        out,
        "- Health conditions: {}",
        join_or_none(profile.health_conditions.iter().map(|c| c.as_str()))
    );
    let _ = write!(out, "- Current medications: {}", medications);
    out
}

/// Prediction block, or the placeholder when nothing has been estimated
pub fn estimate_summary(estimate: Option<&FertilityEstimate>) -> String {
    match estimate {
        None => NO_PREDICTION.to_string(),
        Some(e) => format!(
            "Current Fertility Predictions:\n\
             - Fertile window: {} - {}\n\
             - Predicted ovulation: {}\n\
             - Confidence: {}%",
            e.fertile_window_start.format("%B %d"),
            e.fertile_window_end.format("%B %d"),
            e.ovulation_date.format("%B %d"),
            e.confidence_percent()
        ),
    }
}

/// One `- Average <channel>: <mean>` line per channel that has values
pub fn wearable_summary(series: &WearableSeries) -> String {
    series
        .channel_names()
        .into_iter()
        .filter_map(|channel| {
            series
                .mean(channel)
                .map(|avg| format!("- Average {}: {:.2}\n", channel, avg))
        })
        .collect()
}

pub fn insights_prompt(profile: &CycleProfile, wearable: Option<&WearableSeries>) -> String {
    let mut prompt = format!("{}\n\n{}\n", INSIGHTS_PREAMBLE, profile_summary(profile));
    if let Some(series) = wearable {
        prompt.push_str("\nWearable data summary:\n");
        prompt.push_str(&wearable_summary(series));
    }
    prompt
}

/// Last few transcript messages as `User:` / `Assistant:` lines
pub fn conversation_context(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let recent = &history[history.len().saturating_sub(CONTEXT_MESSAGES)..];
    let mut out = String::from("Recent conversation context:");
    for message in recent {
        let role = match message.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        let _ = write!(out, "\n{}: {}", role, message.content);
    }
    out
}

pub fn chat_prompt(
    profile: &CycleProfile,
    estimate: Option<&FertilityEstimate>,
    history: &[ChatMessage],
    question: &str,
) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n{}\n\nUser Question: {}\n\n{}\n",
        CHAT_SYSTEM_CONTEXT,
        profile_summary(profile),
        estimate_summary(estimate),
        conversation_context(history),
        question,
        CHAT_GUIDELINES
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate;
    use crate::types::HealthCondition;
    use crate::wearable::{WearableRecord, BBT_CHANNEL, DATE_COLUMN, STEPS_CHANNEL};
    use chrono::NaiveDate;

    fn profile() -> CycleProfile {
        CycleProfile::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 28)
    }

    #[test]
    fn test_profile_summary() {
        let mut p = profile();
        p.health_conditions.insert(HealthCondition::ThyroidIssues);
        p.supplements = vec!["Folic acid".into(), "Vitamin D".into()];

        let summary = profile_summary(&p);
        assert!(summary.starts_with("User Profile:\n"));
        assert!(summary.contains("- Menstrual cycle start date: 2024-01-01"));
        assert!(summary.contains("- Health conditions: Thyroid Issues"));
        assert!(summary.contains("- Current supplements: Folic acid, Vitamin D"));
        assert!(summary.ends_with("- Current medications: None"));
    }

    #[test]
    fn test_estimate_summary() {
        assert_eq!(estimate_summary(None), NO_PREDICTION);

        let e = estimate(&profile(), None);
        let summary = estimate_summary(Some(&e));
        assert!(summary.contains("- Fertile window: January 09 - January 14"));
        assert!(summary.contains("- Predicted ovulation: January 12"));
        assert!(summary.contains("- Confidence: 75%"));
    }

    #[test]
    fn test_insights_prompt_lists_wearable_averages() {
        let series = WearableSeries::new(
            vec![
                WearableRecord::new(NaiveDate::from_ymd_opt(2024, 1, 1))
                    .with(BBT_CHANNEL, 97.0)
                    .with(STEPS_CHANNEL, 5000.0),
                WearableRecord::new(NaiveDate::from_ymd_opt(2024, 1, 2))
                    .with(BBT_CHANNEL, 97.5)
                    .with(STEPS_CHANNEL, 6001.0),
            ],
            vec![DATE_COLUMN.into(), BBT_CHANNEL.into(), STEPS_CHANNEL.into()],
        );

        let prompt = insights_prompt(&profile(), Some(&series));
        assert!(prompt.starts_with(INSIGHTS_PREAMBLE));
        assert!(prompt.contains("\nWearable data summary:\n- Average BBT: 97.25\n- Average Steps: 5500.50\n"));
        assert!(!prompt.contains("Average date"));

        assert!(!insights_prompt(&profile(), None).contains("Wearable"));
    }

    #[test]
    fn test_conversation_context_keeps_last_six() {
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {}", i))
                } else {
                    ChatMessage::assistant(format!("answer {}", i))
                }
            })
            .collect();

        let context = conversation_context(&history);
        assert!(!context.contains("question 0"));
        assert!(!context.contains("answer 1"));
        assert!(context.contains("User: question 2"));
        assert!(context.ends_with("Assistant: answer 7"));
        assert_eq!(conversation_context(&[]), "");
    }

    #[test]
    fn test_chat_prompt_sections() {
        let prompt = chat_prompt(&profile(), None, &[], "How long is a cycle?");
        assert!(prompt.starts_with(CHAT_SYSTEM_CONTEXT));
        assert!(prompt.contains(NO_PREDICTION));
        assert!(prompt.contains("User Question: How long is a cycle?"));
        assert!(prompt.contains("Response format:"));
    }
}
