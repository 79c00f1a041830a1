//! Lifestyle advisories
//!
//! A flat table of independent threshold rules. Every rule whose predicate
//! matches fires, in table order; there is no short-circuiting and no state.

use crate::types::{
    AlcoholConsumption, CycleProfile, ExerciseFrequency, HealthCondition, NutritionQuality,
    SmokingStatus,
};
use crate::wearable::{WearableSeries, SLEEP_CHANNEL, STEPS_CHANNEL};
use serde::{Deserialize, Serialize};

/// Advisory severity, from reassuring to urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryCategory {
    WearableSleep,
    WearableActivity,
    Sleep,
    Stress,
    Hydration,
    Nutrition,
    Exercise,
    BbtTracking,
    HealthConditions,
    Combined,
}

/// A fired advisory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub rule: String,
    pub category: AdvisoryCategory,
    pub severity: Severity,
    pub message: String,
}

/// Inputs visible to advisory predicates
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    pub profile: &'a CycleProfile,
    /// Mean of the wearable Sleep channel, hours
    pub wearable_sleep_avg: Option<f64>,
    /// Mean of the wearable Steps channel
    pub wearable_steps_avg: Option<f64>,
}

impl<'a> AdvisoryContext<'a> {
    pub fn new(profile: &'a CycleProfile, wearable: Option<&WearableSeries>) -> Self {
        Self {
            profile,
            wearable_sleep_avg: wearable.and_then(|w| w.mean(SLEEP_CHANNEL)),
            wearable_steps_avg: wearable.and_then(|w| w.mean(STEPS_CHANNEL)),
        }
    }
}

/// One row of the rule table
pub struct AdvisoryRule {
    pub id: &'static str,
    pub category: AdvisoryCategory,
    pub severity: Severity,
    pub message: &'static str,
    pub predicate: fn(&AdvisoryContext) -> bool,
}

impl AdvisoryRule {
    fn fire(&self) -> Advisory {
        Advisory {
            rule: self.id.to_string(),
            category: self.category,
            severity: self.severity,
            message: self.message.to_string(),
        }
    }
}

fn sleep_avg_in(ctx: &AdvisoryContext, lo: f64, hi: f64) -> bool {
    ctx.wearable_sleep_avg.map_or(false, |avg| avg >= lo && avg < hi)
}

fn steps_avg_in(ctx: &AdvisoryContext, lo: f64, hi: f64) -> bool {
    ctx.wearable_steps_avg.map_or(false, |avg| avg >= lo && avg < hi)
}

/// The rule table, in evaluation order
pub static ADVISORY_RULES: &[AdvisoryRule] = &[
    AdvisoryRule {
        id: "wearable_sleep_low",
        category: AdvisoryCategory::WearableSleep,
        severity: Severity::Warning,
        message: "Your average sleep is below 6 hours. Aim for 7-9 hours.",
        predicate: |ctx| sleep_avg_in(ctx, f64::NEG_INFINITY, 6.0),
    },
    AdvisoryRule {
        id: "wearable_sleep_fair",
        category: AdvisoryCategory::WearableSleep,
        severity: Severity::Info,
        message: "Sleep is slightly below optimal.",
        predicate: |ctx| sleep_avg_in(ctx, 6.0, 7.0),
    },
    AdvisoryRule {
        id: "wearable_sleep_good",
        category: AdvisoryCategory::WearableSleep,
        severity: Severity::Success,
        message: "Great sleep habits!",
        predicate: |ctx| sleep_avg_in(ctx, 7.0, f64::INFINITY),
    },
    AdvisoryRule {
        id: "wearable_steps_low",
        category: AdvisoryCategory::WearableActivity,
        severity: Severity::Warning,
        message: "Low daily activity detected (<3000 steps).",
        predicate: |ctx| steps_avg_in(ctx, f64::NEG_INFINITY, 3000.0),
    },
    AdvisoryRule {
        id: "wearable_steps_moderate",
        category: AdvisoryCategory::WearableActivity,
        severity: Severity::Info,
        message: "Moderate activity level.",
        predicate: |ctx| steps_avg_in(ctx, 3000.0, 7000.0),
    },
    AdvisoryRule {
        id: "wearable_steps_high",
        category: AdvisoryCategory::WearableActivity,
        severity: Severity::Success,
        message: "Excellent activity levels!",
        predicate: |ctx| steps_avg_in(ctx, 7000.0, f64::INFINITY),
    },
    AdvisoryRule {
        id: "sleep_short",
        category: AdvisoryCategory::Sleep,
        severity: Severity::Warning,
        message: "Sleeping under 6 hours can delay ovulation. Aim for 7-9 hours.",
        predicate: |ctx| ctx.profile.sleep_hours < 6.0,
    },
    AdvisoryRule {
        id: "stress_high",
        category: AdvisoryCategory::Stress,
        severity: Severity::Warning,
        message: "High stress levels can affect your cycle. Try relaxation techniques.",
        predicate: |ctx| ctx.profile.stress_level >= 8,
    },
    AdvisoryRule {
        id: "stress_moderate",
        category: AdvisoryCategory::Stress,
        severity: Severity::Info,
        message: "Moderate stress levels. Manage stress for better health.",
        predicate: |ctx| (5..8).contains(&ctx.profile.stress_level),
    },
    AdvisoryRule {
        id: "stress_low",
        category: AdvisoryCategory::Stress,
        severity: Severity::Success,
        message: "Low stress levels, great!",
        predicate: |ctx| ctx.profile.stress_level < 5,
    },
    AdvisoryRule {
        id: "hydration_low",
        category: AdvisoryCategory::Hydration,
        severity: Severity::Warning,
        message: "Low water intake. Stay hydrated!",
        predicate: |ctx| ctx.profile.hydration_cups < 6,
    },
    AdvisoryRule {
        id: "hydration_fair",
        category: AdvisoryCategory::Hydration,
        severity: Severity::Info,
        message: "Decent hydration, but drink more if possible.",
        predicate: |ctx| (6..10).contains(&ctx.profile.hydration_cups),
    },
    AdvisoryRule {
        id: "hydration_good",
        category: AdvisoryCategory::Hydration,
        severity: Severity::Success,
        message: "Excellent hydration!",
        predicate: |ctx| ctx.profile.hydration_cups >= 10,
    },
    AdvisoryRule {
        id: "nutrition_poor",
        category: AdvisoryCategory::Nutrition,
        severity: Severity::Warning,
        message: "Poor nutrition. Consider a balanced diet.",
        predicate: |ctx| ctx.profile.nutrition_quality == NutritionQuality::Poor,
    },
    AdvisoryRule {
        id: "nutrition_average",
        category: AdvisoryCategory::Nutrition,
        severity: Severity::Info,
        message: "Average diet. Try adding more nutrients.",
        predicate: |ctx| ctx.profile.nutrition_quality == NutritionQuality::Average,
    },
    AdvisoryRule {
        id: "nutrition_good",
        category: AdvisoryCategory::Nutrition,
        severity: Severity::Success,
        message: "Great nutrition!",
        predicate: |ctx| {
            matches!(
                ctx.profile.nutrition_quality,
                NutritionQuality::Good | NutritionQuality::Excellent
            )
        },
    },
    AdvisoryRule {
        id: "exercise_none",
        category: AdvisoryCategory::Exercise,
        severity: Severity::Warning,
        message: "No regular exercise. Gentle daily movement supports a regular cycle.",
        predicate: |ctx| ctx.profile.exercise_frequency == ExerciseFrequency::None,
    },
    AdvisoryRule {
        id: "exercise_high",
        category: AdvisoryCategory::Exercise,
        severity: Severity::Success,
        message: "Excellent exercise routine!",
        predicate: |ctx| ctx.profile.exercise_frequency == ExerciseFrequency::High,
    },
    AdvisoryRule {
        id: "bbt_not_tracking",
        category: AdvisoryCategory::BbtTracking,
        severity: Severity::Info,
        message: "Consider tracking BBT for more accurate predictions.",
        predicate: |ctx| !ctx.profile.bbt_tracking_method.is_tracking(),
    },
    AdvisoryRule {
        id: "bbt_consistent",
        category: AdvisoryCategory::BbtTracking,
        severity: Severity::Success,
        message: "Consistent BBT tracking improves prediction accuracy.",
        predicate: |ctx| {
            ctx.profile.bbt_tracking_method.is_tracking() && ctx.profile.bbt_consistency >= 8
        },
    },
    AdvisoryRule {
        id: "pcos",
        category: AdvisoryCategory::HealthConditions,
        severity: Severity::Warning,
        message: "PCOS can make ovulation irregular. The fertile window has been widened.",
        predicate: |ctx| ctx.profile.has_condition(HealthCondition::Pcos),
    },
    AdvisoryRule {
        id: "thyroid",
        category: AdvisoryCategory::HealthConditions,
        severity: Severity::Warning,
        message: "Thyroid issues can shift ovulation. Keep thyroid levels monitored.",
        predicate: |ctx| ctx.profile.has_condition(HealthCondition::ThyroidIssues),
    },
    AdvisoryRule {
        id: "low_sleep_high_stress",
        category: AdvisoryCategory::Combined,
        severity: Severity::Error,
        message: "Low sleep combined with high stress can affect your cycle. Prioritize rest and stress reduction.",
        predicate: |ctx| {
            ctx.wearable_sleep_avg.map_or(false, |avg| avg < 7.0) && ctx.profile.stress_level >= 7
        },
    },
];

/// Evaluate every rule against the profile and optional wearable series
pub fn evaluate(profile: &CycleProfile, wearable: Option<&WearableSeries>) -> Vec<Advisory> {
    evaluate_context(&AdvisoryContext::new(profile, wearable))
}

pub fn evaluate_context(ctx: &AdvisoryContext) -> Vec<Advisory> {
    ADVISORY_RULES
        .iter()
        .filter(|rule| (rule.predicate)(ctx))
        .map(AdvisoryRule::fire)
        .collect()
}

/// Named fertility risk factors present in the profile
pub fn risk_factors(profile: &CycleProfile) -> Vec<String> {
    let checks = [
        (profile.sleep_hours < 6.0, "Sleep deprivation"),
        (profile.stress_level >= 8, "High stress levels"),
        (
            profile.exercise_frequency == ExerciseFrequency::None,
            "Sedentary lifestyle",
        ),
        (
            profile.nutrition_quality == NutritionQuality::Poor,
            "Poor nutrition",
        ),
        (
            profile.alcohol_consumption == AlcoholConsumption::Frequent,
            "Excessive alcohol consumption",
        ),
        (
            profile.smoking_status == SmokingStatus::CurrentSmoker,
            "Smoking",
        ),
        (profile.has_condition(HealthCondition::Pcos), "PCOS condition"),
        (
            profile.has_condition(HealthCondition::ThyroidIssues),
            "Thyroid dysfunction",
        ),
    ];

    checks
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, name)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BbtTrackingMethod;
    use crate::wearable::WearableRecord;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn profile() -> CycleProfile {
        CycleProfile::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 28)
    }

    fn rules(advisories: &[Advisory]) -> Vec<&str> {
        advisories.iter().map(|a| a.rule.as_str()).collect()
    }

    fn wearable(sleep: f64, steps: f64) -> WearableSeries {
        WearableSeries::from_records(vec![WearableRecord::new(None)
            .with(SLEEP_CHANNEL, sleep)
            .with(STEPS_CHANNEL, steps)])
    }

    #[test]
    fn test_default_profile() {
        let advisories = evaluate(&profile(), None);
        assert_eq!(
            rules(&advisories),
            vec![
                "stress_moderate",
                "hydration_fair",
                "nutrition_good",
                "bbt_not_tracking"
            ]
        );
    }

    #[test]
    fn test_all_matching_rules_fire() {
        let mut p = profile();
        p.stress_level = 9;
        p.hydration_cups = 4;
        p.nutrition_quality = NutritionQuality::Poor;
        p.sleep_hours = 5.0;

        let advisories = evaluate(&p, Some(&wearable(5.5, 2500.0)));
        assert_eq!(
            rules(&advisories),
            vec![
                "wearable_sleep_low",
                "wearable_steps_low",
                "sleep_short",
                "stress_high",
                "hydration_low",
                "nutrition_poor",
                "bbt_not_tracking",
                "low_sleep_high_stress",
            ]
        );
        assert_eq!(advisories.last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_wearable_bands() {
        let fair = evaluate(&profile(), Some(&wearable(6.5, 5000.0)));
        assert!(rules(&fair).contains(&"wearable_sleep_fair"));
        assert!(rules(&fair).contains(&"wearable_steps_moderate"));

        let good = evaluate(&profile(), Some(&wearable(7.0, 7000.0)));
        assert!(rules(&good).contains(&"wearable_sleep_good"));
        assert!(rules(&good).contains(&"wearable_steps_high"));
    }

    #[test]
    fn test_combined_rule_needs_wearable_sleep() {
        let mut p = profile();
        p.stress_level = 7;
        p.sleep_hours = 5.0;
        assert!(!rules(&evaluate(&p, None)).contains(&"low_sleep_high_stress"));
        assert!(rules(&evaluate(&p, Some(&wearable(6.9, 8000.0)))).contains(&"low_sleep_high_stress"));
    }

    #[test]
    fn test_bbt_and_conditions() {
        let mut p = profile();
        p.bbt_tracking_method = BbtTrackingMethod::Oral;
        p.bbt_consistency = 9;
        p.health_conditions.insert(HealthCondition::Pcos);
        p.health_conditions.insert(HealthCondition::ThyroidIssues);

        let fired = evaluate(&p, None);
        let ids = rules(&fired);
        assert!(ids.contains(&"bbt_consistent"));
        assert!(!ids.contains(&"bbt_not_tracking"));
        assert!(ids.contains(&"pcos"));
        assert!(ids.contains(&"thyroid"));
    }

    #[test]
    fn test_risk_factors() {
        assert!(risk_factors(&profile()).is_empty());

        let mut p = profile();
        p.sleep_hours = 5.5;
        p.exercise_frequency = ExerciseFrequency::None;
        p.alcohol_consumption = AlcoholConsumption::Frequent;
        p.smoking_status = SmokingStatus::CurrentSmoker;
        p.health_conditions.insert(HealthCondition::Pcos);

        assert_eq!(
            risk_factors(&p),
            vec![
                "Sleep deprivation",
                "Sedentary lifestyle",
                "Excessive alcohol consumption",
                "Smoking",
                "PCOS condition",
            ]
        );
    }
}
