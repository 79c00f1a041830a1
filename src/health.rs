//! Composite health score
//!
//! Scores six lifestyle categories on a 0-100 scale and combines them into an
//! overall score with a descriptive band.

use crate::types::{CycleProfile, ExerciseFrequency, NutritionQuality};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    Sleep,
    StressManagement,
    Nutrition,
    Hydration,
    Exercise,
    BbtTracking,
}

impl HealthCategory {
    pub fn label(&self) -> &'static str {
        match self {
            HealthCategory::Sleep => "Sleep",
            HealthCategory::StressManagement => "Stress Management",
            HealthCategory::Nutrition => "Nutrition",
            HealthCategory::Hydration => "Hydration",
            HealthCategory::Exercise => "Exercise",
            HealthCategory::BbtTracking => "BBT Tracking",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: HealthCategory,
    /// 0-100
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Excellent,
    Good,
    Moderate,
    NeedsAttention,
}

impl HealthBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => HealthBand::Excellent,
            60..=79 => HealthBand::Good,
            40..=59 => HealthBand::Moderate,
            _ => HealthBand::NeedsAttention,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            HealthBand::Excellent => {
                "Excellent Health Profile: Your lifestyle choices strongly support reproductive health!"
            }
            HealthBand::Good => {
                "Good Health Profile: You're on the right track with room for improvement."
            }
            HealthBand::Moderate => {
                "Moderate Health Profile: Consider focusing on key areas for better fertility outcomes."
            }
            HealthBand::NeedsAttention => {
                "Health Profile Needs Attention: Prioritize lifestyle changes to support fertility."
            }
        }
    }
}

/// Per-category scores and their rounded mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub scores: Vec<CategoryScore>,
    pub overall: u32,
    pub band: HealthBand,
    pub message: String,
}

impl HealthAssessment {
    pub fn from_profile(profile: &CycleProfile) -> Self {
        let scores = vec![
            CategoryScore {
                category: HealthCategory::Sleep,
                score: sleep_score(profile.sleep_hours),
            },
            CategoryScore {
                category: HealthCategory::StressManagement,
                score: (100 - 10 * profile.stress_level as i32).max(0) as u32,
            },
            CategoryScore {
                category: HealthCategory::Nutrition,
                score: nutrition_score(profile.nutrition_quality),
            },
            CategoryScore {
                category: HealthCategory::Hydration,
                score: hydration_score(profile.hydration_cups),
            },
            CategoryScore {
                category: HealthCategory::Exercise,
                score: exercise_score(profile.exercise_frequency),
            },
            CategoryScore {
                category: HealthCategory::BbtTracking,
                score: bbt_score(profile),
            },
        ];

        let total: u32 = scores.iter().map(|s| s.score).sum();
        let overall = (total as f64 / scores.len() as f64).round() as u32;
        let band = HealthBand::from_score(overall);

        Self {
            scores,
            overall,
            band,
            message: band.message().to_string(),
        }
    }

    pub fn score(&self, category: HealthCategory) -> Option<u32> {
        self.scores
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.score)
    }
}

fn sleep_score(hours: f64) -> u32 {
    if hours >= 8.0 {
        100
    } else if hours >= 7.0 {
        80
    } else if hours >= 6.0 {
        60
    } else {
        30
    }
}

fn nutrition_score(quality: NutritionQuality) -> u32 {
    match quality {
        NutritionQuality::Poor => 20,
        NutritionQuality::Average => 50,
        NutritionQuality::Good => 80,
        NutritionQuality::Excellent => 100,
    }
}

fn hydration_score(cups: u8) -> u32 {
    match cups {
        10.. => 100,
        8..=9 => 80,
        6..=7 => 60,
        _ => 40,
    }
}

fn exercise_score(frequency: ExerciseFrequency) -> u32 {
    match frequency {
        ExerciseFrequency::None => 20,
        ExerciseFrequency::Low => 50,
        ExerciseFrequency::Medium => 80,
        ExerciseFrequency::High => 90,
    }
}

fn bbt_score(profile: &CycleProfile) -> u32 {
    if !profile.bbt_tracking_method.is_tracking() {
        0
    } else if profile.bbt_consistency >= 8 {
        100
    } else if profile.bbt_consistency >= 6 {
        70
    } else {
        40
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BbtTrackingMethod;
    use chrono::NaiveDate;

    fn profile() -> CycleProfile {
        CycleProfile::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 28)
    }

    #[test]
    fn test_default_profile_scores() {
        let assessment = HealthAssessment::from_profile(&profile());

        assert_eq!(assessment.score(HealthCategory::Sleep), Some(100));
        assert_eq!(assessment.score(HealthCategory::StressManagement), Some(50));
        assert_eq!(assessment.score(HealthCategory::BbtTracking), Some(0));
        // (100 + 50 + 80 + 80 + 80 + 0) / 6
        assert_eq!(assessment.overall, 65);
        assert_eq!(assessment.band, HealthBand::Good);
        assert!(assessment.message.starts_with("Good Health Profile"));
    }

    #[test]
    fn test_excellent_profile() {
        let mut p = profile();
        p.stress_level = 1;
        p.hydration_cups = 12;
        p.nutrition_quality = NutritionQuality::Excellent;
        p.exercise_frequency = ExerciseFrequency::High;
        p.bbt_tracking_method = BbtTrackingMethod::Vaginal;
        p.bbt_consistency = 8;

        let assessment = HealthAssessment::from_profile(&p);
        // (100 + 90 + 100 + 100 + 90 + 100) / 6 = 96.67
        assert_eq!(assessment.overall, 97);
        assert_eq!(assessment.band, HealthBand::Excellent);
    }

    #[test]
    fn test_poor_profile() {
        let mut p = profile();
        p.sleep_hours = 4.5;
        p.stress_level = 12;
        p.hydration_cups = 2;
        p.nutrition_quality = NutritionQuality::Poor;
        p.exercise_frequency = ExerciseFrequency::None;

        let assessment = HealthAssessment::from_profile(&p);
        assert_eq!(assessment.score(HealthCategory::StressManagement), Some(0));
        // (30 + 0 + 20 + 40 + 20 + 0) / 6 = 18.33
        assert_eq!(assessment.overall, 18);
        assert_eq!(assessment.band, HealthBand::NeedsAttention);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(HealthBand::from_score(80), HealthBand::Excellent);
        assert_eq!(HealthBand::from_score(79), HealthBand::Good);
        assert_eq!(HealthBand::from_score(40), HealthBand::Moderate);
        assert_eq!(HealthBand::from_score(39), HealthBand::NeedsAttention);
    }
}
