//! Core types for fertility estimation
//!
//! This module defines the data that flows through the crate: the cycle and
//! lifestyle profile collected from the user, and the estimate produced from it.
//! Enum variants accept both their Rust names and the labels used by the intake
//! form (`"Very Heavy"`, `"Not Tracking"`, `"3-4 times/week"`, ...).

use crate::error::InsightError;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Cycle lengths the estimator is defined for
pub const CYCLE_LENGTH_RANGE: RangeInclusive<u32> = 20..=40;
/// Years accepted for the cycle start date
pub const CYCLE_START_YEAR_RANGE: RangeInclusive<i32> = 1900..=2200;

/// Menstrual flow intensity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowIntensity {
    Light,
    #[default]
    Normal,
    Heavy,
    #[serde(alias = "Very Heavy")]
    VeryHeavy,
}

impl FlowIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowIntensity::Light => "Light",
            FlowIntensity::Normal => "Normal",
            FlowIntensity::Heavy => "Heavy",
            FlowIntensity::VeryHeavy => "Very Heavy",
        }
    }

    pub fn is_heavy(&self) -> bool {
        matches!(self, FlowIntensity::Heavy | FlowIntensity::VeryHeavy)
    }
}

/// How basal body temperature is being measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BbtTrackingMethod {
    #[default]
    #[serde(alias = "Not Tracking")]
    NotTracking,
    Oral,
    Vaginal,
    Rectal,
}

impl BbtTrackingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BbtTrackingMethod::NotTracking => "Not Tracking",
            BbtTrackingMethod::Oral => "Oral",
            BbtTrackingMethod::Vaginal => "Vaginal",
            BbtTrackingMethod::Rectal => "Rectal",
        }
    }

    pub fn is_tracking(&self) -> bool {
        !matches!(self, BbtTrackingMethod::NotTracking)
    }
}

/// Self-reported diet quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutritionQuality {
    Poor,
    Average,
    #[default]
    Good,
    Excellent,
}

impl NutritionQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutritionQuality::Poor => "Poor",
            NutritionQuality::Average => "Average",
            NutritionQuality::Good => "Good",
            NutritionQuality::Excellent => "Excellent",
        }
    }
}

/// Weekly exercise frequency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseFrequency {
    None,
    #[serde(alias = "1-2 times/week")]
    Low,
    #[default]
    #[serde(alias = "3-4 times/week")]
    Medium,
    #[serde(alias = "5+ times/week")]
    High,
}

impl ExerciseFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseFrequency::None => "None",
            ExerciseFrequency::Low => "1-2 times/week",
            ExerciseFrequency::Medium => "3-4 times/week",
            ExerciseFrequency::High => "5+ times/week",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlcoholConsumption {
    None,
    #[default]
    Occasional,
    Moderate,
    Frequent,
}

impl AlcoholConsumption {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlcoholConsumption::None => "None",
            AlcoholConsumption::Occasional => "Occasional",
            AlcoholConsumption::Moderate => "Moderate",
            AlcoholConsumption::Frequent => "Frequent",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokingStatus {
    #[default]
    #[serde(alias = "Non-smoker")]
    NonSmoker,
    #[serde(alias = "Former smoker")]
    FormerSmoker,
    #[serde(alias = "Current smoker")]
    CurrentSmoker,
}

impl SmokingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingStatus::NonSmoker => "Non-smoker",
            SmokingStatus::FormerSmoker => "Former smoker",
            SmokingStatus::CurrentSmoker => "Current smoker",
        }
    }
}

/// Diagnosed conditions that influence cycle regularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthCondition {
    #[serde(rename = "PCOS", alias = "Pcos")]
    Pcos,
    Endometriosis,
    #[serde(alias = "Thyroid Issues")]
    ThyroidIssues,
    Diabetes,
    #[serde(alias = "High Blood Pressure")]
    HighBloodPressure,
    Other,
}

impl HealthCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCondition::Pcos => "PCOS",
            HealthCondition::Endometriosis => "Endometriosis",
            HealthCondition::ThyroidIssues => "Thyroid Issues",
            HealthCondition::Diabetes => "Diabetes",
            HealthCondition::HighBloodPressure => "High Blood Pressure",
            HealthCondition::Other => "Other",
        }
    }
}

/// Cycle, temperature and lifestyle inputs for one prediction.
///
/// Constructed per request and never mutated by the estimator. Field names are
/// snake_case; the camelCase names used by the intake form are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleProfile {
    /// First day of the most recent period
    #[serde(alias = "startDate", alias = "cycleStartDate")]
    pub cycle_start_date: NaiveDate,
    /// Average cycle length in days (20-40)
    #[serde(alias = "cycleLength", alias = "cycleLengthDays")]
    pub cycle_length_days: u32,
    /// Period duration in days
    #[serde(alias = "periodDuration", alias = "periodDurationDays")]
    pub period_duration_days: u32,
    #[serde(alias = "flowIntensity")]
    pub flow_intensity: FlowIntensity,

    /// Latest basal body temperature (°F)
    #[serde(alias = "currentBBT")]
    pub current_bbt: f64,
    #[serde(alias = "bbtTracking", alias = "bbtTrackingMethod")]
    pub bbt_tracking_method: BbtTrackingMethod,
    /// Measurement consistency, 1-10
    #[serde(alias = "bbtConsistency")]
    pub bbt_consistency: u8,

    /// Stress level, 1-10
    #[serde(alias = "stressLevel")]
    pub stress_level: u8,
    /// Daily water intake in cups
    #[serde(alias = "hydration", alias = "hydrationCups")]
    pub hydration_cups: u8,
    #[serde(alias = "nutritionQuality")]
    pub nutrition_quality: NutritionQuality,
    /// Average nightly sleep in hours
    #[serde(alias = "sleepHours")]
    pub sleep_hours: f64,
    #[serde(alias = "exerciseFrequency")]
    pub exercise_frequency: ExerciseFrequency,
    #[serde(alias = "alcoholConsumption")]
    pub alcohol_consumption: AlcoholConsumption,
    #[serde(alias = "smokingStatus")]
    pub smoking_status: SmokingStatus,

    pub supplements: Vec<String>,
    pub medications: String,
    #[serde(alias = "healthConditions")]
    pub health_conditions: BTreeSet<HealthCondition>,
}

impl Default for CycleProfile {
    fn default() -> Self {
        Self {
            cycle_start_date: Utc::now().date_naive(),
            cycle_length_days: 28,
            period_duration_days: 5,
            flow_intensity: FlowIntensity::Normal,
            current_bbt: 97.5,
            bbt_tracking_method: BbtTrackingMethod::NotTracking,
            bbt_consistency: 5,
            stress_level: 5,
            hydration_cups: 8,
            nutrition_quality: NutritionQuality::Good,
            sleep_hours: 8.0,
            exercise_frequency: ExerciseFrequency::Medium,
            alcohol_consumption: AlcoholConsumption::Occasional,
            smoking_status: SmokingStatus::NonSmoker,
            supplements: Vec::new(),
            medications: String::new(),
            health_conditions: BTreeSet::new(),
        }
    }
}

impl CycleProfile {
    /// Profile with form defaults anchored at the given cycle start
    pub fn starting(cycle_start_date: NaiveDate, cycle_length_days: u32) -> Self {
        Self {
            cycle_start_date,
            cycle_length_days,
            ..Default::default()
        }
    }

    pub fn has_condition(&self, condition: HealthCondition) -> bool {
        self.health_conditions.contains(&condition)
    }

    /// Parse a profile from JSON and check it is in the estimator's domain
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject cycle lengths outside 20-40 days and implausible start dates
    pub fn validate(&self) -> Result<(), InsightError> {
        if !CYCLE_LENGTH_RANGE.contains(&self.cycle_length_days) {
            return Err(InsightError::InvalidProfile(format!(
                "cycle length must be {}-{} days, got {}",
                CYCLE_LENGTH_RANGE.start(),
                CYCLE_LENGTH_RANGE.end(),
                self.cycle_length_days
            )));
        }
        if !CYCLE_START_YEAR_RANGE.contains(&self.cycle_start_date.year()) {
            return Err(InsightError::InvalidProfile(format!(
                "cycle start date {} is out of range",
                self.cycle_start_date
            )));
        }
        Ok(())
    }
}

/// The unadjusted textbook window: offset 20 days into the cycle, 6 days wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineWindow {
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub ovulation_date: NaiveDate,
}

/// Rule that contributed to an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    BbtElevated,
    BbtLow,
    BbtConsistencyHigh,
    BbtConsistencyModerate,
    HighStress,
    LowStress,
    ShortSleep,
    AmpleSleep,
    HighExercise,
    NoExercise,
    Pcos,
    ThyroidIssues,
    HeavyFlow,
    WearableBlend,
}

impl FactorKind {
    pub fn description(&self) -> &'static str {
        match self {
            FactorKind::BbtElevated => "Temperature already elevated, ovulation likely passed",
            FactorKind::BbtLow => "Temperature still low, ovulation likely ahead",
            FactorKind::BbtConsistencyHigh => "Highly consistent BBT measurements",
            FactorKind::BbtConsistencyModerate => "Fairly consistent BBT measurements",
            FactorKind::HighStress => "High stress can delay ovulation",
            FactorKind::LowStress => "Low stress supports a regular cycle",
            FactorKind::ShortSleep => "Short sleep can delay ovulation",
            FactorKind::AmpleSleep => "Ample sleep supports hormonal balance",
            FactorKind::HighExercise => "Regular exercise",
            FactorKind::NoExercise => "Sedentary lifestyle",
            FactorKind::Pcos => "PCOS makes ovulation later and less predictable",
            FactorKind::ThyroidIssues => "Thyroid issues can shift ovulation",
            FactorKind::HeavyFlow => "Heavy flow gives a clear cycle start",
            FactorKind::WearableBlend => "Wearable BBT history blended with the estimate",
        }
    }
}

/// One fired adjustment and its contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateFactor {
    pub kind: FactorKind,
    pub ovulation_shift_days: i64,
    pub window_extension_days: i64,
    pub confidence_delta: f64,
}

/// Ovulation observed from a wearable BBT series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WearableOverride {
    /// Cycle start plus the index of the BBT peak
    pub observed_ovulation: NaiveDate,
    /// Position of the first maximum BBT record in the series
    pub peak_index: usize,
    /// Number of records carrying a BBT value
    pub bbt_samples: usize,
    /// true when the estimate was averaged with the observation, false when replaced
    pub blended: bool,
}

/// Estimated fertile window and ovulation day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilityEstimate {
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub ovulation_date: NaiveDate,
    /// Heuristic confidence in [0.3, 0.95]
    pub confidence: f64,
    /// Net ovulation shift applied by lifestyle and condition rules
    pub ovulation_shift_days: i64,
    /// Extra days added to the end of the window (dropped when wearable data is used)
    pub window_extension_days: i64,
    pub factors: Vec<EstimateFactor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wearable: Option<WearableOverride>,
}

impl FertilityEstimate {
    /// Days between window start and end
    pub fn window_span_days(&self) -> i64 {
        (self.fertile_window_end - self.fertile_window_start).num_days()
    }

    pub fn is_fertile(&self, date: NaiveDate) -> bool {
        date >= self.fertile_window_start && date <= self.fertile_window_end
    }

    /// Every day of the fertile window, inclusive
    pub fn fertile_days(&self) -> Vec<NaiveDate> {
        (0..=self.window_span_days().max(0))
            .map(|offset| self.fertile_window_start + Duration::days(offset))
            .collect()
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_form_labels() {
        let json = r#"{
            "startDate": "2024-01-15",
            "cycleLength": 30,
            "flowIntensity": "Very Heavy",
            "bbtTracking": "Not Tracking",
            "exerciseFrequency": "5+ times/week",
            "smokingStatus": "Former smoker",
            "healthConditions": ["PCOS", "Thyroid Issues"]
        }"#;

        let profile = CycleProfile::from_json(json).unwrap();
        assert_eq!(
            profile.cycle_start_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(profile.cycle_length_days, 30);
        assert_eq!(profile.flow_intensity, FlowIntensity::VeryHeavy);
        assert!(!profile.bbt_tracking_method.is_tracking());
        assert_eq!(profile.exercise_frequency, ExerciseFrequency::High);
        assert_eq!(profile.smoking_status, SmokingStatus::FormerSmoker);
        assert!(profile.has_condition(HealthCondition::Pcos));
        assert!(profile.has_condition(HealthCondition::ThyroidIssues));
        // untouched fields fall back to form defaults
        assert_eq!(profile.stress_level, 5);
        assert_eq!(profile.nutrition_quality, NutritionQuality::Good);
    }

    #[test]
    fn test_profile_rejects_out_of_range_cycle() {
        let err = CycleProfile::from_json(r#"{"startDate": "2024-01-01", "cycleLength": 4000000000}"#)
            .unwrap_err();
        assert!(matches!(err, InsightError::InvalidProfile(_)));

        let err = CycleProfile::from_json(r#"{"startDate": "2024-01-01", "cycleLength": 19}"#)
            .unwrap_err();
        assert!(matches!(err, InsightError::InvalidProfile(_)));
        assert!(CycleProfile::from_json(r#"{"startDate": "2024-01-01", "cycleLength": 40}"#).is_ok());

        let err = CycleProfile::from_json(r#"{"startDate": "1850-01-01", "cycleLength": 28}"#)
            .unwrap_err();
        assert!(matches!(err, InsightError::InvalidProfile(_)));
    }

    #[test]
    fn test_profile_snake_case_round_trip() {
        let mut profile =
            CycleProfile::starting(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), 26);
        profile.health_conditions.insert(HealthCondition::Endometriosis);

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"cycle_start_date\":\"2024-03-02\""));
        assert!(json.contains("\"Endometriosis\""));

        let parsed = CycleProfile::from_json(&json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_fertile_days_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let estimate = FertilityEstimate {
            fertile_window_start: start,
            fertile_window_end: start + Duration::days(5),
            ovulation_date: start + Duration::days(3),
            confidence: 0.75,
            ovulation_shift_days: 0,
            window_extension_days: 0,
            factors: Vec::new(),
            wearable: None,
        };

        assert_eq!(estimate.window_span_days(), 5);
        assert_eq!(estimate.fertile_days().len(), 6);
        assert!(estimate.is_fertile(start + Duration::days(5)));
        assert!(!estimate.is_fertile(start + Duration::days(6)));
        assert_eq!(estimate.confidence_percent(), 75);
    }
}
