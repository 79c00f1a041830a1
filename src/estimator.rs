//! Fertile window estimation
//!
//! This module turns a cycle profile (and optionally a wearable series) into a
//! fertile window, an ovulation day and a heuristic confidence score:
//! - Baseline window anchored 20 days into the cycle
//! - Additive lifestyle and condition adjustments
//! - Override or blend with the wearable BBT peak
//!
//! Every branch is total. Profiles parsed with `CycleProfile::from_json` are
//! range-checked; for hand-built profiles outside that range, dates saturate at
//! the calendar limits instead of overflowing.

use crate::types::{
    BaselineWindow, CycleProfile, EstimateFactor, ExerciseFrequency, FactorKind,
    FertilityEstimate, HealthCondition, WearableOverride,
};
use crate::wearable::{WearableSeries, BBT_CHANNEL};
use chrono::{Duration, NaiveDate};
use tracing::debug;

/// Days from cycle start to the baseline window start, counted back from cycle length
pub const BASELINE_OFFSET_DAYS: i64 = 20;
/// Width of the baseline window
pub const BASELINE_WINDOW_DAYS: i64 = 6;
/// Ovulation sits this many days after the window start
pub const OVULATION_OFFSET_DAYS: i64 = 3;
/// Days of the adjusted window after ovulation, before any extension
pub const POST_OVULATION_DAYS: i64 = 2;

pub const BASE_CONFIDENCE: f64 = 0.7;
pub const MIN_CONFIDENCE: f64 = 0.3;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// BBT samples needed before the wearable peak is blended rather than taken as-is
pub const WEARABLE_BLEND_MIN_SAMPLES: usize = 7;
pub const WEARABLE_CONFIDENCE_BONUS: f64 = 0.2;

const BBT_ELEVATED_F: f64 = 98.0;
const BBT_LOW_F: f64 = 97.0;

/// Running totals of the adjustment pass
#[derive(Debug, Default)]
struct Adjustments {
    ovulation_shift: i64,
    window_extension: i64,
    confidence_delta: f64,
    factors: Vec<EstimateFactor>,
}

impl Adjustments {
    fn apply(&mut self, kind: FactorKind, shift: i64, extension: i64, confidence: f64) {
        self.ovulation_shift += shift;
        self.window_extension += extension;
        self.confidence_delta += confidence;
        self.factors.push(EstimateFactor {
            kind,
            ovulation_shift_days: shift,
            window_extension_days: extension,
            confidence_delta: confidence,
        });
    }
}

/// Fertile window estimator
pub struct Estimator;

impl Estimator {
    /// The unadjusted window: start + (length - 20), six days wide, ovulation on day three
    pub fn baseline(profile: &CycleProfile) -> BaselineWindow {
        let fertile_window_start = add_days(
            profile.cycle_start_date,
            profile.cycle_length_days as i64 - BASELINE_OFFSET_DAYS,
        );

        BaselineWindow {
            fertile_window_start,
            fertile_window_end: add_days(fertile_window_start, BASELINE_WINDOW_DAYS),
            ovulation_date: add_days(fertile_window_start, OVULATION_OFFSET_DAYS),
        }
    }

    /// Estimate the fertile window, adjusting the baseline for lifestyle inputs and
    /// replacing or blending the ovulation day with a wearable BBT peak when present
    pub fn estimate(profile: &CycleProfile, wearable: Option<&WearableSeries>) -> FertilityEstimate {
        let baseline = Self::baseline(profile);
        let adjustments = compute_adjustments(profile);

        let mut confidence = BASE_CONFIDENCE + adjustments.confidence_delta;
        let mut factors = adjustments.factors;
        let mut window_extension = adjustments.window_extension;
        let mut ovulation = add_days(baseline.ovulation_date, adjustments.ovulation_shift);

        let wearable_override = wearable.and_then(|series| {
            let (peak_index, _) = series.bbt_peak()?;
            let start = profile.cycle_start_date;
            let observed_ovulation = add_days(start, peak_index as i64);
            let bbt_samples = series.sample_count(BBT_CHANNEL);
            let blended = bbt_samples >= WEARABLE_BLEND_MIN_SAMPLES;

            if blended {
                let estimated_offset = (ovulation - start).num_days();
                let observed_offset = peak_index as i64;
                let average_offset = (estimated_offset + observed_offset).div_euclid(2);
                ovulation = add_days(start, average_offset);
                confidence += WEARABLE_CONFIDENCE_BONUS;
                factors.push(EstimateFactor {
                    kind: FactorKind::WearableBlend,
                    ovulation_shift_days: average_offset - estimated_offset,
                    window_extension_days: 0,
                    confidence_delta: WEARABLE_CONFIDENCE_BONUS,
                });
            } else {
                ovulation = observed_ovulation;
            }

            // wearable data drops the condition-based extension
            window_extension = 0;

            Some(WearableOverride {
                observed_ovulation,
                peak_index,
                bbt_samples,
                blended,
            })
        });

        let confidence = confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        debug!(
            ovulation = %ovulation,
            shift = adjustments.ovulation_shift,
            extension = window_extension,
            factors = factors.len(),
            wearable = wearable_override.is_some(),
            confidence,
            "estimated fertile window"
        );

        FertilityEstimate {
            fertile_window_start: add_days(ovulation, -OVULATION_OFFSET_DAYS),
            fertile_window_end: add_days(ovulation, POST_OVULATION_DAYS + window_extension),
            ovulation_date: ovulation,
            confidence,
            ovulation_shift_days: adjustments.ovulation_shift,
            window_extension_days: window_extension,
            factors,
            wearable: wearable_override,
        }
    }
}

/// Estimate the fertile window for a profile
pub fn estimate(profile: &CycleProfile, wearable: Option<&WearableSeries>) -> FertilityEstimate {
    Estimator::estimate(profile, wearable)
}

/// Baseline window for a cycle start and length
pub fn baseline_window(cycle_start_date: NaiveDate, cycle_length_days: u32) -> BaselineWindow {
    Estimator::baseline(&CycleProfile::starting(cycle_start_date, cycle_length_days))
}

/// Shift a date, saturating at the calendar limits
fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = Duration::try_days(days).and_then(|d| date.checked_add_signed(d));
    shifted.unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

fn compute_adjustments(profile: &CycleProfile) -> Adjustments {
    let mut adj = Adjustments::default();

    if profile.bbt_tracking_method.is_tracking() {
        if profile.current_bbt > BBT_ELEVATED_F {
            adj.apply(FactorKind::BbtElevated, -2, 0, 0.1);
        } else if profile.current_bbt < BBT_LOW_F {
            adj.apply(FactorKind::BbtLow, 2, 0, 0.1);
        }

        if profile.bbt_consistency >= 8 {
            adj.apply(FactorKind::BbtConsistencyHigh, 0, 0, 0.15);
        } else if profile.bbt_consistency >= 6 {
            adj.apply(FactorKind::BbtConsistencyModerate, 0, 0, 0.1);
        }
    }

    if profile.stress_level >= 8 {
        adj.apply(FactorKind::HighStress, 1, 0, -0.1);
    } else if profile.stress_level <= 3 {
        adj.apply(FactorKind::LowStress, 0, 0, 0.05);
    }

    if profile.sleep_hours < 6.0 {
        adj.apply(FactorKind::ShortSleep, 1, 0, -0.05);
    } else if profile.sleep_hours >= 8.0 {
        adj.apply(FactorKind::AmpleSleep, 0, 0, 0.05);
    }

    match profile.exercise_frequency {
        ExerciseFrequency::High => adj.apply(FactorKind::HighExercise, 0, 0, 0.05),
        ExerciseFrequency::None => adj.apply(FactorKind::NoExercise, 0, 0, -0.05),
        _ => {}
    }

    if profile.has_condition(HealthCondition::Pcos) {
        adj.apply(FactorKind::Pcos, 2, 2, -0.2);
    }
    if profile.has_condition(HealthCondition::ThyroidIssues) {
        adj.apply(FactorKind::ThyroidIssues, 1, 0, -0.1);
    }

    if profile.flow_intensity.is_heavy() {
        adj.apply(FactorKind::HeavyFlow, 0, 0, 0.05);
    }

    adj
}
