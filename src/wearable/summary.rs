//! Wearable summaries
//!
//! Derives per-channel statistics, a data-quality score, plausibility warnings and
//! simple half-over-half trends from a wearable series.

use super::series::{
    mean_of, WearableSeries, BBT_CHANNEL, DATE_COLUMN, HEART_RATE_CHANNEL, SLEEP_CHANNEL,
    STEPS_CHANNEL,
};
use serde::{Deserialize, Serialize};

/// Minimum record count before trends are reported (strictly more than this)
pub const TREND_MIN_RECORDS: usize = 7;

/// Statistics for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// Second-half mean minus first-half mean for a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTrend {
    pub channel: String,
    pub delta: f64,
    pub direction: TrendDirection,
}

impl ChannelTrend {
    pub fn describe(&self) -> String {
        match self.direction {
            TrendDirection::Improving => format!(
                "{} showing positive trend (+{:.2} per period)",
                self.channel, self.delta
            ),
            TrendDirection::Declining => format!(
                "{} showing declining trend ({:.2} per period)",
                self.channel, self.delta
            ),
            TrendDirection::Stable => format!("{} showing stable trend", self.channel),
        }
    }
}

/// Summary of an uploaded wearable series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableSummary {
    pub records: usize,
    pub channels: Vec<ChannelStats>,
    /// Percentage of non-empty cells (0-100)
    pub data_quality_pct: u32,
    pub warnings: Vec<String>,
    pub trends: Vec<ChannelTrend>,
}

impl WearableSummary {
    pub fn from_series(series: &WearableSeries) -> Self {
        let channels: Vec<ChannelStats> = series
            .channel_names()
            .into_iter()
            .filter_map(|name| channel_stats(series, name))
            .collect();

        let warnings = range_warnings(&channels);
        let trends = compute_trends(series);

        Self {
            records: series.len(),
            data_quality_pct: data_quality_pct(series),
            channels,
            warnings,
            trends,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelStats> {
        self.channels
            .iter()
            .find(|c| c.channel.eq_ignore_ascii_case(name))
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        self.channel(name).map(|c| c.mean)
    }
}

fn channel_stats(series: &WearableSeries, channel: &str) -> Option<ChannelStats> {
    let values: Vec<f64> = series.values(channel).into_iter().map(|(_, v)| v).collect();
    let mean = mean_of(values.iter().copied())?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(ChannelStats {
        channel: channel.to_string(),
        count: values.len(),
        mean,
        min,
        max,
    })
}

/// Share of cells that hold a usable value, over every column of every record
fn data_quality_pct(series: &WearableSeries) -> u32 {
    let total = series.len() * series.columns().len();
    if total == 0 {
        return 0;
    }

    let present: usize = series
        .records()
        .iter()
        .map(|record| {
            series
                .columns()
                .iter()
                .filter(|col| {
                    if col.eq_ignore_ascii_case(DATE_COLUMN) {
                        record.date.is_some()
                    } else {
                        record.get(col).is_some()
                    }
                })
                .count()
        })
        .sum();

    ((present as f64 / total as f64) * 100.0).round() as u32
}

fn range_warnings(channels: &[ChannelStats]) -> Vec<String> {
    let mut warnings = Vec::new();
    for stats in channels {
        if stats.channel.eq_ignore_ascii_case(BBT_CHANNEL) {
            if stats.min < 96.0 || stats.max > 100.0 {
                warnings.push("BBT values outside normal range (96-100°F)".to_string());
            }
        } else if stats.channel.eq_ignore_ascii_case(SLEEP_CHANNEL) {
            if stats.min < 3.0 || stats.max > 12.0 {
                warnings.push("Sleep values outside normal range (3-12 hours)".to_string());
            }
        } else if stats.channel.eq_ignore_ascii_case(STEPS_CHANNEL) && stats.max > 50_000.0 {
            warnings.push("Very high step count detected - verify data accuracy".to_string());
        } else if stats.channel.eq_ignore_ascii_case(HEART_RATE_CHANNEL)
            && (stats.min < 30.0 || stats.max > 220.0)
        {
            warnings.push("Heart rate values outside normal range (30-220 bpm)".to_string());
        }
    }
    warnings
}

fn compute_trends(series: &WearableSeries) -> Vec<ChannelTrend> {
    if series.len() <= TREND_MIN_RECORDS {
        return Vec::new();
    }

    let mid = series.len() / 2;
    [SLEEP_CHANNEL, STEPS_CHANNEL, BBT_CHANNEL]
        .into_iter()
        .filter_map(|channel| {
            let values = series.values(channel);
            let first = mean_of(values.iter().filter(|(i, _)| *i < mid).map(|(_, v)| *v))?;
            let second = mean_of(values.iter().filter(|(i, _)| *i >= mid).map(|(_, v)| *v))?;
            let delta = second - first;
            let direction = if delta > 0.0 {
                TrendDirection::Improving
            } else if delta < 0.0 {
                TrendDirection::Declining
            } else {
                TrendDirection::Stable
            };
            Some(ChannelTrend {
                channel: channel.to_string(),
                delta,
                direction,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wearable::WearableRecord;

    fn record(sleep: f64, steps: f64) -> WearableRecord {
        WearableRecord::new(None)
            .with(SLEEP_CHANNEL, sleep)
            .with(STEPS_CHANNEL, steps)
    }

    #[test]
    fn test_channel_stats() {
        let series =
            WearableSeries::from_records(vec![record(6.0, 3000.0), record(8.0, 9000.0)]);
        let summary = WearableSummary::from_series(&series);

        let sleep = summary.channel("sleep").unwrap();
        assert_eq!(sleep.count, 2);
        assert!((sleep.mean - 7.0).abs() < 1e-9);
        assert_eq!(sleep.min, 6.0);
        assert_eq!(sleep.max, 8.0);
        assert_eq!(summary.data_quality_pct, 100);
        assert!(summary.trends.is_empty());
    }

    #[test]
    fn test_data_quality_counts_missing_cells() {
        let records = vec![
            WearableRecord::new(None).with(SLEEP_CHANNEL, 7.0),
            WearableRecord::new(None).with(STEPS_CHANNEL, 5000.0),
        ];
        let series = WearableSeries::new(
            records,
            vec![SLEEP_CHANNEL.to_string(), STEPS_CHANNEL.to_string()],
        );
        assert_eq!(WearableSummary::from_series(&series).data_quality_pct, 50);
    }

    #[test]
    fn test_range_warnings() {
        let records = vec![
            WearableRecord::new(None)
                .with(BBT_CHANNEL, 101.2)
                .with(SLEEP_CHANNEL, 2.0)
                .with(STEPS_CHANNEL, 60_000.0),
        ];
        let summary = WearableSummary::from_series(&WearableSeries::from_records(records));
        assert_eq!(summary.warnings.len(), 3);
        assert!(summary.warnings[0].starts_with("BBT"));
    }

    #[test]
    fn test_heart_rate_warning() {
        let summary = |bpm: f64| {
            let records = vec![WearableRecord::new(None).with(HEART_RATE_CHANNEL, bpm)];
            WearableSummary::from_series(&WearableSeries::from_records(records))
        };

        assert_eq!(
            summary(250.0).warnings,
            vec!["Heart rate values outside normal range (30-220 bpm)".to_string()]
        );
        assert!(summary(62.0).warnings.is_empty());
    }

    #[test]
    fn test_trends_need_more_than_seven_records() {
        let seven: Vec<_> = (0..7).map(|i| record(6.0 + i as f64 * 0.1, 5000.0)).collect();
        let summary = WearableSummary::from_series(&WearableSeries::from_records(seven));
        assert!(summary.trends.is_empty());

        let eight: Vec<_> = (0..8)
            .map(|i| record(6.0 + i as f64 * 0.25, 8000.0 - i as f64 * 100.0))
            .collect();
        let summary = WearableSummary::from_series(&WearableSeries::from_records(eight));

        let sleep = summary.trends.iter().find(|t| t.channel == SLEEP_CHANNEL).unwrap();
        assert_eq!(sleep.direction, TrendDirection::Improving);
        // halves average 6.375 and 7.375
        assert!((sleep.delta - 1.0).abs() < 1e-9);

        let steps = summary.trends.iter().find(|t| t.channel == STEPS_CHANNEL).unwrap();
        assert_eq!(steps.direction, TrendDirection::Declining);
        assert!(steps.describe().contains("declining"));
    }
}
