//! Daily wearable records
//!
//! A series is an ordered list of daily records, each holding an optional date and
//! any number of named numeric channels. Nothing is assumed about completeness:
//! a record may lack any channel, and dates may repeat or be missing entirely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Basal body temperature channel (°F)
pub const BBT_CHANNEL: &str = "BBT";
/// Nightly sleep channel (hours)
pub const SLEEP_CHANNEL: &str = "Sleep";
/// Daily step count channel
pub const STEPS_CHANNEL: &str = "Steps";
/// Average heart rate channel (bpm)
pub const HEART_RATE_CHANNEL: &str = "Heart_Rate";
/// Name of the optional date column
pub const DATE_COLUMN: &str = "date";

/// One day of wearable readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WearableRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub channels: BTreeMap<String, f64>,
}

impl WearableRecord {
    pub fn new(date: Option<NaiveDate>) -> Self {
        Self {
            date,
            channels: BTreeMap::new(),
        }
    }

    /// Builder-style channel insert
    pub fn with(mut self, channel: &str, value: f64) -> Self {
        self.channels.insert(channel.to_string(), value);
        self
    }

    /// Look up a channel by name, ignoring ASCII case
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.channels
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(channel))
            .map(|(_, value)| *value)
            .filter(|value| value.is_finite())
    }
}

/// Ordered sequence of daily wearable records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WearableSeries {
    records: Vec<WearableRecord>,
    /// Column names in source order, including the date column when present
    columns: Vec<String>,
}

impl WearableSeries {
    /// Create a series with an explicit column list (as read from a file header)
    pub fn new(records: Vec<WearableRecord>, columns: Vec<String>) -> Self {
        Self { records, columns }
    }

    /// Create a series and derive its columns from the records
    pub fn from_records(records: Vec<WearableRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        if records.iter().any(|r| r.date.is_some()) {
            columns.push(DATE_COLUMN.to_string());
        }
        for record in &records {
            for name in record.channels.keys() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.clone());
                }
            }
        }
        Self { records, columns }
    }

    pub fn records(&self) -> &[WearableRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Channel names, excluding the date column
    pub fn channel_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(DATE_COLUMN))
            .map(String::as_str)
            .collect()
    }

    /// Whether at least one record carries a value for the channel
    pub fn has_channel(&self, channel: &str) -> bool {
        self.records.iter().any(|r| r.get(channel).is_some())
    }

    /// (record index, value) pairs for the channel, skipping records without it
    pub fn values(&self, channel: &str) -> Vec<(usize, f64)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.get(channel).map(|v| (idx, v)))
            .collect()
    }

    /// Number of records carrying a value for the channel
    pub fn sample_count(&self, channel: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.get(channel).is_some())
            .count()
    }

    pub fn mean(&self, channel: &str) -> Option<f64> {
        mean_of(self.values(channel).into_iter().map(|(_, v)| v))
    }

    /// Index and value of the first maximum BBT reading
    pub fn bbt_peak(&self) -> Option<(usize, f64)> {
        self.values(BBT_CHANNEL)
            .into_iter()
            .fold(None, |best, (idx, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((idx, value)),
            })
    }
}

/// Average of an iterator, None when empty
pub(crate) fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbt_series(values: &[f64]) -> WearableSeries {
        WearableSeries::from_records(
            values
                .iter()
                .map(|v| WearableRecord::new(None).with(BBT_CHANNEL, *v))
                .collect(),
        )
    }

    #[test]
    fn test_channel_lookup_ignores_case() {
        let record = WearableRecord::new(None).with("bbt", 97.8).with("SLEEP", 7.5);
        assert_eq!(record.get(BBT_CHANNEL), Some(97.8));
        assert_eq!(record.get(SLEEP_CHANNEL), Some(7.5));
        assert_eq!(record.get(STEPS_CHANNEL), None);
    }

    #[test]
    fn test_bbt_peak_first_maximum_wins() {
        let series = bbt_series(&[97.1, 97.9, 98.3, 98.3, 97.6]);
        assert_eq!(series.bbt_peak(), Some((2, 98.3)));
    }

    #[test]
    fn test_bbt_peak_skips_missing_records() {
        let records = vec![
            WearableRecord::new(None).with(STEPS_CHANNEL, 4000.0),
            WearableRecord::new(None).with(BBT_CHANNEL, 97.2),
            WearableRecord::new(None).with(STEPS_CHANNEL, 5000.0),
            WearableRecord::new(None).with(BBT_CHANNEL, 98.1),
        ];
        let series = WearableSeries::from_records(records);

        assert_eq!(series.sample_count(BBT_CHANNEL), 2);
        // index refers to the record position, not the sample position
        assert_eq!(series.bbt_peak(), Some((3, 98.1)));
    }

    #[test]
    fn test_no_bbt_channel() {
        let series = WearableSeries::from_records(vec![
            WearableRecord::new(None).with(SLEEP_CHANNEL, 7.0)
        ]);
        assert!(series.bbt_peak().is_none());
        assert!(!series.has_channel(BBT_CHANNEL));
        assert_eq!(series.channel_names(), vec!["Sleep"]);
    }

    #[test]
    fn test_mean() {
        let series = bbt_series(&[97.0, 98.0]);
        assert!((series.mean(BBT_CHANNEL).unwrap() - 97.5).abs() < 1e-9);
        assert!(series.mean(SLEEP_CHANNEL).is_none());
    }
}
