//! Wearable data
//!
//! Parsing of exported daily wearable readings (BBT, sleep, steps, heart rate)
//! and the derived summary used by reports and prompts.

mod parse;
mod series;
mod summary;

pub use parse::{WearableFormat, WearableParser};
pub use series::{
    WearableRecord, WearableSeries, BBT_CHANNEL, DATE_COLUMN, HEART_RATE_CHANNEL, SLEEP_CHANNEL,
    STEPS_CHANNEL,
};
pub(crate) use series::mean_of;
pub use summary::{
    ChannelStats, ChannelTrend, TrendDirection, WearableSummary, TREND_MIN_RECORDS,
};
