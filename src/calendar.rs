//! Month calendar of the fertile window
//!
//! Lays out the month containing the window start as six Sunday-first weeks and
//! marks each day as ovulation, fertile or regular.

use crate::types::FertilityEstimate;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const WEEKS_SHOWN: usize = 6;
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayMark {
    Regular,
    Fertile,
    Ovulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub mark: DayMark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Six rows of seven days, Sunday first
    pub weeks: Vec<[CalendarDay; 7]>,
}

impl CalendarMonth {
    /// Grid for the month of the estimate's window start
    pub fn for_estimate(estimate: &FertilityEstimate) -> Self {
        let anchor = estimate.fertile_window_start;
        let first_of_month = anchor.with_day(1).unwrap_or(anchor);
        let lead = Days::new(u64::from(first_of_month.weekday().num_days_from_sunday()));
        let grid_start = first_of_month.checked_sub_days(lead).unwrap_or(NaiveDate::MIN);

        let weeks = (0..WEEKS_SHOWN)
            .map(|week| {
                std::array::from_fn(|weekday| {
                    // saturates in the last representable month
                    let date = grid_start
                        .checked_add_days(Days::new((week * 7 + weekday) as u64))
                        .unwrap_or(NaiveDate::MAX);
                    let mark = if date == estimate.ovulation_date {
                        DayMark::Ovulation
                    } else if estimate.is_fertile(date) {
                        DayMark::Fertile
                    } else {
                        DayMark::Regular
                    };
                    CalendarDay {
                        date,
                        in_month: date.month() == anchor.month(),
                        mark,
                    }
                })
            })
            .collect();

        Self {
            year: anchor.year(),
            month: anchor.month(),
            weeks,
        }
    }

    /// "January 2024"
    pub fn title(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }

    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flatten()
    }

    /// Plain-text grid. Ovulation days are shown as `(dd)`, fertile days as `[dd]`
    /// and days outside the month are blank.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:^35}", self.title());
        for label in WEEKDAY_LABELS {
            let _ = write!(out, " {:^4}", label);
        }
        out.push('\n');

        for week in &self.weeks {
            for day in week {
                let cell = if !day.in_month {
                    String::new()
                } else {
                    match day.mark {
                        DayMark::Ovulation => format!("({:02})", day.date.day()),
                        DayMark::Fertile => format!("[{:02}]", day.date.day()),
                        DayMark::Regular => format!(" {:02} ", day.date.day()),
                    }
                };
                let _ = write!(out, " {:^4}", cell);
            }
            out.push('\n');
        }
        out.push_str("[dd] fertile  (dd) ovulation\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate;
    use crate::types::CycleProfile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> CalendarMonth {
        let profile = CycleProfile::starting(date(2024, 1, 1), 28);
        CalendarMonth::for_estimate(&estimate(&profile, None))
    }

    #[test]
    fn test_grid_starts_on_sunday() {
        let month = calendar();
        assert_eq!(month.weeks.len(), 6);
        // 2024-01-01 is a Monday
        assert_eq!(month.weeks[0][0].date, date(2023, 12, 31));
        assert!(!month.weeks[0][0].in_month);
        assert_eq!(month.weeks[0][1].date, date(2024, 1, 1));
        assert_eq!(month.days().count(), 42);
        assert_eq!(month.title(), "January 2024");
    }

    #[test]
    fn test_marks() {
        let month = calendar();
        let marked: Vec<_> = month
            .days()
            .filter(|d| d.mark != DayMark::Regular)
            .map(|d| (d.date.day(), d.mark))
            .collect();

        assert_eq!(
            marked,
            vec![
                (9, DayMark::Fertile),
                (10, DayMark::Fertile),
                (11, DayMark::Fertile),
                (12, DayMark::Ovulation),
                (13, DayMark::Fertile),
                (14, DayMark::Fertile),
            ]
        );
    }

    #[test]
    fn test_month_starting_on_sunday() {
        // September 2024 starts on a Sunday
        let profile = CycleProfile::starting(date(2024, 8, 25), 28);
        let month = CalendarMonth::for_estimate(&estimate(&profile, None));
        assert_eq!(month.month, 9);
        assert_eq!(month.weeks[0][0].date, date(2024, 9, 1));
    }

    #[test]
    fn test_last_representable_month() {
        let profile = CycleProfile::starting(NaiveDate::MAX, 28);
        let month = CalendarMonth::for_estimate(&estimate(&profile, None));
        assert_eq!(month.month, 12);
        assert_eq!(month.days().count(), 42);
        assert_eq!(month.days().last().map(|d| d.date), Some(NaiveDate::MAX));
    }

    #[test]
    fn test_render_text() {
        let text = calendar().render_text();
        assert!(text.contains("January 2024"));
        assert!(text.contains("(12)"));
        assert!(text.contains("[09]"));
        // title, weekday header, six weeks, legend
        assert_eq!(text.lines().count(), 9);
    }
}
