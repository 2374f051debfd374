// Date range presets and row filtering
use crate::application::engine::row_day;
use crate::application::row_store::Row;
use chrono::{Days, NaiveDate};

/// Selectable lookback windows, in days including today.
pub const DATE_PRESETS: [u32; 5] = [1, 3, 7, 14, 30];

pub const DEFAULT_PRESET_DAYS: u32 = 7;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The last `days` calendar days ending today. A 1-day preset is just
    /// today.
    pub fn preset(days: u32, today: NaiveDate) -> DateRange {
        let back = days.saturating_sub(1);
        DateRange {
            start: today - Days::new(u64::from(back)),
            end: today,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Keep rows whose date falls in the range. Rows without a parseable
    /// date are dropped.
    pub fn filter(&self, rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter()
            .filter(|row| row_day(row).is_some_and(|day| self.contains(day)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_preset_spans_inclusive_days() {
        let range = DateRange::preset(7, day(2024, 3, 10));
        assert_eq!(range.start, day(2024, 3, 4));
        assert_eq!(range.end, day(2024, 3, 10));

        let today_only = DateRange::preset(1, day(2024, 3, 10));
        assert_eq!(today_only.start, today_only.end);
    }

    #[test]
    fn test_filter_keeps_in_range_and_drops_undated() {
        let range = DateRange::preset(3, day(2024, 3, 10));
        let rows: Vec<Row> = serde_json::from_value(json!([
            { "Event Date": "2024-03-08T12:00:00", "Cost (Channel)": 1 },
            { "Event Date": "2024-03-07", "Cost (Channel)": 2 },
            { "Event Date": "2024-03-11", "Cost (Channel)": 3 },
            { "Cost (Channel)": 4 }
        ]))
        .unwrap();

        let kept = range.filter(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["Cost (Channel)"], json!(1));
    }
}
