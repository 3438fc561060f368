//! Month-relative week fields derived from an event date
//!
//! Registry statistics are reported per week *of the month*, not per ISO week:
//! week 1 always begins on the 1st and the last week of a month is truncated
//! at the month boundary.
//!
//! ```text
//! day:   1 ..  7 |  8 .. 14 | 15 .. 21 | 22 .. 28 | 29 .. 31
//! week:      1   |     2    |     3    |     4    |     5
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use civreg_core::temporal::TemporalFields;
//!
//! let date = NaiveDate::from_ymd_opt(2023, 2, 28).unwrap();
//! let fields = TemporalFields::derive(date);
//!
//! assert_eq!(fields.week_number, 4);
//! assert_eq!(fields.week_start, NaiveDate::from_ymd_opt(2023, 2, 22).unwrap());
//! assert_eq!(fields.week_end, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
//! ```

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// Detail-sheet headings of the derived columns, in sheet order.
pub const TEMPORAL_COLUMNS: [&str; 6] = [
    "Week Number",
    "Week Start Date",
    "Week End Date",
    "Year",
    "Month",
    "Day",
];

/// Calendar fields computed once per record from its event date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFields {
    /// 1-based week within the event's month
    pub week_number: u32,
    pub week_start: NaiveDate,
    /// Clamped to the last day of the month
    pub week_end: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl TemporalFields {
    /// Derive the week fields for a calendar date.
    pub fn derive(date: NaiveDate) -> Self {
        let day = date.day();
        let week_number = (day - 1) / 7 + 1;

        let first = date.with_day(1).unwrap_or(date);
        let last = last_day_of_month(date);

        let week_start = first
            .checked_add_days(Days::new(u64::from((week_number - 1) * 7)))
            .unwrap_or(first);
        let week_end = week_start
            .checked_add_days(Days::new(6))
            .map_or(last, |end| end.min(last));

        Self {
            week_number,
            week_start,
            week_end,
            year: date.year(),
            month: date.month(),
            day,
        }
    }

    /// Derive from a raw event-date field; `None` when absent or unparseable.
    pub fn from_field(value: Option<&FieldValue>) -> Option<Self> {
        let value = value?;
        parse_event_date(&value.text()).map(Self::derive)
    }

    /// Value of one of the [`TEMPORAL_COLUMNS`] for the detail sheet
    pub fn column(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "Week Number" => FieldValue::Number(f64::from(self.week_number)),
            "Week Start Date" => FieldValue::Text(format_date(self.week_start)),
            "Week End Date" => FieldValue::Text(format_date(self.week_end)),
            "Year" => FieldValue::Number(f64::from(self.year)),
            "Month" => FieldValue::Number(f64::from(self.month)),
            "Day" => FieldValue::Number(f64::from(self.day)),
            _ => return None,
        };
        Some(value)
    }
}

/// Last calendar day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Parse the date portion of a registry date value.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and `MM/DD/YYYY`, optionally followed by
/// a time component separated by a space or `T` (the time is ignored).
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);

    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Canonical `YYYY-MM-DD` rendering used throughout the report
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
