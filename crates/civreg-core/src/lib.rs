//! # civreg-core
//!
//! Core domain model and traits for the civreg statistics export.
//!
//! This crate provides:
//! - Registry documents: `BirthRecord`, `DeathRecord` and the `EventRecord` trait
//! - Derived data: `TemporalFields`, `Enriched<R>`
//! - Summary types: `LocationCode`, `Location`, `SummaryRow`, detail-list rows
//! - The export request and its validation
//! - Error types and the `RecordSource` trait
//!
//! ## Example
//!
//! ```rust
//! use civreg_core::{BirthRecord, Enriched, FieldValue};
//!
//! let record = BirthRecord {
//!     registry_num: Some(FieldValue::Text("2023-00001".into())),
//!     c_birth_date: Some(FieldValue::Text("2023-02-15".into())),
//!     ..BirthRecord::default()
//! };
//! let enriched = Enriched::new(record);
//! assert_eq!(enriched.temporal.map(|t| t.week_number), Some(3));
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

pub mod record;
pub mod request;
pub mod temporal;

pub use record::{BirthRecord, DeathRecord};
pub use request::{
    CauseFilter, ExportRequest, RecordQuery, ReportKind, SourceSelection, DEFAULT_TEENAGE_AGE,
    MAX_CAUSE_TERMS,
};
pub use temporal::{format_date, parse_event_date, TemporalFields, TEMPORAL_COLUMNS};

// ============================================================================
// Field Values
// ============================================================================

/// A single document field as delivered by the registry database.
///
/// Ages and ids may arrive as numbers, everything else as text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Textual form of the value; whole numbers render without a fraction
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
        }
    }

    /// True for text that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    /// Numeric reading truncated toward zero; `None` when non-numeric
    pub fn as_count(&self) -> Option<i64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then(|| n.trunc() as i64)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Text of an optional field, `None` when absent or blank
pub fn non_blank(value: Option<&FieldValue>) -> Option<Cow<'_, str>> {
    value.filter(|v| !v.is_blank()).map(FieldValue::text)
}

// ============================================================================
// Records
// ============================================================================

/// Common view over registry documents
pub trait EventRecord {
    /// Registry columns in detail-sheet order
    const COLUMNS: &'static [&'static str];
    /// Columns rewritten to `YYYY-MM-DD` on the detail sheet
    const DATE_COLUMNS: &'static [&'static str];
    /// Computed columns appended after the week block
    const DERIVED_COLUMNS: &'static [&'static str] = &[];

    fn column(&self, name: &str) -> Option<&FieldValue>;
    fn registry_num(&self) -> Option<&FieldValue>;
    fn sex(&self) -> Option<&FieldValue>;
    fn event_date(&self) -> Option<&FieldValue>;

    fn derived_column(&self, _name: &str) -> Option<FieldValue> {
        None
    }
}

/// A record together with the fields derived from its event date
#[derive(Clone, Debug, PartialEq)]
pub struct Enriched<R> {
    pub record: R,
    /// `None` when the event date is absent or unparseable
    pub temporal: Option<TemporalFields>,
}

impl<R: EventRecord> Enriched<R> {
    pub fn new(record: R) -> Self {
        let temporal = TemporalFields::from_field(record.event_date());
        Self { record, temporal }
    }

    /// Every detail-sheet heading: registry columns, week block, derived columns
    pub fn detail_columns() -> Vec<&'static str> {
        R::COLUMNS
            .iter()
            .chain(TEMPORAL_COLUMNS.iter())
            .chain(R::DERIVED_COLUMNS.iter())
            .copied()
            .collect()
    }

    /// Value of a detail-sheet column for this record
    pub fn detail_value(&self, column: &str) -> Option<FieldValue> {
        if TEMPORAL_COLUMNS.contains(&column) {
            return self.temporal.as_ref().and_then(|t| t.column(column));
        }
        if R::DERIVED_COLUMNS.contains(&column) {
            return self.record.derived_column(column);
        }
        self.record.column(column).cloned()
    }
}

/// Enrich a fetched record set, preserving order
pub fn enrich_all<R: EventRecord>(records: Vec<R>) -> Vec<Enriched<R>> {
    records.into_iter().map(Enriched::new).collect()
}

/// Supplies the records of one export
pub trait RecordSource<R> {
    /// Fetch records matching the query, already in report order
    fn fetch(&self, query: &RecordQuery) -> Result<Vec<R>, ExportError>;
}

// ============================================================================
// Summaries
// ============================================================================

/// Grouping key of a summary bucket.
///
/// `Unknown` orders after every known code.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LocationCode {
    Known(String),
    Unknown,
}

impl LocationCode {
    /// Parse a `"<display name>|<code>"` location value.
    ///
    /// The code is the trimmed text after the last `|`. Values without a
    /// separator, with an empty code, or with the literal code `UNKNOWN` map
    /// to [`LocationCode::Unknown`].
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return LocationCode::Unknown;
        };
        match value.rfind('|') {
            Some(idx) => {
                let code = value[idx + 1..].trim();
                if code.is_empty() || code == "UNKNOWN" {
                    LocationCode::Unknown
                } else {
                    LocationCode::Known(code.to_string())
                }
            }
            None => LocationCode::Unknown,
        }
    }

    pub fn from_field(value: Option<&FieldValue>) -> Self {
        Self::parse(value.map(FieldValue::text).as_deref())
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationCode::Known(code) => f.write_str(code),
            LocationCode::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Display names of a location
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub municipality: String,
    pub province: String,
    pub country: String,
}

impl Location {
    pub fn new(
        municipality: impl Into<String>,
        province: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            municipality: municipality.into(),
            province: province.into(),
            country: country.into(),
        }
    }
}

/// Per-bucket counts for the municipality table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SexCounts {
    pub male: usize,
    pub female: usize,
    /// Every record in the bucket, including unrecognized sex values
    pub total: usize,
}

/// A finalized, sequence-numbered bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow<C> {
    /// 1-based, assigned after sorting
    pub seq: usize,
    pub code: LocationCode,
    pub location: Location,
    pub counts: C,
}

/// One line of the cause-of-death listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseOfDeathRow {
    pub seq: usize,
    pub registry_num: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    /// `YYYY-MM-DD`, blank when unparseable
    pub death_date: String,
    pub immediate: String,
    pub antecedent: String,
    pub underlying: String,
    pub underlying_interval: String,
    pub other: String,
}

/// One line of the dead-on-arrival listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadOnArrivalRow {
    pub seq: usize,
    pub registry_num: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub death_date: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Export error
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Resource(String),

    #[error("No records found for the selected filters.")]
    EmptyResult,

    #[error("Report error: {0}")]
    Render(#[from] RenderError),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Sheet not found in template: {0}")]
    MissingSheet(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_code_takes_text_after_last_separator() {
        assert_eq!(
            LocationCode::parse(Some("Metro City|00123")),
            LocationCode::Known("00123".into())
        );
        assert_eq!(
            LocationCode::parse(Some("A|B| 0456 ")),
            LocationCode::Known("0456".into())
        );
    }

    #[test]
    fn location_code_without_separator_is_unknown() {
        assert_eq!(LocationCode::parse(Some("Metro City")), LocationCode::Unknown);
        assert_eq!(LocationCode::parse(Some("Metro City|  ")), LocationCode::Unknown);
        assert_eq!(LocationCode::parse(Some("")), LocationCode::Unknown);
        assert_eq!(LocationCode::parse(None), LocationCode::Unknown);
        assert_eq!(LocationCode::parse(Some("Nowhere|UNKNOWN")), LocationCode::Unknown);
    }

    #[test]
    fn unknown_sorts_after_every_code() {
        let mut codes = vec![
            LocationCode::Unknown,
            LocationCode::Known("ZZZZZZ".into()),
            LocationCode::Known("00001".into()),
        ];
        codes.sort();
        assert_eq!(codes.last(), Some(&LocationCode::Unknown));
        assert_eq!(codes[0], LocationCode::Known("00001".into()));
    }

    #[test]
    fn field_value_counts() {
        assert_eq!(FieldValue::Number(19.0).as_count(), Some(19));
        assert_eq!(FieldValue::from(" 17 ").as_count(), Some(17));
        assert_eq!(FieldValue::from("17.9").as_count(), Some(17));
        assert_eq!(FieldValue::from("seventeen").as_count(), None);
        assert_eq!(FieldValue::from("").as_count(), None);
    }

    #[test]
    fn field_value_text_renders_whole_numbers_plainly() {
        assert_eq!(FieldValue::Number(42.0).text(), "42");
        assert_eq!(FieldValue::Number(2.5).text(), "2.5");
        assert!(FieldValue::from("  ").is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }

    #[test]
    fn enriched_detail_row_spans_all_column_groups() {
        let record = DeathRecord {
            registry_num: Some("2023-00007".into()),
            c_death_date: Some("2023-03-31".into()),
            c_age_years: Some(FieldValue::Number(80.0)),
            ..DeathRecord::default()
        };
        let enriched = Enriched::new(record);
        let columns = Enriched::<DeathRecord>::detail_columns();

        assert_eq!(columns.len(), 57 + 6 + 1);
        assert_eq!(columns.last(), Some(&"AgeYearsNumeric"));
        assert_eq!(
            enriched.detail_value("Week Start Date"),
            Some(FieldValue::Text("2023-03-29".into()))
        );
        assert_eq!(enriched.detail_value("AgeYearsNumeric"), Some(FieldValue::Number(80.0)));
        assert_eq!(enriched.detail_value("CLastName"), None);
    }

    #[test]
    fn enriched_without_date_has_no_week_fields() {
        let enriched = Enriched::new(BirthRecord::default());
        assert_eq!(enriched.temporal, None);
        assert_eq!(enriched.detail_value("Week Number"), None);
    }
}
