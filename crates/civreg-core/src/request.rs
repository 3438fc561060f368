//! Export request parameters and their validation
//!
//! An [`ExportRequest`] carries everything the surrounding application
//! collects for one export: the period, the registry sources, the report
//! options and the save location. [`ExportRequest::validate`] runs before any
//! data is touched, and [`ExportRequest::query`] derives the record query
//! handed to the record source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::ExportError;

/// Default upper age (inclusive) for the teenage-mother table
pub const DEFAULT_TEENAGE_AGE: i64 = 19;

/// Most cause-of-death search terms a death export accepts
pub const MAX_CAUSE_TERMS: usize = 3;

/// The two registry document types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Birth,
    Death,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Birth => "Birth",
            ReportKind::Death => "Death",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which registry sources to include
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSelection {
    /// Partner-submitted documents (`!`-prefixed or `yyyy-nnnnn` registry numbers)
    pub partner: bool,
    /// Documents registered at the local civil registry (not `!`-prefixed)
    pub lgu: bool,
}

impl SourceSelection {
    pub fn any(&self) -> bool {
        self.partner || self.lgu
    }
}

/// Cause-of-death option for death reports
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseFilter {
    pub enabled: bool,
    /// Up to three free-text search terms
    pub terms: Vec<String>,
}

impl CauseFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// Trimmed, non-blank search terms
    pub fn active_terms(&self) -> Vec<String> {
        self.terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Parameters of one export invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub kind: ReportKind,
    pub year: i32,
    pub month_start: u32,
    pub month_end: u32,
    pub sources: SourceSelection,
    /// Birth reports: mothers at or below this age go to the teenage table
    pub teenage_age: i64,
    /// Death reports only
    pub cause: CauseFilter,
    /// Folder (file name generated) or full file path
    pub save_path: Option<PathBuf>,
}

impl ExportRequest {
    /// A full-year request with no source selected yet
    pub fn new(kind: ReportKind, year: i32) -> Self {
        Self {
            kind,
            year,
            month_start: 1,
            month_end: 12,
            sources: SourceSelection::default(),
            teenage_age: DEFAULT_TEENAGE_AGE,
            cause: CauseFilter::default(),
            save_path: None,
        }
    }

    /// Check the request before any data access.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.kind == ReportKind::Death
            && self.cause.enabled
            && self.cause.active_terms().is_empty()
        {
            return Err(ExportError::Configuration(
                "At least one Cause of Death must be entered.".into(),
            ));
        }
        if self.include_cause() && self.cause.terms.len() > MAX_CAUSE_TERMS {
            return Err(ExportError::Configuration(format!(
                "At most {MAX_CAUSE_TERMS} Cause of Death terms may be entered."
            )));
        }
        if !self.sources.any() {
            return Err(ExportError::Configuration(
                "Please select at least one Source (Partner or LGU Register).".into(),
            ));
        }
        let save_path_missing = self
            .save_path
            .as_ref()
            .map_or(true, |p| p.as_os_str().to_string_lossy().trim().is_empty());
        if save_path_missing {
            return Err(ExportError::Configuration(
                "Please enter a save path for the exported file.".into(),
            ));
        }
        for month in [self.month_start, self.month_end] {
            if !(1..=12).contains(&month) {
                return Err(ExportError::Configuration(format!(
                    "Month must be between 1 and 12 (got {month})."
                )));
            }
        }
        if self.month_end < self.month_start {
            return Err(ExportError::Configuration(
                "Month End cannot be before Month Start.".into(),
            ));
        }
        if self.kind == ReportKind::Birth && self.teenage_age < 1 {
            return Err(ExportError::Configuration(format!(
                "Teenage pregnancy age must be at least 1 (got {}).",
                self.teenage_age
            )));
        }
        Ok(())
    }

    /// The record query implied by this request
    pub fn query(&self) -> RecordQuery {
        let cause_terms = if self.kind == ReportKind::Death && self.cause.enabled {
            self.cause.active_terms()
        } else {
            Vec::new()
        };
        RecordQuery {
            year: self.year,
            month_start: self.month_start,
            month_end: self.month_end,
            sources: self.sources,
            cause_terms,
        }
    }

    /// Whether the cause-of-death option applies to this request
    pub fn include_cause(&self) -> bool {
        self.kind == ReportKind::Death && self.cause.enabled
    }
}

/// Record selection handed to a record source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub year: i32,
    pub month_start: u32,
    pub month_end: u32,
    pub sources: SourceSelection,
    /// Non-blank cause search terms; empty means no cause filtering
    pub cause_terms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_death_request() -> ExportRequest {
        let mut request = ExportRequest::new(ReportKind::Death, 2023);
        request.sources.lgu = true;
        request.save_path = Some(PathBuf::from("/tmp/reports"));
        request
    }

    fn config_message(result: Result<(), ExportError>) -> String {
        match result {
            Err(ExportError::Configuration(msg)) => msg,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_death_request().validate().is_ok());
    }

    #[test]
    fn cause_option_with_blank_terms_is_rejected() {
        let mut request = valid_death_request();
        request.cause = CauseFilter::new(["", "  ", ""]);
        let msg = config_message(request.validate());
        assert!(msg.contains("Cause of Death"));
    }

    #[test]
    fn cause_check_runs_before_source_check() {
        let mut request = valid_death_request();
        request.sources = SourceSelection::default();
        request.cause = CauseFilter::new([""]);
        let msg = config_message(request.validate());
        assert!(msg.contains("Cause of Death"));
    }

    #[test]
    fn more_than_three_cause_terms_are_rejected() {
        let mut request = valid_death_request();
        request.cause = CauseFilter::new(["a", "b", "c", "d"]);
        assert!(config_message(request.validate()).contains("At most 3"));
    }

    #[test]
    fn missing_source_is_rejected() {
        let mut request = valid_death_request();
        request.sources = SourceSelection::default();
        let msg = config_message(request.validate());
        assert!(msg.contains("Source"));
    }

    #[test]
    fn missing_or_blank_save_path_is_rejected() {
        let mut request = valid_death_request();
        request.save_path = None;
        assert!(config_message(request.validate()).contains("save path"));

        request.save_path = Some(PathBuf::from("  "));
        assert!(config_message(request.validate()).contains("save path"));
    }

    #[test]
    fn month_range_is_checked() {
        let mut request = valid_death_request();
        request.month_start = 6;
        request.month_end = 3;
        assert!(config_message(request.validate()).contains("Month End"));

        request.month_start = 0;
        assert!(config_message(request.validate()).contains("between 1 and 12"));
    }

    #[test]
    fn birth_teenage_age_must_be_positive() {
        let mut request = valid_death_request();
        request.kind = ReportKind::Birth;
        request.teenage_age = 0;
        assert!(config_message(request.validate()).contains("Teenage"));
    }

    #[test]
    fn query_keeps_only_non_blank_cause_terms() {
        let mut request = valid_death_request();
        request.cause = CauseFilter::new([" pneumonia ", "", "sepsis"]);
        let query = request.query();
        assert_eq!(query.cause_terms, vec!["pneumonia".to_string(), "sepsis".to_string()]);
        assert_eq!((query.month_start, query.month_end), (1, 12));
    }

    #[test]
    fn birth_query_ignores_cause_terms() {
        let mut request = valid_death_request();
        request.kind = ReportKind::Birth;
        request.cause = CauseFilter::new(["pneumonia"]);
        assert!(request.query().cause_terms.is_empty());
        assert!(!request.include_cause());
    }
}
