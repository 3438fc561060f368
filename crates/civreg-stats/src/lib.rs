//! # civreg-stats
//!
//! Reference resolution and statistical aggregation for civreg exports.
//!
//! This crate provides:
//! - The municipality reference dictionary and its candidate loading
//! - Location-grouped counting (by sex, or under an age threshold)
//! - Cause-of-death and dead-on-arrival listings
//! - Record query application (period, registry source, cause terms, ordering)
//!
//! ## Example
//!
//! ```rust
//! use civreg_core::{BirthRecord, Enriched, FieldValue};
//! use civreg_stats::{summarize_births, LocationReference};
//!
//! let reference = LocationReference::parse("Metro City|Metro Province|Philippines|00123\n");
//! let record = BirthRecord {
//!     c_sex_id: Some("FEMALE".into()),
//!     m_municipality: Some("Metro City|00123".into()),
//!     m_age: Some(FieldValue::Number(17.0)),
//!     ..BirthRecord::default()
//! };
//! let summaries = summarize_births(&[Enriched::new(record)], &reference, 19);
//! assert_eq!(summaries.by_municipality[0].location.municipality, "Metro City");
//! assert_eq!(summaries.teenage[0].counts, 1);
//! ```

pub mod aggregate;
pub mod filter;
pub mod query;
pub mod reference;
pub mod summary;

pub use aggregate::{group_by_municipality, group_by_threshold, FieldAccessor, LocationSelector};
pub use filter::{has_any_content, StatusMarkers};
pub use query::{apply_query, matches_source, registry_sort_key, TermSearch};
pub use reference::{
    FileReference, InlineReference, LocationReference, ReferenceSource, DEFAULT_COUNTRY,
};
pub use summary::{
    cause_of_death_rows, dead_on_arrival_rows, summarize_births, summarize_deaths,
    BirthSummaries, DeathSummaries,
};
