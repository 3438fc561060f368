//! Location-grouped counting
//!
//! Records are bucketed by the code of a location field. Buckets are kept in
//! a `BTreeMap<LocationCode, _>`, so rows come out in ascending code order
//! with the `Unknown` bucket last. Sequence numbers are assigned after
//! ordering.

use std::collections::BTreeMap;

use civreg_core::{
    non_blank, Enriched, EventRecord, FieldValue, LocationCode, SexCounts, SummaryRow,
};
use tracing::debug;

use crate::reference::LocationReference;

/// Reads one field of a record
pub type FieldAccessor<R> = fn(&R) -> Option<&FieldValue>;

/// Chooses the location field a record is grouped by
pub struct LocationSelector<R> {
    primary: FieldAccessor<R>,
    fallback: Option<FieldAccessor<R>>,
}

impl<R> Clone for LocationSelector<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for LocationSelector<R> {}

impl<R> LocationSelector<R> {
    pub fn new(primary: FieldAccessor<R>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Use `fallback` when the primary field is absent or blank
    pub fn with_fallback(mut self, fallback: FieldAccessor<R>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn select<'r>(&self, record: &'r R) -> Option<&'r FieldValue> {
        let primary = (self.primary)(record);
        match (non_blank(primary), self.fallback) {
            (None, Some(fallback)) => fallback(record),
            _ => primary,
        }
    }

    pub fn code(&self, record: &R) -> LocationCode {
        LocationCode::from_field(self.select(record))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sex {
    Male,
    Female,
    Other,
}

fn classify_sex(value: Option<&FieldValue>) -> Sex {
    let Some(value) = value else {
        return Sex::Other;
    };
    match value.text().trim().to_uppercase().as_str() {
        "MALE" => Sex::Male,
        "FEMALE" => Sex::Female,
        _ => Sex::Other,
    }
}

/// Finalize buckets: resolve names and number rows in code order
fn finalize<C>(
    buckets: BTreeMap<LocationCode, C>,
    reference: &LocationReference,
) -> Vec<SummaryRow<C>> {
    buckets
        .into_iter()
        .enumerate()
        .map(|(idx, (code, counts))| SummaryRow {
            seq: idx + 1,
            location: reference.resolve(&code),
            code,
            counts,
        })
        .collect()
}

/// Count records per location, split by sex.
///
/// Every record increments its bucket's total; only `MALE` and `FEMALE`
/// (case-insensitive, trimmed) increment the split columns.
pub fn group_by_municipality<R: EventRecord>(
    records: &[Enriched<R>],
    selector: LocationSelector<R>,
    reference: &LocationReference,
) -> Vec<SummaryRow<SexCounts>> {
    let mut buckets: BTreeMap<LocationCode, SexCounts> = BTreeMap::new();
    let mut unclassified = 0usize;

    for enriched in records {
        let record = &enriched.record;
        let counts = buckets.entry(selector.code(record)).or_default();
        match classify_sex(record.sex()) {
            Sex::Male => counts.male += 1,
            Sex::Female => counts.female += 1,
            Sex::Other => unclassified += 1,
        }
        counts.total += 1;
    }

    debug!(
        records = records.len(),
        buckets = buckets.len(),
        unclassified,
        "grouped records by municipality"
    );
    finalize(buckets, reference)
}

/// Count records whose numeric `value` is at or below `threshold`, per location.
///
/// Records with an absent or non-numeric value are skipped.
pub fn group_by_threshold<R>(
    records: &[Enriched<R>],
    value: FieldAccessor<R>,
    threshold: i64,
    selector: LocationSelector<R>,
    reference: &LocationReference,
) -> Vec<SummaryRow<usize>> {
    let mut buckets: BTreeMap<LocationCode, usize> = BTreeMap::new();

    for enriched in records {
        let record = &enriched.record;
        let Some(count) = value(record).and_then(FieldValue::as_count) else {
            continue;
        };
        if count <= threshold {
            *buckets.entry(selector.code(record)).or_default() += 1;
        }
    }

    debug!(threshold, buckets = buckets.len(), "grouped records under threshold");
    finalize(buckets, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use civreg_core::BirthRecord;
    use pretty_assertions::assert_eq;

    fn birth(
        mother_mun: Option<&str>,
        birth_mun: Option<&str>,
        sex: &str,
    ) -> Enriched<BirthRecord> {
        Enriched::new(BirthRecord {
            c_sex_id: Some(sex.into()),
            m_municipality: mother_mun.map(Into::into),
            c_birth_municipality: birth_mun.map(Into::into),
            ..BirthRecord::default()
        })
    }

    fn mother_municipality(r: &BirthRecord) -> Option<&FieldValue> {
        r.m_municipality.as_ref()
    }

    fn birth_municipality(r: &BirthRecord) -> Option<&FieldValue> {
        r.c_birth_municipality.as_ref()
    }

    fn mother_age(r: &BirthRecord) -> Option<&FieldValue> {
        r.m_age.as_ref()
    }

    fn mother_selector() -> LocationSelector<BirthRecord> {
        LocationSelector::new(mother_municipality).with_fallback(birth_municipality)
    }

    #[test]
    fn fallback_used_only_when_primary_blank() {
        let selector = mother_selector();
        let primary = birth(Some("A|001"), Some("B|002"), "MALE");
        let blank = birth(Some("  "), Some("B|002"), "MALE");
        let missing = birth(None, Some("B|002"), "MALE");

        assert_eq!(selector.code(&primary.record), LocationCode::Known("001".into()));
        assert_eq!(selector.code(&blank.record), LocationCode::Known("002".into()));
        assert_eq!(selector.code(&missing.record), LocationCode::Known("002".into()));
    }

    #[test]
    fn unrecognized_sex_counts_only_toward_total() {
        let records = vec![
            birth(Some("A|001"), None, "male"),
            birth(Some("A|001"), None, " FEMALE "),
            birth(Some("A|001"), None, "Unknown"),
        ];
        let rows = group_by_municipality(&records, mother_selector(), &LocationReference::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].counts,
            SexCounts {
                male: 1,
                female: 1,
                total: 3
            }
        );
    }

    #[test]
    fn rows_sorted_by_code_with_unknown_last() {
        let records = vec![
            birth(None, None, "MALE"),
            birth(Some("B|002"), None, "MALE"),
            birth(Some("A|001"), None, "FEMALE"),
        ];
        let rows = group_by_municipality(&records, mother_selector(), &LocationReference::new());
        let codes: Vec<_> = rows.iter().map(|r| r.code.clone()).collect();
        assert_eq!(
            codes,
            vec![
                LocationCode::Known("001".into()),
                LocationCode::Known("002".into()),
                LocationCode::Unknown,
            ]
        );
        assert_eq!(rows.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rows[2].location.municipality, "Not Stated");
    }

    #[test]
    fn threshold_is_inclusive_and_skips_non_numeric() {
        let with_age = |age: FieldValue| {
            Enriched::new(BirthRecord {
                m_age: Some(age),
                m_municipality: Some("A|001".into()),
                ..BirthRecord::default()
            })
        };
        let records = vec![
            with_age(FieldValue::Number(19.0)),
            with_age(FieldValue::Number(20.0)),
            with_age("17".into()),
            with_age("n/a".into()),
        ];
        let rows = group_by_threshold(
            &records,
            mother_age,
            19,
            LocationSelector::new(mother_municipality),
            &LocationReference::new(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].counts, 2);
    }
}
