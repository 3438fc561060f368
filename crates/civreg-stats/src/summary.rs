//! Report tables for birth and death exports
//!
//! Each export produces a fixed set of tables. Births get the municipality
//! table (mother's residence, falling back to place of birth) and the
//! teenage-mother table. Deaths get the municipality table (residence), the
//! dead-on-arrival listing and, when the cause option is on, the
//! cause-of-death listing.

use civreg_core::{
    format_date, non_blank, parse_event_date, BirthRecord, CauseOfDeathRow, DeadOnArrivalRow,
    DeathRecord, Enriched, FieldValue, SexCounts, SummaryRow,
};
use tracing::info;

use crate::aggregate::{group_by_municipality, group_by_threshold, LocationSelector};
use crate::filter::{has_any_content, StatusMarkers};
use crate::reference::LocationReference;

/// Tables of a birth report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BirthSummaries {
    pub by_municipality: Vec<SummaryRow<SexCounts>>,
    pub teenage: Vec<SummaryRow<usize>>,
}

/// Tables of a death report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeathSummaries {
    pub by_municipality: Vec<SummaryRow<SexCounts>>,
    /// `None` when the cause option is off
    pub causes: Option<Vec<CauseOfDeathRow>>,
    pub dead_on_arrival: Vec<DeadOnArrivalRow>,
}

fn mother_municipality(record: &BirthRecord) -> Option<&FieldValue> {
    record.m_municipality.as_ref()
}

fn birth_municipality(record: &BirthRecord) -> Option<&FieldValue> {
    record.c_birth_municipality.as_ref()
}

fn mother_age(record: &BirthRecord) -> Option<&FieldValue> {
    record.m_age.as_ref()
}

fn residence_municipality(record: &DeathRecord) -> Option<&FieldValue> {
    record.c_residence_municipality.as_ref()
}

/// Trimmed text of a field, empty when absent
fn cell_text(value: Option<&FieldValue>) -> String {
    non_blank(value)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD` of a date field, empty when unparseable
fn cell_date(value: Option<&FieldValue>) -> String {
    value
        .and_then(|v| parse_event_date(&v.text()))
        .map(format_date)
        .unwrap_or_default()
}

/// Build the birth report tables
pub fn summarize_births(
    records: &[Enriched<BirthRecord>],
    reference: &LocationReference,
    teenage_age: i64,
) -> BirthSummaries {
    let by_municipality = group_by_municipality(
        records,
        LocationSelector::new(mother_municipality).with_fallback(birth_municipality),
        reference,
    );
    let teenage = group_by_threshold(
        records,
        mother_age,
        teenage_age,
        LocationSelector::new(mother_municipality),
        reference,
    );

    info!(
        records = records.len(),
        municipalities = by_municipality.len(),
        teenage_rows = teenage.len(),
        "summarized births"
    );
    BirthSummaries {
        by_municipality,
        teenage,
    }
}

/// Build the death report tables.
///
/// With `include_cause` on, the municipality table only counts records that
/// state at least one cause of death.
pub fn summarize_deaths(
    records: &[Enriched<DeathRecord>],
    reference: &LocationReference,
    include_cause: bool,
) -> DeathSummaries {
    let selector = LocationSelector::new(residence_municipality);
    let by_municipality = if include_cause {
        let with_cause: Vec<Enriched<DeathRecord>> = records
            .iter()
            .filter(|e| has_any_content(e.record.causes()))
            .cloned()
            .collect();
        group_by_municipality(&with_cause, selector, reference)
    } else {
        group_by_municipality(records, selector, reference)
    };

    let causes = include_cause.then(|| cause_of_death_rows(records));
    let dead_on_arrival = dead_on_arrival_rows(records, &StatusMarkers::dead_on_arrival());

    info!(
        records = records.len(),
        municipalities = by_municipality.len(),
        causes = causes.as_ref().map(Vec::len),
        dead_on_arrival = dead_on_arrival.len(),
        "summarized deaths"
    );
    DeathSummaries {
        by_municipality,
        causes,
        dead_on_arrival,
    }
}

/// One row per record stating any cause of death, in input order
pub fn cause_of_death_rows(records: &[Enriched<DeathRecord>]) -> Vec<CauseOfDeathRow> {
    records
        .iter()
        .map(|e| &e.record)
        .filter(|r| has_any_content(r.causes()))
        .enumerate()
        .map(|(idx, r)| CauseOfDeathRow {
            seq: idx + 1,
            registry_num: cell_text(r.registry_num.as_ref()),
            last_name: cell_text(r.c_last_name.as_ref()),
            first_name: cell_text(r.c_first_name.as_ref()),
            middle_name: cell_text(r.c_middle_name.as_ref()),
            death_date: cell_date(r.c_death_date.as_ref()),
            immediate: cell_text(r.c_cause_immediate.as_ref()),
            antecedent: cell_text(r.c_cause_antecedent.as_ref()),
            underlying: cell_text(r.c_cause_underlying.as_ref()),
            underlying_interval: cell_text(r.c_cause_underlying_interval.as_ref()),
            other: cell_text(r.c_cause_other.as_ref()),
        })
        .collect()
}

/// One row per record whose attendance status marks it dead on arrival
pub fn dead_on_arrival_rows(
    records: &[Enriched<DeathRecord>],
    markers: &StatusMarkers,
) -> Vec<DeadOnArrivalRow> {
    records
        .iter()
        .map(|e| &e.record)
        .filter(|r| markers.matches(r.attendant_attended_from.as_ref()))
        .enumerate()
        .map(|(idx, r)| DeadOnArrivalRow {
            seq: idx + 1,
            registry_num: cell_text(r.registry_num.as_ref()),
            last_name: cell_text(r.c_last_name.as_ref()),
            first_name: cell_text(r.c_first_name.as_ref()),
            middle_name: cell_text(r.c_middle_name.as_ref()),
            death_date: cell_date(r.c_death_date.as_ref()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn death(reg: &str, date: &str) -> DeathRecord {
        DeathRecord {
            registry_num: Some(reg.into()),
            c_death_date: Some(date.into()),
            c_last_name: Some("Santos".into()),
            c_first_name: Some("Juan".into()),
            ..DeathRecord::default()
        }
    }

    #[test]
    fn cause_rows_project_and_renumber() {
        let mut with_cause = death("2023-2", "2023-04-09 08:30:00");
        with_cause.c_cause_underlying = Some(" Hypertension ".into());
        with_cause.c_cause_underlying_interval = Some(FieldValue::Number(5.0));
        let without_cause = death("2023-1", "2023-04-01");

        let rows = cause_of_death_rows(&[Enriched::new(without_cause), Enriched::new(with_cause)]);
        assert_eq!(
            rows,
            vec![CauseOfDeathRow {
                seq: 1,
                registry_num: "2023-2".into(),
                last_name: "Santos".into(),
                first_name: "Juan".into(),
                middle_name: String::new(),
                death_date: "2023-04-09".into(),
                immediate: String::new(),
                antecedent: String::new(),
                underlying: "Hypertension".into(),
                underlying_interval: "5".into(),
                other: String::new(),
            }]
        );
    }

    #[test]
    fn dead_on_arrival_rows_with_blank_date() {
        let mut doa = death("2023-3", "unknown");
        doa.attendant_attended_from = Some("DOA - Provincial Hospital".into());
        let rows = dead_on_arrival_rows(&[Enriched::new(doa)], &StatusMarkers::dead_on_arrival());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].seq, 1);
        assert_eq!(rows[0].death_date, "");
    }

    #[test]
    fn causes_table_only_with_cause_option() {
        let records = vec![Enriched::new(death("2023-1", "2023-01-01"))];
        let reference = LocationReference::new();
        assert_eq!(summarize_deaths(&records, &reference, false).causes, None);
        assert_eq!(summarize_deaths(&records, &reference, true).causes, Some(Vec::new()));
    }
}
