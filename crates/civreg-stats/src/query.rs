//! Record selection and report ordering
//!
//! A record source hands back every document it holds; [`apply_query`]
//! narrows the set to the requested period and registry sources and puts it
//! in report order.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::Datelike;
use civreg_core::{parse_event_date, EventRecord, FieldValue, RecordQuery, SourceSelection};
use regex::Regex;
use tracing::debug;

fn partner_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]+$").expect("valid partner registry regex"))
}

/// Whether a registry number belongs to one of the selected sources.
///
/// Partner documents carry a `!` prefix or a bare `yyyy-nnnnn` number; LGU
/// documents are everything without the `!` prefix. The two overlap.
pub fn matches_source(registry_num: &str, sources: SourceSelection) -> bool {
    let partner = registry_num.starts_with('!') || partner_pattern().is_match(registry_num);
    let lgu = !registry_num.starts_with('!');
    (sources.partner && partner) || (sources.lgu && lgu)
}

/// Sort key of a registry number: its first four characters, then the
/// leading digits after the last `-` (0 when there are none)
pub fn registry_sort_key(registry_num: &str) -> (String, u64) {
    let prefix: String = registry_num.chars().take(4).collect();
    let serial = registry_num
        .rfind('-')
        .map(|idx| {
            let digits: String = registry_num[idx + 1..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse::<u64>().unwrap_or(0)
        })
        .unwrap_or(0);
    (prefix, serial)
}

fn registry_text<R: EventRecord>(record: &R) -> String {
    record
        .registry_num()
        .map(|v| v.text().into_owned())
        .unwrap_or_default()
}

fn in_period(value: Option<&FieldValue>, query: &RecordQuery) -> bool {
    let Some(date) = value.and_then(|v| parse_event_date(&v.text())) else {
        return false;
    };
    date.year() == query.year && (query.month_start..=query.month_end).contains(&date.month())
}

fn matches_any_term<'a, I>(fields: I, terms: &[String]) -> bool
where
    I: IntoIterator<Item = Option<&'a FieldValue>>,
{
    let lowered: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
    fields.into_iter().flatten().any(|field| {
        let text = field.text().to_lowercase();
        lowered.iter().any(|term| text.contains(term.as_str()))
    })
}

/// Records that can be searched by free-text terms
pub trait TermSearch {
    /// Fields the query's cause terms are matched against
    fn searchable(&self) -> Vec<Option<&FieldValue>>;
}

impl TermSearch for civreg_core::BirthRecord {
    fn searchable(&self) -> Vec<Option<&FieldValue>> {
        Vec::new()
    }
}

impl TermSearch for civreg_core::DeathRecord {
    fn searchable(&self) -> Vec<Option<&FieldValue>> {
        self.causes().to_vec()
    }
}

/// Keep the records matching `query` and order them by registry number.
///
/// Records without a parseable event date are dropped. Cause terms, when
/// present, must appear (case-insensitively) in at least one searchable
/// field. The sort is stable.
pub fn apply_query<R: EventRecord + TermSearch>(records: Vec<R>, query: &RecordQuery) -> Vec<R> {
    let total = records.len();
    let mut selected: Vec<R> = records
        .into_iter()
        .filter(|r| matches_source(&registry_text(r), query.sources))
        .filter(|r| in_period(r.event_date(), query))
        .filter(|r| {
            query.cause_terms.is_empty() || matches_any_term(r.searchable(), &query.cause_terms)
        })
        .collect();

    selected.sort_by(|a, b| compare_registry(&registry_text(a), &registry_text(b)));
    debug!(total, selected = selected.len(), "applied record query");
    selected
}

fn compare_registry(a: &str, b: &str) -> Ordering {
    registry_sort_key(a).cmp(&registry_sort_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use civreg_core::{BirthRecord, DeathRecord};
    use pretty_assertions::assert_eq;

    fn sources(partner: bool, lgu: bool) -> SourceSelection {
        SourceSelection { partner, lgu }
    }

    fn query(month_start: u32, month_end: u32) -> RecordQuery {
        RecordQuery {
            year: 2023,
            month_start,
            month_end,
            sources: sources(false, true),
            cause_terms: Vec::new(),
        }
    }

    fn birth(reg: &str, date: &str) -> BirthRecord {
        BirthRecord {
            registry_num: Some(reg.into()),
            c_birth_date: Some(date.into()),
            ..BirthRecord::default()
        }
    }

    fn registry_nums(records: &[BirthRecord]) -> Vec<String> {
        records.iter().map(registry_text).collect()
    }

    #[test]
    fn source_selection() {
        assert!(matches_source("!2023-001", sources(true, false)));
        assert!(matches_source("2023-001", sources(true, false)));
        assert!(!matches_source("2023-A01", sources(true, false)));
        assert!(matches_source("2023-A01", sources(false, true)));
        assert!(!matches_source("!2023-001", sources(false, true)));
        assert!(!matches_source("2023-001", sources(false, false)));
    }

    #[test]
    fn sort_key_uses_prefix_then_serial() {
        assert_eq!(registry_sort_key("2023-00015"), ("2023".to_string(), 15));
        assert_eq!(registry_sort_key("2023-7b"), ("2023".to_string(), 7));
        assert_eq!(registry_sort_key("2023"), ("2023".to_string(), 0));
        assert_eq!(registry_sort_key("!202-3"), ("!202".to_string(), 3));
    }

    #[test]
    fn filters_period_and_orders_by_serial() {
        let records = vec![
            birth("2023-10", "2023-03-01"),
            birth("2023-9", "2023-02-01"),
            birth("2023-11", "2023-07-01"),
            birth("2022-1", "2022-03-01"),
            birth("2023-12", "not a date"),
        ];
        let selected = apply_query(records, &query(1, 6));
        assert_eq!(registry_nums(&selected), vec!["2023-9", "2023-10"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut first = birth("2023-5", "2023-01-01");
        first.c_last_name = Some("First".into());
        let mut second = birth("2023-05", "2023-01-02");
        second.c_last_name = Some("Second".into());

        let selected = apply_query(vec![first, second], &query(1, 12));
        let names: Vec<_> = selected
            .iter()
            .filter_map(|r| r.c_last_name.as_ref().map(|v| v.text().into_owned()))
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn cause_terms_match_any_cause_field_case_insensitively() {
        let death = |reg: &str, underlying: Option<&str>| DeathRecord {
            registry_num: Some(reg.into()),
            c_death_date: Some("2023-05-05".into()),
            c_cause_underlying: underlying.map(Into::into),
            ..DeathRecord::default()
        };
        let mut q = query(1, 12);
        q.cause_terms = vec!["PNEUMONIA".into(), "sepsis".into()];

        let selected = apply_query(
            vec![
                death("2023-1", Some("Community-acquired pneumonia")),
                death("2023-2", Some("Cardiac arrest")),
                death("2023-3", None),
            ],
            &q,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].registry_num, Some("2023-1".into()));
    }
}
