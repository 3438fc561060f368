//! Record predicates used to pick sub-populations

use civreg_core::FieldValue;

/// True if any of the fields holds non-blank text
pub fn has_any_content<'a, I>(fields: I) -> bool
where
    I: IntoIterator<Item = Option<&'a FieldValue>>,
{
    fields
        .into_iter()
        .any(|field| field.is_some_and(|value| !value.is_blank()))
}

/// Marker substrings that flag a status field.
///
/// The status is trimmed and upper-cased before matching; markers are
/// expected in upper case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMarkers {
    /// Match when the status begins with one of these
    pub prefixes: Vec<String>,
    /// Match when the status contains one of these anywhere
    pub contains: Vec<String>,
}

impl StatusMarkers {
    /// "Attended from" values that mean the person was dead on arrival
    pub fn dead_on_arrival() -> Self {
        Self {
            prefixes: vec!["DEAD".into()],
            contains: vec!["DOA".into(), "ER DEATH".into()],
        }
    }

    pub fn matches(&self, status: Option<&FieldValue>) -> bool {
        let Some(status) = status else {
            return false;
        };
        let normalized = status.text().trim().to_uppercase();
        if normalized.is_empty() {
            return false;
        }
        self.prefixes.iter().any(|p| normalized.starts_with(p.as_str()))
            || self.contains.iter().any(|c| normalized.contains(c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn content_requires_one_non_blank_field() {
        let blank = text("   ");
        let cause = text("Pneumonia");
        assert!(!has_any_content([None, Some(&blank), None]));
        assert!(has_any_content([None, Some(&blank), Some(&cause)]));
        assert!(!has_any_content(Vec::<Option<&FieldValue>>::new()));
    }

    #[test]
    fn dead_on_arrival_markers() {
        let markers = StatusMarkers::dead_on_arrival();
        assert!(markers.matches(Some(&text("Dead on Arrival"))));
        assert!(markers.matches(Some(&text("  dead upon arrival"))));
        assert!(markers.matches(Some(&text("Hospital - DOA"))));
        assert!(markers.matches(Some(&text("er death"))));
        assert!(!markers.matches(Some(&text("Hospital"))));
        assert!(!markers.matches(Some(&text("Home - found dead"))));
        assert!(!markers.matches(Some(&text(""))));
        assert!(!markers.matches(None));
    }
}
