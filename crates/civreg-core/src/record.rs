//! Birth and death registry documents
//!
//! Both document types are flat structs with one optional field per column of
//! the registry tables. Field names serialize to the registry column names
//! (`RegistryNum`, `CSexId`, ...), so a JSON dump of either table deserializes
//! directly. Missing keys and `null` both become `None`.

use serde::{Deserialize, Serialize};

use crate::{EventRecord, FieldValue};

macro_rules! registry_document {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident => $column:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                #[serde(rename = $column)]
                pub $field: Option<FieldValue>,
            )*
        }

        impl $name {
            /// Registry column names in detail-sheet order
            pub const REGISTRY_COLUMNS: &'static [&'static str] = &[$($column),*];

            /// Look up a field by its registry column name
            pub fn field(&self, column: &str) -> Option<&FieldValue> {
                match column {
                    $($column => self.$field.as_ref(),)*
                    _ => None,
                }
            }
        }
    };
}

registry_document! {
    /// A certificate of live birth
    BirthRecord {
        registry_num => "RegistryNum",
        document_status => "DocumentStatus",
        c_first_name => "CFirstName",
        c_middle_name => "CMiddleName",
        c_last_name => "CLastName",
        c_sex_id => "CSexId",
        c_birth_date => "CBirthDate",
        c_birth_address => "CBirthAddress",
        c_birth_municipality => "CBirthMunicipality",
        c_birth_municipality_id => "CBirthMunicipalityId",
        c_birth_province => "CBirthProvince",
        c_birth_province_id => "CBirthProvinceId",
        c_birth_country => "CBirthCountry",
        c_birth_country_id => "CBirthCountryId",
        c_birth_type_id => "CBirthTypeId",
        m_first_name => "MFirstName",
        m_middle_name => "MMiddleName",
        m_last_name => "MLastName",
        m_citizenship => "MCitizenship",
        m_citizenship_id => "MCitizenshipId",
        m_occupation => "MOccupation",
        m_occupation_id => "MOccupationId",
        m_age => "MAge",
        m_address => "MAddress",
        m_municipality => "MMunicipality",
        m_municipality_id => "MMunicipalityId",
        m_province => "MProvince",
        m_province_id => "MProvinceId",
        m_country => "MCountry",
        m_country_id => "MCountryId",
        f_first_name => "FFirstName",
        f_middle_name => "FMiddleName",
        f_last_name => "FLastName",
        f_citizenship => "FCitizenship",
        f_citizenship_id => "FCitizenshipId",
        f_occupation => "FOccupation",
        f_occupation_id => "FOccupationId",
        f_age => "FAge",
        f_address => "FAddress",
        f_municipality => "FMunicipality",
        f_municipality_id => "FMunicipalityId",
        f_province => "FProvince",
        f_province_id => "FProvinceId",
        f_country => "FCountry",
        f_country_id => "FCountryId",
        attendant_id => "AttendantId",
        attendant_name => "AttendantName",
        attendant_title => "AttendantTitle",
        preparer_name => "PreparerName",
        preparer_title => "PreparerTitle",
        preparer_date => "PreparerDate",
        date_received => "DateReceived",
        date_registered => "DateRegistered",
    }
}

registry_document! {
    /// A certificate of death
    DeathRecord {
        registry_num => "RegistryNum",
        document_status => "DocumentStatus",
        c_first_name => "CFirstName",
        c_middle_name => "CMiddleName",
        c_last_name => "CLastName",
        c_sex_id => "CSexId",
        c_death_date => "CDeathDate",
        c_birth_date => "CBirthDate",
        c_age_years => "CAgeYears",
        c_age_months => "CAgeMonths",
        c_age_days => "CAgeDays",
        c_age_hours => "CAgeHours",
        c_age_minutes => "CAgeMinutes",
        c_death_address => "CDeathAddress",
        c_death_municipality => "CDeathMunicipality",
        c_death_municipality_id => "CDeathMunicipalityId",
        c_death_province => "CDeathProvince",
        c_death_province_id => "CDeathProvinceId",
        c_death_country => "CDeathCountry",
        c_death_country_id => "CDeathCountryId",
        c_civil_status_id => "CCivilStatusId",
        c_religion => "CReligion",
        c_citizenship => "CCitizenship",
        c_residence_address => "CResidenceAddress",
        c_residence_municipality => "CResidenceMunicipality",
        c_residence_municipality_id => "CResidenceMunicipalityId",
        c_residence_province => "CResidenceProvince",
        c_residence_province_id => "CResidenceProvinceId",
        c_residence_country => "CResidenceCountry",
        c_residence_country_id => "CResidenceCountryId",
        c_occupation => "COccupation",
        f_first_name => "FFirstName",
        f_middle_name => "FMiddleName",
        f_last_name => "FLastName",
        m_first_name => "MFirstName",
        m_middle_name => "MMiddleName",
        m_last_name => "MLastName",
        c_cause_immediate => "CCauseImmediate",
        c_cause_immediate_id => "CCauseImmediateId",
        c_cause_immediate_interval => "CCauseImmediateInterval",
        c_cause_antecedent => "CCauseAntecedent",
        c_cause_antecedent_id => "CCauseAntecedentId",
        c_cause_antecedent_interval => "CCauseAntecedentInterval",
        c_cause_underlying => "CCauseUnderlying",
        c_cause_underlying_id => "CCauseUnderlyingId",
        c_cause_underlying_interval => "CCauseUnderlyingInterval",
        c_cause_other => "CCauseOther",
        c_cause_other_id => "CCauseOtherId",
        attendant_id => "AttendantId",
        attendant_name => "AttendantName",
        attendant_title => "AttendantTitle",
        attendant_attended_from => "AttendantAttendedFrom",
        preparer_name => "PreparerName",
        preparer_title => "PreparerTitle",
        preparer_date => "PreparerDate",
        date_received => "DateReceived",
        date_registered => "DateRegistered",
    }
}

impl DeathRecord {
    /// The four cause-of-death statements, immediate first
    pub fn causes(&self) -> [Option<&FieldValue>; 4] {
        [
            self.c_cause_immediate.as_ref(),
            self.c_cause_antecedent.as_ref(),
            self.c_cause_underlying.as_ref(),
            self.c_cause_other.as_ref(),
        ]
    }
}

impl EventRecord for BirthRecord {
    const COLUMNS: &'static [&'static str] = BirthRecord::REGISTRY_COLUMNS;
    const DATE_COLUMNS: &'static [&'static str] =
        &["CBirthDate", "PreparerDate", "DateReceived", "DateRegistered"];

    fn column(&self, name: &str) -> Option<&FieldValue> {
        self.field(name)
    }

    fn registry_num(&self) -> Option<&FieldValue> {
        self.registry_num.as_ref()
    }

    fn sex(&self) -> Option<&FieldValue> {
        self.c_sex_id.as_ref()
    }

    fn event_date(&self) -> Option<&FieldValue> {
        self.c_birth_date.as_ref()
    }
}

impl EventRecord for DeathRecord {
    const COLUMNS: &'static [&'static str] = DeathRecord::REGISTRY_COLUMNS;
    const DATE_COLUMNS: &'static [&'static str] = &[
        "CDeathDate",
        "CBirthDate",
        "PreparerDate",
        "DateReceived",
        "DateRegistered",
    ];
    const DERIVED_COLUMNS: &'static [&'static str] = &["AgeYearsNumeric"];

    fn column(&self, name: &str) -> Option<&FieldValue> {
        self.field(name)
    }

    fn registry_num(&self) -> Option<&FieldValue> {
        self.registry_num.as_ref()
    }

    fn sex(&self) -> Option<&FieldValue> {
        self.c_sex_id.as_ref()
    }

    fn event_date(&self) -> Option<&FieldValue> {
        self.c_death_date.as_ref()
    }

    fn derived_column(&self, name: &str) -> Option<FieldValue> {
        match name {
            "AgeYearsNumeric" => self
                .c_age_years
                .as_ref()
                .and_then(FieldValue::as_count)
                .map(|age| FieldValue::Number(age as f64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn birth_record_deserializes_registry_columns() {
        let json = r#"{
            "RegistryNum": "2023-00015",
            "CSexId": "FEMALE",
            "CBirthDate": "2023-02-15",
            "MAge": 17,
            "MMunicipality": "Metro City|00123",
            "FAge": null
        }"#;
        let record: BirthRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.registry_num, Some(FieldValue::Text("2023-00015".into())));
        assert_eq!(record.m_age, Some(FieldValue::Number(17.0)));
        assert_eq!(record.f_age, None);
        assert_eq!(record.c_last_name, None);
        assert_eq!(
            record.field("MMunicipality"),
            Some(&FieldValue::Text("Metro City|00123".into()))
        );
    }

    #[test]
    fn column_lists_match_registry_tables() {
        assert_eq!(BirthRecord::REGISTRY_COLUMNS.len(), 53);
        assert_eq!(DeathRecord::REGISTRY_COLUMNS.len(), 57);
        assert_eq!(BirthRecord::COLUMNS[0], "RegistryNum");
        assert_eq!(DeathRecord::REGISTRY_COLUMNS[6], "CDeathDate");
        assert_eq!(DeathRecord::REGISTRY_COLUMNS.last(), Some(&"DateRegistered"));
    }

    #[test]
    fn unknown_column_is_none() {
        let record = DeathRecord::default();
        assert_eq!(record.field("NoSuchColumn"), None);
    }

    #[test]
    fn numeric_age_is_derived_for_deaths() {
        let record = DeathRecord {
            c_age_years: Some(FieldValue::Text(" 72 ".into())),
            ..DeathRecord::default()
        };
        assert_eq!(
            record.derived_column("AgeYearsNumeric"),
            Some(FieldValue::Number(72.0))
        );

        let unknown = DeathRecord {
            c_age_years: Some(FieldValue::Text("N/A".into())),
            ..DeathRecord::default()
        };
        assert_eq!(unknown.derived_column("AgeYearsNumeric"), None);
    }
}
