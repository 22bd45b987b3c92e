use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::loader::LoadError;

/// First week covered by the dataset.
pub const WEEK_MIN: u32 = 1;
/// Last week covered by the dataset.
pub const WEEK_MAX: u32 = 20;

// ---------------------------------------------------------------------------
// Field – a named column of the weekly table
// ---------------------------------------------------------------------------

/// One column of the weekly table. Serializes to the dataset header name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    Country,
    Code,
    Week,
    NewCasesPerMillion,
    NewDeathsPerMillion,
    GdpPerCapita,
    NewTestsPerThousand,
    IcuPatientsPerMillion,
    HospPatientsPerMillion,
    TotalVaccinationsPerHundred,
}

impl Field {
    /// Every column a source file must provide.
    pub const ALL: [Field; 10] = [
        Field::Country,
        Field::Code,
        Field::Week,
        Field::NewCasesPerMillion,
        Field::NewDeathsPerMillion,
        Field::GdpPerCapita,
        Field::NewTestsPerThousand,
        Field::IcuPatientsPerMillion,
        Field::HospPatientsPerMillion,
        Field::TotalVaccinationsPerHundred,
    ];

    /// Header name as it appears in the source file.
    pub fn header(self) -> &'static str {
        match self {
            Field::Country => "COUNTRY",
            Field::Code => "CODE",
            Field::Week => "WEEK",
            Field::NewCasesPerMillion => "NEW_CASES_PER_MILLION",
            Field::NewDeathsPerMillion => "NEW_DEATHS_PER_MILLION",
            Field::GdpPerCapita => "GDP_PER_CAPITA",
            Field::NewTestsPerThousand => "NEW_TESTS_PER_THOUSAND",
            Field::IcuPatientsPerMillion => "ICU_PATIENTS_PER_MILLION",
            Field::HospPatientsPerMillion => "HOSP_PATIENTS_PER_MILLION",
            Field::TotalVaccinationsPerHundred => "TOTAL_VACCINATIONS_PER_HUNDRED",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// One country-week of the source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Record {
    pub country: String,
    /// ISO-3 country code, used for map lookups.
    pub code: String,
    pub week: u32,
    pub new_cases_per_million: f64,
    pub new_deaths_per_million: f64,
    pub gdp_per_capita: f64,
    pub new_tests_per_thousand: f64,
    pub icu_patients_per_million: f64,
    pub hosp_patients_per_million: f64,
    pub total_vaccinations_per_hundred: f64,
}

impl Record {
    /// Numeric value of a column; `None` for the text columns.
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Country | Field::Code => None,
            Field::Week => Some(f64::from(self.week)),
            Field::NewCasesPerMillion => Some(self.new_cases_per_million),
            Field::NewDeathsPerMillion => Some(self.new_deaths_per_million),
            Field::GdpPerCapita => Some(self.gdp_per_capita),
            Field::NewTestsPerThousand => Some(self.new_tests_per_thousand),
            Field::IcuPatientsPerMillion => Some(self.icu_patients_per_million),
            Field::HospPatientsPerMillion => Some(self.hosp_patients_per_million),
            Field::TotalVaccinationsPerHundred => Some(self.total_vaccinations_per_hundred),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded weekly table. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    /// Distinct countries in order of first appearance.
    countries: Vec<String>,
}

impl Dataset {
    /// Build a dataset, checking the per-row invariants:
    /// weeks within `[WEEK_MIN, WEEK_MAX]`, 3-letter codes that stay the
    /// same for a country, and no repeated `(country, week)` pair.
    pub fn from_records(records: Vec<Record>) -> Result<Self, LoadError> {
        let mut codes: BTreeMap<&str, &str> = BTreeMap::new();
        let mut seen: BTreeSet<(&str, u32)> = BTreeSet::new();
        let mut countries = Vec::new();

        for (row, rec) in records.iter().enumerate() {
            if !(WEEK_MIN..=WEEK_MAX).contains(&rec.week) {
                return Err(LoadError::WeekOutOfRange {
                    row,
                    week: i64::from(rec.week),
                });
            }
            if rec.code.len() != 3 || !rec.code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(LoadError::InvalidCode {
                    row,
                    code: rec.code.clone(),
                });
            }
            match codes.get(rec.country.as_str()) {
                Some(first) if *first != rec.code => {
                    return Err(LoadError::InconsistentCode {
                        country: rec.country.clone(),
                        first: first.to_string(),
                        second: rec.code.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    codes.insert(rec.country.as_str(), rec.code.as_str());
                    countries.push(rec.country.clone());
                }
            }
            if !seen.insert((rec.country.as_str(), rec.week)) {
                return Err(LoadError::DuplicateWeek {
                    country: rec.country.clone(),
                    week: rec.week,
                });
            }
        }

        Ok(Dataset { records, countries })
    }

    /// All rows in source order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Distinct country names, first-appearance order.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn contains_country(&self, name: &str) -> bool {
        self.countries.iter().any(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Selections coming from the two input controls
// ---------------------------------------------------------------------------

/// Inclusive week interval chosen on the week slider.
///
/// Any pair is representable so out-of-bounds input can flow through the
/// aggregation and come out as an empty table; see
/// [`crate::data::filter::validate_week_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub min: u32,
    pub max: u32,
}

impl WeekRange {
    pub fn new(min: u32, max: u32) -> Self {
        WeekRange { min, max }
    }

    /// The whole week axis.
    pub fn full() -> Self {
        WeekRange::new(WEEK_MIN, WEEK_MAX)
    }
}

impl Default for WeekRange {
    fn default() -> Self {
        WeekRange::full()
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Country picked on the country selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryChoice {
    pub name: String,
}

impl CountryChoice {
    pub fn new(name: impl Into<String>) -> Self {
        CountryChoice { name: name.into() }
    }
}

impl fmt::Display for CountryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Aggregated rows
// ---------------------------------------------------------------------------

/// Per-country means over a week range, feeding the scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ScatterRow {
    pub country: String,
    pub new_cases_per_million: f64,
    pub new_deaths_per_million: f64,
    pub gdp_per_capita: f64,
    pub new_tests_per_thousand: f64,
}

impl ScatterRow {
    /// Numeric value of one of the averaged columns.
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::NewCasesPerMillion => Some(self.new_cases_per_million),
            Field::NewDeathsPerMillion => Some(self.new_deaths_per_million),
            Field::GdpPerCapita => Some(self.gdp_per_capita),
            Field::NewTestsPerThousand => Some(self.new_tests_per_thousand),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(country: &str, code: &str, week: u32) -> Record {
        Record {
            country: country.to_string(),
            code: code.to_string(),
            week,
            new_cases_per_million: 0.0,
            new_deaths_per_million: 0.0,
            gdp_per_capita: 0.0,
            new_tests_per_thousand: 0.0,
            icu_patients_per_million: 0.0,
            hosp_patients_per_million: 0.0,
            total_vaccinations_per_hundred: 0.0,
        }
    }

    #[test]
    fn countries_keep_first_appearance_order() {
        let ds = Dataset::from_records(vec![
            record("Spain", "ESP", 1),
            record("Portugal", "PRT", 1),
            record("Spain", "ESP", 2),
        ])
        .unwrap();
        assert_eq!(ds.countries(), ["Spain", "Portugal"]);
        assert!(ds.contains_country("Portugal"));
        assert!(!ds.contains_country("France"));
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn duplicate_country_week_is_rejected() {
        let err = Dataset::from_records(vec![record("Spain", "ESP", 4), record("Spain", "ESP", 4)])
            .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateWeek { week: 4, .. }));
    }

    #[test]
    fn week_outside_axis_is_rejected() {
        let err = Dataset::from_records(vec![record("Spain", "ESP", 21)]).unwrap_err();
        assert!(matches!(err, LoadError::WeekOutOfRange { row: 0, week: 21 }));
        let err = Dataset::from_records(vec![record("Spain", "ESP", 0)]).unwrap_err();
        assert!(matches!(err, LoadError::WeekOutOfRange { week: 0, .. }));
    }

    #[test]
    fn codes_must_be_three_letters_and_stable() {
        let err = Dataset::from_records(vec![record("Spain", "ES", 1)]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidCode { .. }));

        let err = Dataset::from_records(vec![record("Spain", "ESP", 1), record("Spain", "SPA", 2)])
            .unwrap_err();
        assert!(matches!(err, LoadError::InconsistentCode { .. }));
    }

    #[test]
    fn field_headers_match_serde_names() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.header()));
        }
    }

    #[test]
    fn record_value_covers_numeric_columns() {
        let mut rec = record("Spain", "ESP", 7);
        rec.icu_patients_per_million = 12.5;
        assert_eq!(rec.value(Field::Week), Some(7.0));
        assert_eq!(rec.value(Field::IcuPatientsPerMillion), Some(12.5));
        assert_eq!(rec.value(Field::Country), None);
    }
}
