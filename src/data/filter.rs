use thiserror::Error;

use super::model::{CountryChoice, Dataset, Record, WeekRange, WEEK_MAX, WEEK_MIN};

// ---------------------------------------------------------------------------
// Row predicates for the two input controls
// ---------------------------------------------------------------------------

impl WeekRange {
    /// Whether `week` lies inside the inclusive range.
    /// A range with `min > max` contains nothing.
    pub fn contains(&self, week: u32) -> bool {
        self.min <= week && week <= self.max
    }

    /// Whether a record passes the week filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.contains(record.week)
    }
}

impl CountryChoice {
    /// Whether a record belongs to the chosen country (exact name match).
    pub fn matches(&self, record: &Record) -> bool {
        record.country == self.name
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A control value that breaks the selection constraints.
///
/// Never fatal: the controller logs it and renders an empty chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSelection {
    #[error("week range {0} leaves the week axis")]
    WeekOutOfBounds(WeekRange),

    #[error("week range {0} starts after it ends")]
    ReversedWeeks(WeekRange),

    #[error("unknown country '{0}'")]
    UnknownCountry(String),
}

/// Check `WEEK_MIN <= min <= max <= WEEK_MAX`.
pub fn validate_week_range(range: &WeekRange) -> Result<(), InvalidSelection> {
    if range.min < WEEK_MIN || range.max > WEEK_MAX {
        return Err(InvalidSelection::WeekOutOfBounds(*range));
    }
    if range.min > range.max {
        return Err(InvalidSelection::ReversedWeeks(*range));
    }
    Ok(())
}

/// Check that the chosen country is one of the dataset's countries.
pub fn validate_country(dataset: &Dataset, choice: &CountryChoice) -> Result<(), InvalidSelection> {
    if dataset.contains_country(&choice.name) {
        Ok(())
    } else {
        Err(InvalidSelection::UnknownCountry(choice.name.clone()))
    }
}
