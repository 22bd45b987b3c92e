//! Per-chart projections of the weekly table.
//!
//! Each function is pure: it reads the dataset, applies one control's
//! filter and returns a fresh table for exactly one chart.

use std::collections::BTreeMap;

use super::model::{CountryChoice, Dataset, Record, ScatterRow, WeekRange};

/// Running sums for one country.
#[derive(Default)]
struct MeanAccumulator {
    count: usize,
    new_cases_per_million: f64,
    new_deaths_per_million: f64,
    gdp_per_capita: f64,
    new_tests_per_thousand: f64,
}

impl MeanAccumulator {
    fn push(&mut self, rec: &Record) {
        self.count += 1;
        self.new_cases_per_million += rec.new_cases_per_million;
        self.new_deaths_per_million += rec.new_deaths_per_million;
        self.gdp_per_capita += rec.gdp_per_capita;
        self.new_tests_per_thousand += rec.new_tests_per_thousand;
    }

    fn finish(self, country: &str) -> ScatterRow {
        // Only created on the first pushed record, so count >= 1.
        let n = self.count as f64;
        ScatterRow {
            country: country.to_string(),
            new_cases_per_million: self.new_cases_per_million / n,
            new_deaths_per_million: self.new_deaths_per_million / n,
            gdp_per_capita: self.gdp_per_capita / n,
            new_tests_per_thousand: self.new_tests_per_thousand / n,
        }
    }
}

/// Per-country means of cases, deaths, GDP and tests over the week range.
///
/// One row per country with at least one week inside `weeks`, sorted by
/// country name. A reversed range yields an empty table.
pub fn scatter_aggregation(dataset: &Dataset, weeks: &WeekRange) -> Vec<ScatterRow> {
    let mut groups: BTreeMap<&str, MeanAccumulator> = BTreeMap::new();

    for rec in dataset.records().iter().filter(|r| weeks.matches(r)) {
        groups.entry(rec.country.as_str()).or_default().push(rec);
    }

    groups
        .into_iter()
        .map(|(country, acc)| acc.finish(country))
        .collect()
}

/// Every week of the chosen country, ascending by week.
/// An unknown country yields an empty table.
pub fn bar_aggregation(dataset: &Dataset, country: &CountryChoice) -> Vec<Record> {
    let mut rows: Vec<Record> = dataset
        .records()
        .iter()
        .filter(|r| country.matches(r))
        .cloned()
        .collect();
    rows.sort_by_key(|r| r.week);
    rows
}

/// All countries, all weeks, in dataset order.
///
/// The country choice is accepted to keep the handler signature aligned with
/// the country selector but does not filter: the vaccination map always shows
/// the whole of Europe.
pub fn choropleth_aggregation(dataset: &Dataset, _country: &CountryChoice) -> Vec<Record> {
    dataset.records().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn weekly(country: &str, code: &str, week: u32, cases: f64, deaths: f64) -> Record {
        let mut rec = record(country, code, week);
        rec.new_cases_per_million = cases;
        rec.new_deaths_per_million = deaths;
        rec.gdp_per_capita = 1000.0 * f64::from(week);
        rec.new_tests_per_thousand = f64::from(week);
        rec
    }

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            weekly("Spain", "ESP", 3, 300.0, 3.0),
            weekly("Portugal", "PRT", 2, 20.0, 2.0),
            weekly("Portugal", "PRT", 1, 10.0, 1.0),
            weekly("Spain", "ESP", 1, 100.0, 1.0),
            weekly("France", "FRA", 5, 50.0, 5.0),
            weekly("Portugal", "PRT", 3, 30.0, 6.0),
        ])
        .unwrap()
    }

    #[test]
    fn portugal_mean_over_two_weeks() {
        let ds = Dataset::from_records(vec![
            weekly("Portugal", "PRT", 1, 10.0, 0.0),
            weekly("Portugal", "PRT", 2, 20.0, 0.0),
        ])
        .unwrap();
        let rows = scatter_aggregation(&ds, &WeekRange::new(1, 2));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "Portugal");
        assert_eq!(rows[0].new_cases_per_million, 15.0);
    }

    #[test]
    fn scatter_means_every_measure_per_country() {
        let ds = sample();
        let rows = scatter_aggregation(&ds, &WeekRange::new(1, 3));

        let countries: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, ["Portugal", "Spain"]);

        let pt = &rows[0];
        assert_eq!(pt.new_cases_per_million, 20.0);
        assert_eq!(pt.new_deaths_per_million, 3.0);
        assert_eq!(pt.gdp_per_capita, 2000.0);
        assert_eq!(pt.new_tests_per_thousand, 2.0);

        let es = &rows[1];
        assert_eq!(es.new_cases_per_million, 200.0);
        assert_eq!(es.new_deaths_per_million, 2.0);
    }

    #[test]
    fn scatter_omits_countries_without_weeks_in_range() {
        let rows = scatter_aggregation(&sample(), &WeekRange::new(4, 20));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "France");
    }

    #[test]
    fn scatter_has_at_most_one_row_per_country() {
        let ds = sample();
        for min in 1..=6 {
            for max in min..=6 {
                let rows = scatter_aggregation(&ds, &WeekRange::new(min, max));
                let mut names: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
                names.dedup();
                assert_eq!(names.len(), rows.len(), "range [{min}, {max}]");
            }
        }
    }

    #[test]
    fn scatter_reversed_range_is_empty() {
        assert!(scatter_aggregation(&sample(), &WeekRange::new(5, 3)).is_empty());
    }

    #[test]
    fn scatter_is_idempotent() {
        let ds = sample();
        let range = WeekRange::new(2, 5);
        let first = scatter_aggregation(&ds, &range);
        assert_eq!(first, scatter_aggregation(&ds, &range));
    }

    #[test]
    fn bar_rows_are_ascending_and_single_country() {
        let rows = bar_aggregation(&sample(), &CountryChoice::new("Portugal"));
        let weeks: Vec<u32> = rows.iter().map(|r| r.week).collect();
        assert_eq!(weeks, [1, 2, 3]);
        assert!(rows.iter().all(|r| r.country == "Portugal"));
    }

    #[test]
    fn bar_unknown_country_is_empty() {
        let ds = Dataset::from_records(vec![
            weekly("Portugal", "PRT", 1, 10.0, 0.0),
            weekly("Portugal", "PRT", 2, 20.0, 0.0),
        ])
        .unwrap();
        assert!(bar_aggregation(&ds, &CountryChoice::new("Spain")).is_empty());
    }

    #[test]
    fn choropleth_ignores_country_choice() {
        let ds = sample();
        for name in ["Portugal", "Spain", "Atlantis", ""] {
            let rows = choropleth_aggregation(&ds, &CountryChoice::new(name));
            assert_eq!(rows.len(), ds.len());
            assert_eq!(rows.as_slice(), ds.records());
        }
    }
}
