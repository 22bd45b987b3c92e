use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Dataset, Field, Record};

/// Upper bound on a dataset download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why the weekly table could not be loaded. Any of these aborts startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed delimited record: {0}")]
    Csv(#[from] csv::Error),

    #[error("header is not semicolon-delimited (found a single column '{0}')")]
    Delimiter(String),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}, {column}: '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: week {week} is outside the week axis")]
    WeekOutOfRange { row: usize, week: i64 },

    #[error("row {row}: '{code}' is not a 3-letter country code")]
    InvalidCode { row: usize, code: String },

    #[error("{country} uses two codes: {first} and {second}")]
    InconsistentCode {
        country: String,
        first: String,
        second: String,
    },

    #[error("{country} has more than one row for week {week}")]
    DuplicateWeek { country: String, week: u32 },

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("invalid parquet: {0}")]
    Parquet(String),

    #[error("no data rows")]
    Empty,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Source layout, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Delimited,
    Json,
    Parquet,
}

impl Format {
    fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "parquet" | "pq" => Format::Parquet,
            "json" => Format::Json,
            _ => Format::Delimited,
        }
    }
}

/// Load the weekly dataset from a local path or an `http(s)://` URL.
pub fn load_source(source: &str) -> Result<Dataset, LoadError> {
    if is_url(source) {
        load_url(source)
    } else {
        load_file(Path::new(source))
    }
}

/// Whether `source` names a remote dataset.
pub fn is_url(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load the weekly dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – semicolon-delimited with a header row (the default)
/// * `.json`         – `[{ "COUNTRY": "Portugal", "WEEK": 1, ... }, ...]`
/// * `.parquet`      – one flat column per field
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dataset = match Format::from_extension(ext) {
        Format::Parquet => load_parquet(File::open(path).map_err(io_err)?)?,
        Format::Json => {
            let text = std::fs::read_to_string(path).map_err(io_err)?;
            load_json(&text)?
        }
        Format::Delimited => load_reader(File::open(path).map_err(io_err)?)?,
    };

    log::info!(
        "Loaded {} rows for {} countries from {}",
        dataset.len(),
        dataset.countries().len(),
        path.display()
    );
    Ok(dataset)
}

/// Download the weekly dataset once with a blocking GET and parse the body
/// by the URL's extension, like [`load_file`]. Transport failures and
/// non-success statuses are [`LoadError::Fetch`].
pub fn load_url(url: &str) -> Result<Dataset, LoadError> {
    let fetch_err = |source| LoadError::Fetch {
        url: url.to_string(),
        source,
    };

    log::debug!("Fetching {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    let body = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(fetch_err)?;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path
        .rsplit_once('/')
        .map_or(path, |(_, name)| name)
        .rsplit_once('.')
        .map_or("", |(_, ext)| ext);

    let dataset = match Format::from_extension(ext) {
        Format::Parquet => load_parquet(body)?,
        Format::Json => {
            let text = std::str::from_utf8(&body).map_err(|e| LoadError::Json(e.to_string()))?;
            load_json(text)?
        }
        Format::Delimited => load_reader(&body[..])?,
    };

    log::info!(
        "Loaded {} rows for {} countries from {url}",
        dataset.len(),
        dataset.countries().len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Semicolon-delimited loader
// ---------------------------------------------------------------------------

/// Parse semicolon-delimited text with a header row.
///
/// Columns may come in any order and headers are matched case-insensitively;
/// unknown columns are ignored.
pub fn load_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    if let [only] = headers.as_slice() {
        if only.contains(',') {
            return Err(LoadError::Delimiter(only.clone()));
        }
    }

    let columns = ColumnIndex::resolve(|name| {
        headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    })?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result?;
        let cell = |field: Field| raw.get(columns.of(field)).unwrap_or("");
        let number = |field: Field| parse_number(cell(field), row, field);

        records.push(Record {
            country: cell(Field::Country).to_string(),
            code: cell(Field::Code).to_string(),
            week: parse_week(cell(Field::Week), row)?,
            new_cases_per_million: number(Field::NewCasesPerMillion)?,
            new_deaths_per_million: number(Field::NewDeathsPerMillion)?,
            gdp_per_capita: number(Field::GdpPerCapita)?,
            new_tests_per_thousand: number(Field::NewTestsPerThousand)?,
            icu_patients_per_million: number(Field::IcuPatientsPerMillion)?,
            hosp_patients_per_million: number(Field::HospPatientsPerMillion)?,
            total_vaccinations_per_hundred: number(Field::TotalVaccinationsPerHundred)?,
        });
    }

    finish(records)
}

/// Position of every required column in the source.
struct ColumnIndex([usize; Field::ALL.len()]);

impl ColumnIndex {
    fn resolve(mut lookup: impl FnMut(&str) -> Option<usize>) -> Result<Self, LoadError> {
        let mut idx = [0usize; Field::ALL.len()];
        for (slot, field) in idx.iter_mut().zip(Field::ALL) {
            *slot = lookup(field.header()).ok_or(LoadError::MissingColumn(field.header()))?;
        }
        Ok(ColumnIndex(idx))
    }

    fn of(&self, field: Field) -> usize {
        // Field::ALL lists the variants in declaration order.
        self.0[field as usize]
    }
}

/// Parse a numeric cell. `NaN` and the infinities parse as floats but are
/// not measurements, so they are rejected like any other bad cell.
fn parse_number(s: &str, row: usize, field: Field) -> Result<f64, LoadError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::InvalidNumber {
            row,
            column: field.header(),
            value: s.to_string(),
        })
}

fn finite(value: f64, row: usize, field: Field) -> Result<f64, LoadError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoadError::InvalidNumber {
            row,
            column: field.header(),
            value: value.to_string(),
        })
    }
}

fn parse_week(s: &str, row: usize) -> Result<u32, LoadError> {
    // Whole-number floats ("3.0") show up when the table went through a float column.
    let value = parse_number(s, row, Field::Week)?;
    week_from_f64(value).ok_or_else(|| LoadError::InvalidNumber {
        row,
        column: Field::Week.header(),
        value: s.to_string(),
    })
}

fn week_from_f64(value: f64) -> Option<u32> {
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

fn finish(records: Vec<Record>) -> Result<Dataset, LoadError> {
    if records.is_empty() {
        return Err(LoadError::Empty);
    }
    Dataset::from_records(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "COUNTRY": "Portugal", "CODE": "PRT", "WEEK": 1, "NEW_CASES_PER_MILLION": 10.0, ... },
///   ...
/// ]
/// ```
///
/// Keys are matched case-insensitively, like the delimited headers.
pub fn load_json(text: &str) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_str(text).map_err(|e| LoadError::Json(e.to_string()))?;

    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::Json("expected a top-level array".to_string()))?;

    let mut records = Vec::with_capacity(rows.len());

    for (row, value) in rows.iter().enumerate() {
        let obj = value
            .as_object()
            .ok_or_else(|| LoadError::Json(format!("row {row} is not an object")))?;

        let get = |field: Field| {
            obj.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field.header()))
                .map(|(_, v)| v)
                .ok_or(LoadError::MissingColumn(field.header()))
        };
        let text = |field: Field| -> Result<String, LoadError> {
            match get(field)? {
                JsonValue::String(s) => Ok(s.trim().to_string()),
                other => Err(LoadError::Json(format!(
                    "row {row}, {}: expected a string, got {other}",
                    field.header()
                ))),
            }
        };
        let number = |field: Field| -> Result<f64, LoadError> {
            match get(field)? {
                JsonValue::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| LoadError::InvalidNumber {
                        row,
                        column: field.header(),
                        value: n.to_string(),
                    })
                    .and_then(|v| finite(v, row, field)),
                JsonValue::String(s) => parse_number(s.trim(), row, field),
                other => Err(LoadError::InvalidNumber {
                    row,
                    column: field.header(),
                    value: other.to_string(),
                }),
            }
        };

        let week_value = number(Field::Week)?;
        let week = week_from_f64(week_value).ok_or_else(|| LoadError::InvalidNumber {
            row,
            column: Field::Week.header(),
            value: week_value.to_string(),
        })?;

        records.push(Record {
            country: text(Field::Country)?,
            code: text(Field::Code)?,
            week,
            new_cases_per_million: number(Field::NewCasesPerMillion)?,
            new_deaths_per_million: number(Field::NewDeathsPerMillion)?,
            gdp_per_capita: number(Field::GdpPerCapita)?,
            new_tests_per_thousand: number(Field::NewTestsPerThousand)?,
            icu_patients_per_million: number(Field::IcuPatientsPerMillion)?,
            hosp_patients_per_million: number(Field::HospPatientsPerMillion)?,
            total_vaccinations_per_hundred: number(Field::TotalVaccinationsPerHundred)?,
        });
    }

    finish(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load Parquet data (a file or an in-memory buffer) with one flat column
/// per field.
///
/// Text columns may be Utf8 or LargeUtf8; numeric columns may be
/// Int32, Int64, Float32 or Float64.  Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
pub fn load_parquet<R: ChunkReader + 'static>(source: R) -> Result<Dataset, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(source)
        .map_err(|e| LoadError::Parquet(format!("reading metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| LoadError::Parquet(format!("building reader: {e}")))?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| LoadError::Parquet(format!("reading record batch: {e}")))?;
        let schema = batch.schema();
        let columns = ColumnIndex::resolve(|name| {
            schema
                .fields()
                .iter()
                .position(|f| f.name().eq_ignore_ascii_case(name))
        })?;

        for i in 0..batch.num_rows() {
            let row = records.len();
            let text = |field: Field| extract_text(batch.column(columns.of(field)), i, row, field);
            let number =
                |field: Field| extract_number(batch.column(columns.of(field)), i, row, field);

            let week_value = number(Field::Week)?;
            let week = week_from_f64(week_value).ok_or_else(|| LoadError::InvalidNumber {
                row,
                column: Field::Week.header(),
                value: week_value.to_string(),
            })?;

            records.push(Record {
                country: text(Field::Country)?,
                code: text(Field::Code)?,
                week,
                new_cases_per_million: number(Field::NewCasesPerMillion)?,
                new_deaths_per_million: number(Field::NewDeathsPerMillion)?,
                gdp_per_capita: number(Field::GdpPerCapita)?,
                new_tests_per_thousand: number(Field::NewTestsPerThousand)?,
                icu_patients_per_million: number(Field::IcuPatientsPerMillion)?,
                hosp_patients_per_million: number(Field::HospPatientsPerMillion)?,
                total_vaccinations_per_hundred: number(Field::TotalVaccinationsPerHundred)?,
            });
        }
    }

    finish(records)
}

// -- Parquet / Arrow helpers --

/// Extract a string cell from a Utf8 or LargeUtf8 column.
fn extract_text(
    col: &Arc<dyn Array>,
    i: usize,
    row: usize,
    field: Field,
) -> Result<String, LoadError> {
    if col.is_null(i) {
        return Err(LoadError::Parquet(format!("row {row}, {field}: null value")));
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(col, field)?;
            Ok(arr.value(i).trim().to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(i).trim().to_string()),
        other => Err(LoadError::Parquet(format!(
            "{field}: expected a string column, got {other:?}"
        ))),
    }
}

fn downcast<'a, T: Array + 'static>(
    col: &'a Arc<dyn Array>,
    field: Field,
) -> Result<&'a T, LoadError> {
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        LoadError::Parquet(format!("{field}: unexpected type {:?}", col.data_type()))
    })
}

/// Extract a numeric cell as `f64`; nulls and non-finite floats count as
/// unparsable numbers.
fn extract_number(
    col: &Arc<dyn Array>,
    i: usize,
    row: usize,
    field: Field,
) -> Result<f64, LoadError> {
    if col.is_null(i) {
        return Err(LoadError::InvalidNumber {
            row,
            column: field.header(),
            value: "null".to_string(),
        });
    }
    let value = match col.data_type() {
        DataType::Int32 => f64::from(downcast::<Int32Array>(col, field)?.value(i)),
        DataType::Int64 => downcast::<Int64Array>(col, field)?.value(i) as f64,
        DataType::Float32 => f64::from(downcast::<Float32Array>(col, field)?.value(i)),
        DataType::Float64 => downcast::<Float64Array>(col, field)?.value(i),
        DataType::Utf8 | DataType::LargeUtf8 => {
            let s = extract_text(col, i, row, field)?;
            return parse_number(&s, row, field);
        }
        other => return Err(LoadError::Parquet(format!("{field}: unexpected type {other:?}"))),
    };
    finite(value, row, field)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "COUNTRY;CODE;WEEK;NEW_CASES_PER_MILLION;NEW_DEATHS_PER_MILLION;\
GDP_PER_CAPITA;NEW_TESTS_PER_THOUSAND;ICU_PATIENTS_PER_MILLION;HOSP_PATIENTS_PER_MILLION;\
TOTAL_VACCINATIONS_PER_HUNDRED";

    fn load(text: &str) -> Result<Dataset, LoadError> {
        load_reader(text.as_bytes())
    }

    #[test]
    fn reads_semicolon_rows() {
        let text = format!(
            "{HEADER}\n\
             Portugal;PRT;1;10.5;0.2;22439.9;15.1;30;120;0.5\n\
             Portugal;PRT;2;20.5;0.4;22439.9;18.0;35;140;1.2\n"
        );
        let ds = load(&text).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.country, "Portugal");
        assert_eq!(first.code, "PRT");
        assert_eq!(first.week, 1);
        assert_eq!(first.new_cases_per_million, 10.5);
        assert_eq!(first.icu_patients_per_million, 30.0);
        assert_eq!(ds.records()[1].total_vaccinations_per_hundred, 1.2);
    }

    #[test]
    fn column_order_and_case_are_free() {
        let text = "week;Country;code;total_vaccinations_per_hundred;hosp_patients_per_million;\
icu_patients_per_million;new_tests_per_thousand;gdp_per_capita;new_deaths_per_million;\
new_cases_per_million;extra\n\
3;Spain;ESP;4.5;100;20;9;25000;1.5;300;ignored\n";
        let ds = load(text).unwrap();
        let rec = &ds.records()[0];
        assert_eq!(rec.week, 3);
        assert_eq!(rec.country, "Spain");
        assert_eq!(rec.new_cases_per_million, 300.0);
        assert_eq!(rec.total_vaccinations_per_hundred, 4.5);
    }

    #[test]
    fn missing_column_is_reported() {
        let text = "COUNTRY;CODE;WEEK\nSpain;ESP;1\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("NEW_CASES_PER_MILLION")));
    }

    #[test]
    fn comma_delimited_file_is_rejected() {
        let text = HEADER.replace(';', ",") + "\n";
        assert!(matches!(load(&text).unwrap_err(), LoadError::Delimiter(_)));
    }

    #[test]
    fn unparsable_number_fails_the_whole_load() {
        let text =
            format!("{HEADER}\nPortugal;PRT;1;10;0;1;1;1;1;1\nPortugal;PRT;2;n/a;0;1;1;1;1;1\n");
        match load(&text).unwrap_err() {
            LoadError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "NEW_CASES_PER_MILLION");
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_numeric_cell_is_unparsable() {
        let text = format!("{HEADER}\nPortugal;PRT;1;10;0;1;;1;1;1\n");
        assert!(matches!(load(&text).unwrap_err(), LoadError::InvalidNumber { .. }));
    }

    #[test]
    fn nan_cell_is_unparsable() {
        let text = format!("{HEADER}\nPortugal;PRT;1;10;1;1;NaN;1;1;1\n");
        match load(&text).unwrap_err() {
            LoadError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 0);
                assert_eq!(column, "NEW_TESTS_PER_THOUSAND");
                assert_eq!(value, "NaN");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn infinite_cells_are_unparsable() {
        for cell in ["inf", "-inf", "infinity", "nan"] {
            let text = format!("{HEADER}\nPortugal;PRT;1;{cell};1;1;1;1;1;1\n");
            assert!(
                matches!(
                    load(&text).unwrap_err(),
                    LoadError::InvalidNumber { column: "NEW_CASES_PER_MILLION", .. }
                ),
                "{cell} should be rejected"
            );
        }
    }

    #[test]
    fn fractional_week_is_rejected() {
        let text = format!("{HEADER}\nPortugal;PRT;1.5;10;0;1;1;1;1;1\n");
        assert!(matches!(
            load(&text).unwrap_err(),
            LoadError::InvalidNumber { column: "WEEK", .. }
        ));
        let text = format!("{HEADER}\nPortugal;PRT;2.0;10;0;1;1;1;1;1\n");
        assert_eq!(load(&text).unwrap().records()[0].week, 2);
    }

    #[test]
    fn header_only_is_empty() {
        let text = format!("{HEADER}\n");
        assert!(matches!(load(&text).unwrap_err(), LoadError::Empty));
    }

    #[test]
    fn json_records_load() {
        let text = r#"[
            {"COUNTRY": "Portugal", "CODE": "PRT", "WEEK": 1, "NEW_CASES_PER_MILLION": 10,
             "NEW_DEATHS_PER_MILLION": 1, "GDP_PER_CAPITA": 22439.9,
             "NEW_TESTS_PER_THOUSAND": "2.5", "ICU_PATIENTS_PER_MILLION": 3,
             "HOSP_PATIENTS_PER_MILLION": 4, "TOTAL_VACCINATIONS_PER_HUNDRED": 0.1}
        ]"#;
        let ds = load_json(text).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].new_tests_per_thousand, 2.5);
        assert_eq!(ds.records()[0].week, 1);
    }

    #[test]
    fn json_nan_string_is_unparsable() {
        let text = r#"[
            {"COUNTRY": "Portugal", "CODE": "PRT", "WEEK": 1, "NEW_CASES_PER_MILLION": "NaN",
             "NEW_DEATHS_PER_MILLION": 1, "GDP_PER_CAPITA": 1, "NEW_TESTS_PER_THOUSAND": 1,
             "ICU_PATIENTS_PER_MILLION": 1, "HOSP_PATIENTS_PER_MILLION": 1,
             "TOTAL_VACCINATIONS_PER_HUNDRED": 1}
        ]"#;
        assert!(matches!(
            load_json(text).unwrap_err(),
            LoadError::InvalidNumber { column: "NEW_CASES_PER_MILLION", .. }
        ));
    }

    #[test]
    fn json_missing_key_is_reported() {
        let text = r#"[{"COUNTRY": "Portugal", "CODE": "PRT", "WEEK": 1}]"#;
        assert!(matches!(load_json(text).unwrap_err(), LoadError::MissingColumn(_)));
        assert!(matches!(load_json("{}").unwrap_err(), LoadError::Json(_)));
    }

    #[test]
    fn unreachable_file_is_an_io_error() {
        let err = load_file(Path::new("/definitely/not/here/DV_Data.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn urls_are_told_apart_from_paths() {
        assert!(is_url("https://example.org/DV_Data.csv"));
        assert!(is_url("HTTP://example.org/DV_Data.csv"));
        assert!(!is_url("DV_Data.csv"));
        assert!(!is_url("/data/https/DV_Data.csv"));
    }

    #[test]
    fn extension_picks_the_format() {
        assert_eq!(Format::from_extension("PARQUET"), Format::Parquet);
        assert_eq!(Format::from_extension("json"), Format::Json);
        assert_eq!(Format::from_extension("csv"), Format::Delimited);
        assert_eq!(Format::from_extension(""), Format::Delimited);
    }
}
