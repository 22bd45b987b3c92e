use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::data::model::{CountryChoice, Dataset, WeekRange, WEEK_MAX, WEEK_MIN};

/// Startup configuration of the dashboard.
#[derive(Parser, Debug, Clone)]
#[command(name = "covid-dash")]
#[command(
    about = "Covid 19 - Europe's overview in 2021: weekly cases, ICU load and vaccination"
)]
#[command(version)]
pub struct DashboardConfig {
    /// Weekly dataset (.csv with `;` separators, .json or .parquet); a local
    /// path or an http(s) URL fetched once at startup
    #[arg(short, long, env = "COVID_DASH_DATA", default_value = "DV_Data.csv")]
    pub data: String,

    /// First week selected on the week slider
    #[arg(
        long,
        default_value_t = WEEK_MIN,
        value_parser = clap::value_parser!(u32).range(1..=20)
    )]
    pub week_min: u32,

    /// Last week selected on the week slider
    #[arg(
        long,
        default_value_t = WEEK_MAX,
        value_parser = clap::value_parser!(u32).range(1..=20)
    )]
    pub week_max: u32,

    /// Country selected at startup
    #[arg(short, long, env = "COVID_DASH_COUNTRY", default_value = "Portugal")]
    pub country: String,

    /// Milliseconds per week while the map animation plays
    #[arg(long, default_value_t = 800)]
    pub frame_ms: u64,

    /// Initial window width
    #[arg(long, default_value_t = 1400.0)]
    pub width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 1000.0)]
    pub height: f32,

    /// Write the three chart descriptions as JSON into this directory and exit
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl DashboardConfig {
    /// Starting week range, with the bounds swapped if given backwards.
    pub fn initial_weeks(&self) -> WeekRange {
        WeekRange::new(
            self.week_min.min(self.week_max),
            self.week_min.max(self.week_max),
        )
    }

    /// Starting country; falls back to the dataset's first country when the
    /// configured one is absent.
    pub fn initial_country(&self, dataset: &Dataset) -> CountryChoice {
        if dataset.contains_country(&self.country) {
            return CountryChoice::new(&self.country);
        }
        match dataset.countries().first() {
            Some(first) => {
                log::warn!("country '{}' not in dataset, starting with '{first}'", self.country);
                CountryChoice::new(first.clone())
            }
            None => CountryChoice::new(&self.country),
        }
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }

    /// Default `env_logger` filter for the verbosity flag.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
