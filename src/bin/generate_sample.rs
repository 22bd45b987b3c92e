//! Writes a synthetic weekly dataset in the dashboard's `;`-delimited format.
//!
//! Usage: `generate_sample [OUTPUT]` (default `DV_Data.csv`).

use anyhow::{Context, Result};

use covid_dash::data::model::{Record, WEEK_MAX, WEEK_MIN};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Multiplicative jitter in `[1 - spread, 1 + spread]`.
    fn jitter(&mut self, spread: f64) -> f64 {
        1.0 + spread * (2.0 * self.next_f64() - 1.0)
    }
}

/// Country, ISO-3 code, GDP per capita, peak week of the winter wave,
/// peak new cases per million.
const COUNTRIES: [(&str, &str, f64, f64, f64); 12] = [
    ("Portugal", "PRT", 27936.9, 4.0, 8500.0),
    ("Spain", "ESP", 34272.4, 4.5, 5200.0),
    ("France", "FRA", 38605.7, 9.0, 2300.0),
    ("Italy", "ITA", 35220.1, 10.0, 2000.0),
    ("Germany", "DEU", 45229.2, 2.0, 1100.0),
    ("Belgium", "BEL", 42658.6, 12.0, 2100.0),
    ("Netherlands", "NLD", 48472.5, 13.0, 2800.0),
    ("Austria", "AUT", 45436.7, 12.5, 1700.0),
    ("Czechia", "CZE", 32605.9, 3.0, 6500.0),
    ("Poland", "POL", 27216.4, 13.5, 2200.0),
    ("Sweden", "SWE", 46949.3, 14.0, 4000.0),
    ("Ireland", "IRL", 67335.3, 2.0, 7800.0),
];

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "DV_Data.csv".to_string());
    let mut rng = SimpleRng::new(42);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&output)
        .with_context(|| format!("creating {output}"))?;

    let mut rows = 0usize;
    for &(country, code, gdp, peak, amplitude) in &COUNTRIES {
        let mut vaccinations = 0.0;
        for week in WEEK_MIN..=WEEK_MAX {
            let w = f64::from(week);
            let cases = (gaussian(w, peak, 3.0, amplitude) + 150.0) * rng.jitter(0.15);
            let icu = gaussian(w, peak + 1.5, 3.5, amplitude * 0.012) * rng.jitter(0.1) + 5.0;
            vaccinations += (0.15 * w + 0.3) * rng.jitter(0.2);

            let record = Record {
                country: country.to_string(),
                code: code.to_string(),
                week,
                new_cases_per_million: round2(cases),
                new_deaths_per_million: round2(cases * 0.018 * rng.jitter(0.25)),
                gdp_per_capita: gdp,
                new_tests_per_thousand: round2((cases / 120.0 + 8.0) * rng.jitter(0.3)),
                icu_patients_per_million: round2(icu),
                hosp_patients_per_million: round2(icu * 6.5 * rng.jitter(0.1)),
                total_vaccinations_per_hundred: round2(vaccinations),
            };
            writer.serialize(&record).context("writing row")?;
            rows += 1;
        }
    }
    writer.flush().context("flushing output")?;

    println!(
        "Wrote {rows} rows ({} countries x {} weeks) to {output}",
        COUNTRIES.len(),
        WEEK_MAX - WEEK_MIN + 1
    );
    Ok(())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
