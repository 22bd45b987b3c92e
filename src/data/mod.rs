/// Data layer: core types, loading, filtering and per-chart aggregation.
///
/// Architecture:
/// ```text
///  .csv (;) / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (validated, immutable)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, country order
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  WeekRange / CountryChoice predicates + validation
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  scatter means │ bar weeks │ choropleth passthrough
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
