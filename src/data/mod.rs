/// Data layer: core types, loading, cleaning, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  canonical column names, required fields
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  coerce   │  numeric / date columns, drop rows without a measure
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column selections → matching rows
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by keys, reduce measures
///   └───────────┘
/// ```

pub mod aggregate;
pub mod coerce;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
