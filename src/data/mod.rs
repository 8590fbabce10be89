/// Data layer: core types, loading, reshaping and chart queries.
///
/// Architecture:
/// ```text
///  .xlsm / .xlsx / .xls  (one or more uploads)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read "Br RAW Data", merge headers, dedupe → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Table + sample/day column ids
///   └──────────┘
///        │                    │
///        ▼                    ▼
///   ┌──────────┐        ┌──────────────────┐
///   │  report   │        │ filter / series  │  per-sample chart data
///   └──────────┘        └──────────────────┘
/// ```

pub mod filter;
pub mod header;
pub mod loader;
pub mod model;
pub mod report;
pub mod series;

#[cfg(test)]
pub(crate) mod fixtures;
