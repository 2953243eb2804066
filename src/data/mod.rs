/// Data layer: core types, loading, caching, and trend filtering.
///
/// Architecture:
/// ```text
///  .csv / .txt / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  coerce rows → Vec<Record>
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ NameDataset  │  max-collapsed records, per-label year index
///   └─────────────┘      (held as Arc by `cache`)
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  reference-year bound + smoothed growth → FilterResult
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  sample   │  seeded pick of at most `cap` results for display
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
