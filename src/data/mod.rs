/// Data layer: series model, loading, and discovery.
///
/// Architecture:
/// ```text
///  data directory
///        │
///        ▼
///   ┌───────────┐
///   │ discovery │  walk tree → sub-* series paths
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse .parquet / .json / .csv → Series
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Series  │  n_trs x n_voxels matrix + volume shape
///   └──────────┘
/// ```

pub mod discovery;
pub mod loader;
pub mod model;

pub use discovery::list_series;
pub use loader::load_series;
pub use model::Series;
