//! Outlier volume detection for longitudinal imaging series.
//!
//! A series is summarised by one or more per-volume metrics, each summary
//! signal is screened by one or more statistical detectors, and the
//! resulting masks are joined into a single list of outlier volumes.

pub mod batch;
pub mod config;
pub mod data;
pub mod detectors;
pub mod error;
pub mod integrity;
pub mod metrics;
pub mod pipeline;

pub use batch::{scan, OutlierMap, ScanReport};
pub use config::{DetectorKind, DetectorParams, MaskJoin, MetricKind, NameList, OutlierConfig};
pub use data::{list_series, load_series, Series};
pub use error::{OutlierError, Result};
pub use pipeline::{detect, Outliers, Pipeline};
