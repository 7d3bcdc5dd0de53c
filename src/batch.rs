use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::OutlierConfig;
use crate::data::list_series;
use crate::error::{OutlierError, Result};
use crate::pipeline::{Outliers, Pipeline};

/// Outliers per series file, in discovery order.
pub type OutlierMap = BTreeMap<PathBuf, Outliers>;

/// Outcome of a scan that keeps going past failing files.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub outliers: OutlierMap,
    pub failures: BTreeMap<PathBuf, OutlierError>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Pipeline {
    /// Find outliers in every series under `directory`, stopping at the
    /// first file that cannot be processed.
    pub fn scan(&self, directory: &Path) -> Result<OutlierMap> {
        let mut outliers = OutlierMap::new();
        for path in list_series(directory)? {
            let found = self.detect(&path)?;
            log::debug!("{}: {} volume(s) flagged", path.display(), found.indices().len());
            outliers.insert(path, found);
        }
        Ok(outliers)
    }

    /// Like [`Pipeline::scan`], but a failing file is recorded in the report
    /// and the remaining files are still processed.
    pub fn scan_keep_going(&self, directory: &Path) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        for path in list_series(directory)? {
            match self.detect(&path) {
                Ok(found) => {
                    log::debug!("{}: {} volume(s) flagged", path.display(), found.indices().len());
                    report.outliers.insert(path, found);
                }
                Err(err) => {
                    log::warn!("skipping {}: {err}", path.display());
                    report.failures.insert(path, err);
                }
            }
        }
        Ok(report)
    }
}

/// Find outliers in every series under `directory` under `config`.
pub fn scan(directory: &Path, config: &OutlierConfig) -> Result<OutlierMap> {
    Pipeline::new(config)?.scan(directory)
}
