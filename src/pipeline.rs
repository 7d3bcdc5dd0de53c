use std::fmt;
use std::path::Path;

use crate::config::{DetectorKind, DetectorParams, MaskJoin, MetricKind, OutlierConfig};
use crate::data::{load_series, Series};
use crate::detectors::{detector_fn, DetectorFn};
use crate::error::{OutlierError, Result};
use crate::metrics::{metric_fn, MetricFn};

// ---------------------------------------------------------------------------
// Outliers – the per-file result
// ---------------------------------------------------------------------------

/// Outlier volumes found in one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outliers {
    /// Ascending indices of the flagged volumes (possibly none).
    Indices(Vec<usize>),
    /// The series had no volumes to evaluate.
    NoVolumes,
}

impl Outliers {
    /// Indices where `mask` is set.
    pub fn from_mask(mask: &[bool]) -> Self {
        Outliers::Indices(
            mask.iter()
                .enumerate()
                .filter_map(|(i, &flagged)| flagged.then_some(i))
                .collect(),
        )
    }

    /// Flagged indices; empty for [`Outliers::NoVolumes`].
    pub fn indices(&self) -> &[usize] {
        match self {
            Outliers::Indices(indices) => indices,
            Outliers::NoVolumes => &[],
        }
    }

    /// Whether there is anything to report for this file.
    pub fn is_reportable(&self) -> bool {
        match self {
            Outliers::Indices(indices) => !indices.is_empty(),
            Outliers::NoVolumes => true,
        }
    }
}

impl fmt::Display for Outliers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outliers::Indices(indices) => {
                let parts: Vec<String> = indices.iter().map(usize::to_string).collect();
                f.write_str(&parts.join(", "))
            }
            Outliers::NoVolumes => f.write_str("none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Resolved detection configuration: which metrics and detectors to run and
/// how to combine their masks.
#[derive(Clone)]
pub struct Pipeline {
    metrics: Vec<(MetricKind, MetricFn)>,
    detectors: Vec<(DetectorKind, DetectorFn)>,
    params: DetectorParams,
    join: MaskJoin,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("metrics", &self.metrics().collect::<Vec<_>>())
            .field("detectors", &self.detectors().collect::<Vec<_>>())
            .field("params", &self.params)
            .field("join", &self.join)
            .finish()
    }
}

impl Pipeline {
    /// Validate `config` and resolve every requested name to its function.
    pub fn new(config: &OutlierConfig) -> Result<Self> {
        let metrics = config.metric.resolve::<MetricKind>()?;
        let detectors = config.detector.resolve::<DetectorKind>()?;
        let params = config.params();
        params.validate()?;
        let join: MaskJoin = config.mask_join.parse()?;

        Ok(Pipeline {
            metrics: metrics.into_iter().map(|m| (m, metric_fn(m))).collect(),
            detectors: detectors.into_iter().map(|d| (d, detector_fn(d))).collect(),
            params,
            join,
        })
    }

    pub fn metrics(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.metrics.iter().map(|(kind, _)| *kind)
    }

    pub fn detectors(&self) -> impl Iterator<Item = DetectorKind> + '_ {
        self.detectors.iter().map(|(kind, _)| *kind)
    }

    pub fn params(&self) -> DetectorParams {
        self.params
    }

    pub fn join(&self) -> MaskJoin {
        self.join
    }

    /// Load the series at `path` and find its outlier volumes.
    pub fn detect(&self, path: &Path) -> Result<Outliers> {
        log::info!("Finding outliers for {}", path.display());
        let series = load_series(path)?;
        log::debug!("loaded {series} ({} voxels per volume)", series.n_voxels());
        self.detect_series(&series)
    }

    /// Find the outlier volumes of an already loaded series.
    pub fn detect_series(&self, series: &Series) -> Result<Outliers> {
        if series.is_empty() {
            return Ok(Outliers::NoVolumes);
        }
        Ok(Outliers::from_mask(&self.combined_mask(series)?))
    }

    /// Join the masks of every (metric, detector) pair into one mask with an
    /// entry per volume. The fold starts from an all-`false` mask under either
    /// join, so `and` only keeps volumes that are already set.
    pub fn combined_mask(&self, series: &Series) -> Result<Vec<bool>> {
        let n_trs = series.n_trs();
        let mut combined = vec![false; n_trs];

        for &(metric, compute) in &self.metrics {
            let signal = compute(series)?;
            for &(detector, run) in &self.detectors {
                let mask = run(&signal, &self.params)?;
                let mask = align_mask(mask, metric.output_offset(), n_trs)?;
                log::debug!(
                    "{metric}/{detector}: {} of {n_trs} volumes flagged",
                    mask.iter().filter(|&&f| f).count()
                );
                join_into(&mut combined, &mask, self.join);
            }
        }

        Ok(combined)
    }
}

/// Left-pad a mask that skips the first `offset` volumes so it covers all
/// `n_trs`. Unevaluated volumes are flagged.
pub fn align_mask(mask: Vec<bool>, offset: usize, n_trs: usize) -> Result<Vec<bool>> {
    if mask.len() + offset != n_trs {
        return Err(OutlierError::InvalidInput(format!(
            "mask of length {} with offset {offset} does not cover {n_trs} volumes",
            mask.len()
        )));
    }
    if offset == 0 {
        return Ok(mask);
    }
    let mut aligned = vec![true; offset];
    aligned.extend(mask);
    Ok(aligned)
}

/// Fold `mask` into `combined` element-wise.
pub fn join_into(combined: &mut [bool], mask: &[bool], join: MaskJoin) {
    for (acc, &flag) in combined.iter_mut().zip(mask) {
        *acc = join.apply(*acc, flag);
    }
}

/// Find the outlier volumes of the series at `path` under `config`.
pub fn detect(path: &Path, config: &OutlierConfig) -> Result<Outliers> {
    Pipeline::new(config)?.detect(path)
}
