use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OutlierError, Result};

/// Sentinel accepted wherever a metric or detector name is expected.
pub const ALL: &str = "all";

// ---------------------------------------------------------------------------
// Registered option names
// ---------------------------------------------------------------------------

/// An enumerated option that can be selected by name.
pub trait OptionName: Copy + Ord + FromStr<Err = OutlierError> + 'static {
    /// Every registered value, in registration order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

/// Per-volume summary metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    /// Mean over every voxel of a volume.
    VolMeans,
    /// RMS of the difference between adjacent volumes.
    Dvars,
    /// Mean of voxels above an eighth of the volume mean.
    SpmGlobal,
}

impl MetricKind {
    /// How many leading time points the metric cannot evaluate.
    pub fn output_offset(self) -> usize {
        match self {
            MetricKind::Dvars => 1,
            MetricKind::VolMeans | MetricKind::SpmGlobal => 0,
        }
    }
}

impl OptionName for MetricKind {
    const ALL: &'static [Self] = &[MetricKind::VolMeans, MetricKind::Dvars, MetricKind::SpmGlobal];

    fn name(self) -> &'static str {
        match self {
            MetricKind::VolMeans => "vol_means",
            MetricKind::Dvars => "dvars",
            MetricKind::SpmGlobal => "spm_global",
        }
    }
}

impl FromStr for MetricKind {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(s, "metric")
    }
}

/// Statistical outlier detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetectorKind {
    /// Distance from the mean in population standard deviations.
    Std,
    /// Tukey fences around the interquartile range.
    Iqr,
}

impl OptionName for DetectorKind {
    const ALL: &'static [Self] = &[DetectorKind::Std, DetectorKind::Iqr];

    fn name(self) -> &'static str {
        match self {
            DetectorKind::Std => "std",
            DetectorKind::Iqr => "iqr",
        }
    }
}

impl FromStr for DetectorKind {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(s, "detector")
    }
}

fn parse_name<T: OptionName>(s: &str, kind: &'static str) -> Result<T> {
    T::ALL
        .iter()
        .copied()
        .find(|option| option.name() == s)
        .ok_or_else(|| OutlierError::UnknownOption {
            kind,
            name: s.to_string(),
        })
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Mask join
// ---------------------------------------------------------------------------

/// Rule used to merge several outlier masks into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskJoin {
    #[default]
    Or,
    And,
}

impl MaskJoin {
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            MaskJoin::Or => a || b,
            MaskJoin::And => a && b,
        }
    }
}

impl FromStr for MaskJoin {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "or" => Ok(MaskJoin::Or),
            "and" => Ok(MaskJoin::And),
            _ => Err(OutlierError::InvalidOption(format!(
                "mask join must be 'or' or 'and', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for MaskJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskJoin::Or => f.write_str("or"),
            MaskJoin::And => f.write_str("and"),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector parameters
// ---------------------------------------------------------------------------

/// Thresholds handed to every detector call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Standard deviations from the mean beyond which a value is flagged.
    pub n_stds: f64,
    /// Multiple of the IQR added beyond the quartiles.
    pub iqr_proportion: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            n_stds: 2.0,
            iqr_proportion: 1.5,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<()> {
        validate_threshold("n_stds", self.n_stds)?;
        validate_threshold("iqr_proportion", self.iqr_proportion)
    }
}

/// Thresholds must be finite and non-negative.
pub(crate) fn validate_threshold(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(OutlierError::InvalidOption(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Boundary options
// ---------------------------------------------------------------------------

/// A single name, the `"all"` sentinel, or an explicit list of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    One(String),
    Many(Vec<String>),
}

impl NameList {
    /// Normalise into a set of registered options.
    pub fn resolve<T: OptionName>(&self) -> Result<BTreeSet<T>> {
        let names: &[String] = match self {
            NameList::One(name) => std::slice::from_ref(name),
            NameList::Many(names) => names,
        };
        if names.is_empty() {
            return Err(OutlierError::InvalidOption(
                "at least one option name is required".to_string(),
            ));
        }
        if names.iter().any(|n| n == ALL) {
            return Ok(T::ALL.iter().copied().collect());
        }
        names.iter().map(|n| n.parse::<T>()).collect()
    }
}

impl From<&str> for NameList {
    fn from(name: &str) -> Self {
        NameList::One(name.to_string())
    }
}

impl From<Vec<String>> for NameList {
    fn from(mut names: Vec<String>) -> Self {
        if names.len() == 1 {
            NameList::One(names.remove(0))
        } else {
            NameList::Many(names)
        }
    }
}

/// Raw detection options as given on the command line or in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub metric: NameList,
    pub detector: NameList,
    pub n_stds: f64,
    pub iqr_proportion: f64,
    pub mask_join: String,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        let params = DetectorParams::default();
        Self {
            metric: NameList::from(MetricKind::VolMeans.name()),
            detector: NameList::from(DetectorKind::Std.name()),
            n_stds: params.n_stds,
            iqr_proportion: params.iqr_proportion,
            mask_join: MaskJoin::Or.to_string(),
        }
    }
}

impl OutlierConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| OutlierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| {
            OutlierError::InvalidOption(format!("config {}: {e}", path.display()))
        })
    }

    pub fn params(&self) -> DetectorParams {
        DetectorParams {
            n_stds: self.n_stds,
            iqr_proportion: self.iqr_proportion,
        }
    }
}
