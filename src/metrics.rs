//! Per-volume summary metrics.
//!
//! Each metric reduces a [`Series`] to one value per volume, or one value per
//! pair of adjacent volumes for frame-difference metrics.

use ndarray::{s, ArrayView1, Axis};

use crate::config::MetricKind;
use crate::data::Series;
use crate::error::{OutlierError, Result};

/// Signature shared by every registered metric.
pub type MetricFn = fn(&Series) -> Result<Vec<f64>>;

/// Look up the metric implementing `kind`.
pub fn metric_fn(kind: MetricKind) -> MetricFn {
    match kind {
        MetricKind::VolMeans => vol_means,
        MetricKind::Dvars => dvars,
        MetricKind::SpmGlobal => spm_globals,
    }
}

/// Mean of every voxel, per volume.
pub fn vol_means(series: &Series) -> Result<Vec<f64>> {
    require_volumes(series, 1, "vol_means")?;
    Ok(series
        .data()
        .outer_iter()
        .map(|volume| volume.mean().unwrap_or(f64::NAN))
        .collect())
}

/// DVARS: root mean square of the voxel-wise difference between each volume
/// and the one before it. The result has one value fewer than the series
/// has volumes.
pub fn dvars(series: &Series) -> Result<Vec<f64>> {
    require_volumes(series, 2, "dvars")?;
    let data = series.data();
    let diff = &data.slice(s![1.., ..]) - &data.slice(s![..-1, ..]);
    let mean_sq = diff
        .mapv(|d| d * d)
        .mean_axis(Axis(1))
        .ok_or_else(|| OutlierError::InvalidInput("dvars: volumes have no voxels".to_string()))?;
    Ok(mean_sq.iter().map(|v| v.sqrt()).collect())
}

/// Global signal of a single volume: the mean of voxels brighter than an
/// eighth of the overall volume mean, which drops background voxels.
///
/// Returns `None` when no voxel clears the threshold.
pub fn spm_global(volume: ArrayView1<'_, f64>) -> Option<f64> {
    let thresh = volume.mean()? / 8.0;
    let (sum, count) = volume
        .iter()
        .filter(|&&v| v > thresh)
        .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// [`spm_global`] for every volume of the series.
pub fn spm_globals(series: &Series) -> Result<Vec<f64>> {
    require_volumes(series, 1, "spm_global")?;
    series
        .data()
        .outer_iter()
        .enumerate()
        .map(|(t, volume)| {
            spm_global(volume).ok_or_else(|| {
                OutlierError::InvalidInput(format!(
                    "spm_global: no voxel of volume {t} exceeds the global threshold"
                ))
            })
        })
        .collect()
}

fn require_volumes(series: &Series, min: usize, metric: &str) -> Result<()> {
    if series.n_trs() < min {
        return Err(OutlierError::InvalidInput(format!(
            "{metric} needs at least {min} volume(s), series has {}",
            series.n_trs()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn series(volumes: Vec<Vec<f64>>) -> Series {
        Series::from_volumes(volumes).unwrap()
    }

    #[test]
    fn test_vol_means() {
        let s = series(vec![vec![1.0, 2.0, 3.0, 4.0], vec![10.0; 4], vec![0.0, 0.0, 0.0, 8.0]]);
        assert_eq!(vol_means(&s).unwrap(), vec![2.5, 10.0, 2.0]);
    }

    #[test]
    fn test_dvars_tens_to_zeros() {
        let s = series(vec![vec![10.0; 8], vec![0.0; 8]]);
        assert_eq!(dvars(&s).unwrap(), vec![10.0]);
    }

    #[test]
    fn test_dvars_length() {
        let s = series(vec![vec![1.0, 2.0], vec![1.0, 2.0], vec![4.0, 6.0], vec![4.0, 6.0]]);
        let values = dvars(&s).unwrap();
        assert_eq!(values.len(), 3);
        // diff (3, 4): sqrt((9 + 16) / 2)
        assert_eq!(values[0], 0.0);
        assert!((values[1] - (12.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(values[2], 0.0);
    }

    #[test]
    fn test_spm_global_ignores_background() {
        // mean 12.5, threshold 1.5625: the zeros are dropped
        let volume = arr1(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 50.0, 50.0]);
        assert_eq!(spm_global(volume.view()), Some(50.0));

        let flat = arr1(&[3.0, 3.0, 3.0]);
        assert_eq!(spm_global(flat.view()), Some(3.0));
    }

    #[test]
    fn test_spm_global_undefined_for_dark_volume() {
        assert_eq!(spm_global(arr1(&[0.0, 0.0]).view()), None);

        let s = series(vec![vec![1.0, 2.0], vec![0.0, 0.0]]);
        let err = spm_globals(&s).unwrap_err();
        assert!(matches!(err, OutlierError::InvalidInput(ref msg) if msg.contains("volume 1")));
    }

    #[test]
    fn test_metrics_require_volumes() {
        let one = series(vec![vec![1.0; 4]]);
        assert!(matches!(dvars(&one), Err(OutlierError::InvalidInput(_))));
        assert_eq!(vol_means(&one).unwrap(), vec![1.0]);

        let empty = Series::new(vec![4], Vec::new()).unwrap();
        assert!(vol_means(&empty).is_err());
        assert!(spm_globals(&empty).is_err());
    }

    #[test]
    fn test_metric_fn_dispatch() {
        let s = series(vec![vec![2.0, 4.0], vec![6.0, 8.0]]);
        assert_eq!(metric_fn(MetricKind::VolMeans)(&s).unwrap(), vec![3.0, 7.0]);
        assert_eq!(metric_fn(MetricKind::Dvars)(&s).unwrap(), vec![4.0]);
        assert_eq!(metric_fn(MetricKind::SpmGlobal)(&s).unwrap(), vec![3.0, 7.0]);
    }
}
