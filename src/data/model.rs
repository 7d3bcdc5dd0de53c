use std::fmt;

use ndarray::{Array2, ArrayView2};

use crate::error::{OutlierError, Result};

// ---------------------------------------------------------------------------
// Series – the complete loaded 4-D dataset
// ---------------------------------------------------------------------------

/// A time series of volumes sharing one shape.
///
/// Voxel values are stored flattened: row `t` of `data` holds every voxel of
/// volume `t`, so `data.nrows()` is the number of time points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Spatial shape of a single volume (e.g. `[64, 64, 30]`).
    volume_shape: Vec<usize>,
    /// `n_trs x n_voxels` voxel matrix.
    data: Array2<f64>,
}

impl Series {
    /// Build a series from flattened volumes.
    ///
    /// Every volume must hold exactly `product(volume_shape)` values, and a
    /// non-empty series must have at least one voxel per volume.
    pub fn new(volume_shape: Vec<usize>, volumes: Vec<Vec<f64>>) -> Result<Self> {
        let n_voxels: usize = volume_shape.iter().product();
        let n_trs = volumes.len();

        if n_trs > 0 && n_voxels == 0 {
            return Err(OutlierError::InvalidInput(format!(
                "volume shape {volume_shape:?} has no voxels"
            )));
        }

        let mut flat = Vec::with_capacity(n_trs * n_voxels);
        for (t, volume) in volumes.into_iter().enumerate() {
            if volume.len() != n_voxels {
                return Err(OutlierError::InvalidInput(format!(
                    "volume {t} has {} values but shape {volume_shape:?} needs {n_voxels}",
                    volume.len()
                )));
            }
            flat.extend(volume);
        }

        let data = Array2::from_shape_vec((n_trs, n_voxels), flat)
            .map_err(|e| OutlierError::InvalidInput(e.to_string()))?;

        Ok(Series { volume_shape, data })
    }

    /// A series with one voxel axis, handy when the spatial layout is unknown.
    pub fn from_volumes(volumes: Vec<Vec<f64>>) -> Result<Self> {
        let n_voxels = volumes.first().map_or(0, Vec::len);
        Self::new(vec![n_voxels], volumes)
    }

    /// Number of time points (volumes).
    pub fn n_trs(&self) -> usize {
        self.data.nrows()
    }

    /// Number of voxels in each volume.
    pub fn n_voxels(&self) -> usize {
        self.data.ncols()
    }

    /// Whether the series holds no volumes.
    pub fn is_empty(&self) -> bool {
        self.n_trs() == 0
    }

    pub fn volume_shape(&self) -> &[usize] {
        &self.volume_shape
    }

    /// Full shape with time last, e.g. `[64, 64, 30, 180]`.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.volume_shape.clone();
        shape.push(self.n_trs());
        shape
    }

    /// The whole `n_trs x n_voxels` matrix.
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} volumes of shape {:?}",
            self.n_trs(),
            self.volume_shape
        )
    }
}
