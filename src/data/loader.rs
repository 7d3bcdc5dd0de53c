use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::Series;
use crate::error::{OutlierError, Result};

/// Column holding the flattened voxels of each volume.
pub const VOXELS_COLUMN: &str = "voxels";

/// Schema metadata key holding the JSON-encoded volume shape.
pub const SHAPE_METADATA_KEY: &str = "volume_shape";

/// File extensions understood by [`load_series`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["parquet", "pq", "json", "csv"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a series from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per volume, `voxels` list column (recommended)
/// * `.json`    – `{ "volume_shape": [...], "volumes": [[...], ...] }`
/// * `.csv`     – `voxels` column containing semicolon-separated floats
pub fn load_series(path: &Path) -> Result<Series> {
    load_any(path).map_err(|source| OutlierError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether `path` carries one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    let ext = extension(path);
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn load_any(path: &Path) -> anyhow::Result<Series> {
    match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Assemble the series, defaulting to a flat shape when none was recorded.
/// Every voxel must be finite.
fn build_series(shape: Option<Vec<usize>>, volumes: Vec<Vec<f64>>) -> anyhow::Result<Series> {
    for (t, volume) in volumes.iter().enumerate() {
        if let Some(j) = volume.iter().position(|v| !v.is_finite()) {
            bail!("Volume {t}, voxels[{j}]: {} is not a finite number", volume[j]);
        }
    }

    let series = match shape {
        Some(shape) => Series::new(shape, volumes),
        None => Series::from_volumes(volumes),
    };
    series.map_err(anyhow::Error::from)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonSeries {
    #[serde(default)]
    volume_shape: Option<Vec<usize>>,
    volumes: Vec<Vec<f64>>,
}

/// Expected JSON schema:
///
/// ```json
/// {
///   "volume_shape": [2, 2, 2],
///   "volumes": [
///     [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
///     ...
///   ]
/// }
/// ```
fn load_json(path: &Path) -> anyhow::Result<Series> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let parsed: JsonSeries = serde_json::from_str(&text).context("parsing JSON")?;
    build_series(parsed.volume_shape, parsed.volumes)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one row per volume.
/// The `voxels` column contains semicolon-separated floats:
///   `"101.5;99.2;100.7"`
/// All other columns are ignored.
fn load_csv(path: &Path) -> anyhow::Result<Series> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let voxels_idx = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .position(|h| h == VOXELS_COLUMN)
        .context("CSV missing 'voxels' column")?;

    let mut volumes = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = record.get(voxels_idx).unwrap_or("");
        volumes.push(parse_semicolon_floats(cell, row_no)?);
    }

    build_series(None, volumes)
}

fn parse_semicolon_floats(s: &str, row: usize) -> anyhow::Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, voxels[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one volume per row.
///
/// Expected schema:
/// - `voxels`: List<Float64|Float32> or LargeList<…> – flattened volume
/// - schema metadata `volume_shape`: JSON array, e.g. `"[64,64,30]"` (optional)
fn load_parquet(path: &Path) -> anyhow::Result<Series> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let shape = match builder.schema().metadata().get(SHAPE_METADATA_KEY) {
        Some(raw) => Some(
            serde_json::from_str::<Vec<usize>>(raw)
                .with_context(|| format!("invalid '{SHAPE_METADATA_KEY}' metadata: {raw}"))?,
        ),
        None => None,
    };

    let reader = builder.build().context("building parquet reader")?;
    let mut volumes = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let voxels_idx = batch
            .schema()
            .index_of(VOXELS_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'voxels' column"))?;
        let column = batch.column(voxels_idx);

        for row in 0..batch.num_rows() {
            let volume = extract_f64_list(column, row)
                .with_context(|| format!("Volume {}: failed to read 'voxels'", volumes.len()))?;
            volumes.push(volume);
        }
    }

    build_series(shape, volumes)
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> anyhow::Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        f64_arr
            .iter()
            .enumerate()
            .map(|(j, v)| v.with_context(|| format!("null value at voxels[{j}]")))
            .collect()
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        f32_arr
            .iter()
            .enumerate()
            .map(|(j, v)| {
                v.map(f64::from)
                    .with_context(|| format!("null value at voxels[{j}]"))
            })
            .collect()
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("sub-01_bold.parquet")));
        assert!(is_supported(Path::new("sub-01_bold.JSON")));
        assert!(is_supported(Path::new("a/b/sub-01.csv")));
        assert!(!is_supported(Path::new("sub-01_bold.nii.gz")));
        assert!(!is_supported(Path::new("hash_list")));
    }

    #[test]
    fn test_parse_semicolon_floats() {
        assert_eq!(parse_semicolon_floats("1; 2.5;-3", 0).unwrap(), vec![1.0, 2.5, -3.0]);
        assert!(parse_semicolon_floats("1;x", 4).is_err());
    }

    #[test]
    fn test_build_series_rejects_non_finite_voxels() {
        let err = build_series(None, vec![vec![1.0, 2.0], vec![3.0, f64::INFINITY]]).unwrap_err();
        assert!(err.to_string().contains("Volume 1, voxels[1]"));
        assert!(build_series(Some(vec![2]), vec![vec![f64::NAN, 0.0]]).is_err());
    }

    #[test]
    fn test_unsupported_extension_is_load_error() {
        let err = load_series(Path::new("sub-01_bold.nii.gz")).unwrap_err();
        assert!(matches!(err, OutlierError::Load { .. }));
    }
}
