//! End-to-end scans over a temporary data directory.

use std::fs;
use std::path::{Path, PathBuf};

use findoutlie::{
    detect, list_series, scan, NameList, OutlierConfig, OutlierError, Outliers, Pipeline,
};
use tempfile::TempDir;

/// 20 volumes of 8 voxels with a bright spike at `spike`.
fn series_json(spike: usize) -> String {
    let volumes: Vec<Vec<f64>> = (0..20)
        .map(|t| {
            let level = if t == spike { 200.0 } else { 100.0 + ((t * 7) % 5) as f64 * 0.5 };
            let mut volume = vec![0.0, 0.0];
            volume.extend((0..6).map(|k| level + k as f64));
            volume
        })
        .collect();
    serde_json::json!({ "volume_shape": [2, 2, 2], "volumes": volumes }).to_string()
}

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub-02/func/sub-02_bold.json", &series_json(5));
    write(dir.path(), "sub-01/func/sub-01_bold.json", &series_json(12));
    write(dir.path(), "sub-01/func/notes.json", "{}");
    write(dir.path(), "group-00/hash_list.txt", "");
    dir
}

fn config(metric: &str, detector: &str, join: &str) -> OutlierConfig {
    OutlierConfig {
        metric: NameList::from(metric),
        detector: NameList::from(detector),
        mask_join: join.to_string(),
        ..OutlierConfig::default()
    }
}

#[test]
fn test_list_series_is_sorted_and_filtered() {
    let dir = data_dir();
    let found = list_series(dir.path()).unwrap();
    assert_eq!(
        found,
        vec![
            dir.path().join("sub-01/func/sub-01_bold.json"),
            dir.path().join("sub-02/func/sub-02_bold.json"),
        ]
    );
}

#[test]
fn test_scan_with_defaults() {
    let dir = data_dir();
    let results = scan(dir.path(), &OutlierConfig::default()).unwrap();

    let entries: Vec<(PathBuf, Outliers)> = results.into_iter().collect();
    assert_eq!(
        entries,
        vec![
            (
                dir.path().join("sub-01/func/sub-01_bold.json"),
                Outliers::Indices(vec![12])
            ),
            (
                dir.path().join("sub-02/func/sub-02_bold.json"),
                Outliers::Indices(vec![5])
            ),
        ]
    );
}

#[test]
fn test_scan_all_metrics_pads_dvars() {
    let dir = data_dir();
    let results = scan(dir.path(), &config("all", "all", "or")).unwrap();

    let sub01 = &results[&dir.path().join("sub-01/func/sub-01_bold.json")];
    assert_eq!(sub01, &Outliers::Indices(vec![0, 12, 13]));

    // the combined mask starts unflagged, so `and` reports nothing
    let and = scan(dir.path(), &config("all", "all", "and")).unwrap();
    assert!(and.values().all(|found| found == &Outliers::Indices(Vec::new())));
}

#[test]
fn test_detect_single_file_is_idempotent() {
    let dir = data_dir();
    let path = dir.path().join("sub-02/func/sub-02_bold.json");
    let config = config("all", "iqr", "or");

    let first = detect(&path, &config).unwrap();
    let second = detect(&path, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_series_reports_no_volumes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "sub-07_bold.json",
        r#"{"volume_shape": [2, 2, 2], "volumes": []}"#,
    );

    let results = scan(dir.path(), &config("all", "all", "or")).unwrap();
    assert_eq!(
        results.values().collect::<Vec<_>>(),
        vec![&Outliers::NoVolumes]
    );
}

#[test]
fn test_scan_fails_fast_on_bad_file() {
    let dir = data_dir();
    write(dir.path(), "sub-01/func/sub-01_broken.json", "{ not json");

    let err = scan(dir.path(), &OutlierConfig::default()).unwrap_err();
    assert!(matches!(err, OutlierError::Load { ref path, .. } if path.ends_with("sub-01_broken.json")));
}

#[test]
fn test_scan_rejects_non_finite_voxels_at_load() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub-01.csv", "voxels\n4;5;6\n1;NaN;3\n");

    let err = scan(dir.path(), &config("spm_global", "std", "or")).unwrap_err();
    assert!(matches!(err, OutlierError::Load { ref path, .. } if path.ends_with("sub-01.csv")));
}

#[test]
fn test_scan_keep_going_records_failures() {
    let dir = data_dir();
    write(dir.path(), "sub-01/func/sub-01_broken.json", "{ not json");

    let pipeline = Pipeline::new(&OutlierConfig::default()).unwrap();
    let report = pipeline.scan_keep_going(dir.path()).unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.outliers.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report
        .failures
        .contains_key(&dir.path().join("sub-01/func/sub-01_broken.json")));
}

#[test]
fn test_scan_missing_directory() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        scan(&missing, &OutlierConfig::default()),
        Err(OutlierError::Discovery { .. })
    ));
}

#[test]
fn test_invalid_options_fail_before_scanning() {
    let dir = data_dir();
    assert!(matches!(
        scan(dir.path(), &config("vol_means", "std", "nand")),
        Err(OutlierError::InvalidOption(_))
    ));
    assert!(matches!(
        scan(dir.path(), &config("vol_medians", "std", "or")),
        Err(OutlierError::UnknownOption { .. })
    ));
}
