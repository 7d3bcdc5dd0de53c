use std::fs;
use std::path::Path;

use findoutlie::integrity::{file_hash, validate_data, HashAlgorithm, DEFAULT_MANIFEST};
use findoutlie::OutlierError;
use tempfile::TempDir;

fn data_with_manifest(algorithm: HashAlgorithm) -> TempDir {
    let dir = TempDir::new().unwrap();
    let files = [
        ("sub-01/func/sub-01_bold.json", "{\"volumes\": [[1.0]]}"),
        ("sub-02/func/sub-02_bold.csv", "voxels\n1;2\n"),
    ];

    let mut manifest = String::new();
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        let digest = file_hash(&path, algorithm).unwrap();
        manifest.push_str(&format!("{digest} {relative}\n"));
    }

    let manifest_path = dir.path().join(DEFAULT_MANIFEST);
    fs::create_dir_all(manifest_path.parent().unwrap()).unwrap();
    fs::write(manifest_path, manifest).unwrap();
    dir
}

#[test]
fn test_valid_sha1_manifest() {
    let dir = data_with_manifest(HashAlgorithm::Sha1);
    let verified = validate_data(dir.path(), Path::new(DEFAULT_MANIFEST)).unwrap();
    assert_eq!(verified, 2);
}

#[test]
fn test_valid_sha256_manifest() {
    let dir = data_with_manifest(HashAlgorithm::Sha256);
    assert_eq!(validate_data(dir.path(), Path::new(DEFAULT_MANIFEST)).unwrap(), 2);
}

#[test]
fn test_modified_file_fails() {
    let dir = data_with_manifest(HashAlgorithm::Sha1);
    fs::write(dir.path().join("sub-02/func/sub-02_bold.csv"), "voxels\n1;3\n").unwrap();

    let err = validate_data(dir.path(), Path::new(DEFAULT_MANIFEST)).unwrap_err();
    match err {
        OutlierError::Integrity { path, expected, actual } => {
            assert!(path.ends_with("sub-02/func/sub-02_bold.csv"));
            assert_ne!(expected, actual);
        }
        other => panic!("expected integrity error, got {other:?}"),
    }
}

#[test]
fn test_missing_listed_file_fails() {
    let dir = data_with_manifest(HashAlgorithm::Sha1);
    fs::remove_file(dir.path().join("sub-01/func/sub-01_bold.json")).unwrap();

    assert!(matches!(
        validate_data(dir.path(), Path::new(DEFAULT_MANIFEST)),
        Err(OutlierError::Io { .. })
    ));
}

#[test]
fn test_missing_manifest_fails() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        validate_data(dir.path(), Path::new("hash_list.txt")),
        Err(OutlierError::Io { .. })
    ));
}
