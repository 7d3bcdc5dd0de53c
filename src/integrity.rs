//! Manifest-based data integrity checks.
//!
//! A manifest lists one `<hex digest> <relative path>` pair per line. Paths
//! are relative to the data directory; the digest length selects the hash.

use std::path::{Path, PathBuf};

use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{OutlierError, Result};

/// Default manifest location, relative to the data directory.
pub const DEFAULT_MANIFEST: &str = "group-00/hash_list.txt";

/// Supported content digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Infer the algorithm from the length of a hex digest.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    pub fn hex_digest(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        }
    }
}

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub digest: String,
    pub path: PathBuf,
}

/// Parse manifest text, skipping blank lines.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(no, line)| {
            let (digest, path) = line
                .trim()
                .split_once(char::is_whitespace)
                .ok_or_else(|| {
                    OutlierError::InvalidInput(format!(
                        "manifest line {}: expected '<hash> <path>'",
                        no + 1
                    ))
                })?;
            Ok(ManifestEntry {
                digest: digest.to_ascii_lowercase(),
                path: PathBuf::from(path.trim()),
            })
        })
        .collect()
}

/// Hex digest of the contents of `path`.
pub fn file_hash(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| OutlierError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(algorithm.hex_digest(&bytes))
}

/// Check every file listed in `manifest` against its recorded digest.
///
/// `manifest` is resolved against `data_directory` when relative. Returns the
/// number of verified files.
pub fn validate_data(data_directory: &Path, manifest: &Path) -> Result<usize> {
    let manifest_path = data_directory.join(manifest);
    let text = std::fs::read_to_string(&manifest_path).map_err(|source| OutlierError::Io {
        path: manifest_path.clone(),
        source,
    })?;

    let entries = parse_manifest(&text)?;
    for entry in &entries {
        let algorithm = HashAlgorithm::from_hex_len(entry.digest.len()).ok_or_else(|| {
            OutlierError::InvalidInput(format!(
                "unrecognised digest '{}' for {}",
                entry.digest,
                entry.path.display()
            ))
        })?;

        let path = data_directory.join(&entry.path);
        let actual = file_hash(&path, algorithm)?;
        if actual != entry.digest {
            return Err(OutlierError::Integrity {
                path,
                expected: entry.digest.clone(),
                actual,
            });
        }
        log::debug!("verified {}", path.display());
    }

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            HashAlgorithm::Sha1.hex_digest(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            HashAlgorithm::Sha256.hex_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_from_hex_len() {
        assert_eq!(HashAlgorithm::from_hex_len(40), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::from_hex_len(64), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::from_hex_len(32), None);
    }

    #[test]
    fn test_parse_manifest() {
        let text = "ABC123 group-00/sub-01/func/sub-01_bold.parquet\n\n  def456   sub-02.json  \n";
        let entries = parse_manifest(text).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    digest: "abc123".to_string(),
                    path: PathBuf::from("group-00/sub-01/func/sub-01_bold.parquet"),
                },
                ManifestEntry {
                    digest: "def456".to_string(),
                    path: PathBuf::from("sub-02.json"),
                },
            ]
        );
    }

    #[test]
    fn test_parse_manifest_rejects_bare_hash() {
        assert!(matches!(
            parse_manifest("abc123\n"),
            Err(OutlierError::InvalidInput(_))
        ));
    }
}
