use std::{fmt, fs::File, io, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{HashError, HashResult};

/// Hash function used to address stored documents.
///
/// SHA-256 is the default since repository tooling records module snippet
/// digests as SHA-256. BLAKE3 is available for stores that only need a fast
/// content key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }

    /// Returns the lowercase hex digest of `bytes`.
    pub fn digest(&self, bytes: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            DigestAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Calculates the checksum of a file.
///
/// The file is streamed through the selected hash function and the digest is
/// returned as a lowercase hex string.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be read.
///
/// # Example
///
/// ```no_run
/// use modsync_utils::error::HashResult;
/// use modsync_utils::hash::{calculate_checksum, DigestAlgorithm};
///
/// fn main() -> HashResult<()> {
///     let checksum = calculate_checksum("/path/to/file", DigestAlgorithm::Sha256)?;
///     println!("Checksum is {}", checksum);
///     Ok(())
/// }
/// ```
pub fn calculate_checksum<P: AsRef<Path>>(
    file_path: P,
    algorithm: DigestAlgorithm,
) -> HashResult<String> {
    let file_path = file_path.as_ref();
    let read_failed = |err| {
        HashError::ReadFailed {
            path: file_path.to_path_buf(),
            source: err,
        }
    };

    match algorithm {
        DigestAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            hasher.update_mmap(file_path).map_err(read_failed)?;
            Ok(hasher.finalize().to_hex().to_string())
        }
        DigestAlgorithm::Sha256 => {
            let mut file = File::open(file_path).map_err(read_failed)?;
            let mut hasher = Sha256::new();
            io::copy(&mut file, &mut hasher).map_err(read_failed)?;
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

/// Verifies the checksum of a file against an expected value.
///
/// The comparison is case-insensitive.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be read.
pub fn verify_checksum<P: AsRef<Path>>(
    file_path: P,
    algorithm: DigestAlgorithm,
    expected: &str,
) -> HashResult<bool> {
    let actual = calculate_checksum(file_path, algorithm)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const HELLO_SHA256: &str = "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";
    const HELLO_BLAKE3: &str = "dc5a4edb8240b018124052c330270696f96771a63b45250a5c17d3000e823355";

    #[test]
    fn test_digest_bytes() {
        assert_eq!(DigestAlgorithm::Sha256.digest(b"hello world\n"), HELLO_SHA256);
        assert_eq!(DigestAlgorithm::Blake3.digest(b"hello world\n"), HELLO_BLAKE3);
        assert_eq!(
            DigestAlgorithm::Sha256.digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("sha256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("BLAKE3".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Blake3);
        assert!("md5".parse::<DigestAlgorithm>().is_err());
        assert_eq!(DigestAlgorithm::default().to_string(), "sha256");
    }

    #[test]
    fn test_calculate_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world\n").unwrap();

        let sha = calculate_checksum(file.path(), DigestAlgorithm::Sha256).unwrap();
        assert_eq!(sha, HELLO_SHA256);

        let b3 = calculate_checksum(file.path(), DigestAlgorithm::Blake3).unwrap();
        assert_eq!(b3, HELLO_BLAKE3);
    }

    #[test]
    fn test_verify_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world\n").unwrap();

        let upper = HELLO_SHA256.to_uppercase();
        assert!(verify_checksum(file.path(), DigestAlgorithm::Sha256, &upper).unwrap());
        assert!(!verify_checksum(file.path(), DigestAlgorithm::Sha256, "invalid").unwrap());
    }

    #[test]
    fn test_calculate_checksum_file_not_found() {
        let result = calculate_checksum("/path/to/nonexistent/file", DigestAlgorithm::Sha256);
        assert!(matches!(result, Err(HashError::ReadFailed { .. })));
    }
}
