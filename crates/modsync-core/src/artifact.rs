//! Content-addressed storage for canonical documents.

use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use modsync_utils::{fs::write_atomic, hash::DigestAlgorithm};
use serde::Serialize;
use tracing::trace;

use crate::{
    error::{ErrorContext, ModsyncError},
    ModsyncResult,
};

/// Handle to a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    /// Hex digest of the stored bytes.
    pub digest: String,
    pub size: u64,
    pub storage_path: PathBuf,
}

/// Storage that turns document bytes into a content-addressed artifact.
///
/// Storing the same bytes twice yields equal references.
pub trait ArtifactStore: Send + Sync {
    /// Hash function used for artifact addresses.
    fn algorithm(&self) -> DigestAlgorithm;

    fn create_artifact(&self, bytes: &[u8]) -> ModsyncResult<ArtifactRef>;
}

/// Stores artifacts as files below a root directory.
///
/// An artifact with digest `abcdef...` lives at `<root>/ab/cdef...`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    algorithm: DigestAlgorithm,
}

impl FsArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P, algorithm: DigestAlgorithm) -> Self {
        Self {
            root: root.into(),
            algorithm,
        }
    }

    /// Path of the artifact with the given digest, whether stored or not.
    pub fn path_for(&self, digest: &str) -> PathBuf {
        if digest.len() > 2 {
            let (shard, rest) = digest.split_at(2);
            self.root.join(shard).join(rest)
        } else {
            self.root.join(digest)
        }
    }

    /// Reads a stored artifact back.
    pub fn read(&self, digest: &str) -> ModsyncResult<Vec<u8>> {
        let path = self.path_for(digest);
        fs::read(&path).with_context(|| format!("reading artifact {}", path.display()))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn create_artifact(&self, bytes: &[u8]) -> ModsyncResult<ArtifactRef> {
        let digest = self.algorithm.digest(bytes);
        let storage_path = self.path_for(&digest);
        let size = bytes.len() as u64;

        let present = fs::metadata(&storage_path)
            .map(|meta| meta.is_file() && meta.len() == size)
            .unwrap_or(false);

        if present {
            trace!("artifact {digest} already stored");
        } else {
            write_atomic(&storage_path, bytes).map_err(ModsyncError::ArtifactCreation)?;
            trace!("stored artifact {digest} at {}", storage_path.display());
        }

        Ok(ArtifactRef {
            digest,
            size,
            storage_path,
        })
    }
}

/// Keeps artifacts in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    algorithm: DigestAlgorithm,
    artifacts: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            artifacts: Mutex::default(),
        }
    }

    pub fn get(&self, digest: &str) -> Option<Vec<u8>> {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(digest)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn create_artifact(&self, bytes: &[u8]) -> ModsyncResult<ArtifactRef> {
        let digest = self.algorithm.digest(bytes);
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(digest.clone())
            .or_insert_with(|| bytes.to_vec());

        Ok(ArtifactRef {
            storage_path: PathBuf::from("memory").join(&digest),
            digest,
            size: bytes.len() as u64,
        })
    }
}
