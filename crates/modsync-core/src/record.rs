use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    artifact::ArtifactRef,
    error::ModsyncError,
    ModsyncResult,
};

/// Identity of one module stream build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Nsvca {
    pub name: String,
    pub stream: String,
    pub version: u64,
    pub context: String,
    pub arch: String,
}

impl fmt::Display for Nsvca {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.name, self.stream, self.version, self.context, self.arch
        )
    }
}

impl FromStr for Nsvca {
    type Err = ModsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModsyncError::InvalidNsvca(s.to_string());

        let parts: Vec<&str> = s.split(':').collect();
        let [name, stream, version, context, arch] = parts.as_slice() else {
            return Err(invalid());
        };
        if [name, stream, context, arch].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            stream: stream.to_string(),
            version: version.parse().map_err(|_| invalid())?,
            context: context.to_string(),
            arch: arch.to_string(),
        })
    }
}

/// One extracted module stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRecord {
    #[serde(flatten)]
    pub nsvca: Nsvca,

    /// RPM artifact identifiers in source order.
    pub artifacts: Vec<String>,

    /// Runtime requirements: required module name to stream list.
    pub dependencies: IndexMap<String, Vec<String>>,

    /// Canonical single-stream document.
    #[serde(skip)]
    pub document: String,

    pub artifact: ArtifactRef,
}

impl StreamRecord {
    pub fn document_bytes(&self) -> &[u8] {
        self.document.as_bytes()
    }

    pub fn artifacts_json(&self) -> ModsyncResult<String> {
        Ok(serde_json::to_string(&self.artifacts)?)
    }

    pub fn dependencies_json(&self) -> ModsyncResult<String> {
        Ok(serde_json::to_string(&self.dependencies)?)
    }
}

/// One extracted default-stream declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultRecord {
    pub module: String,

    #[serde(rename = "stream")]
    pub default_stream: String,

    /// Default profiles of the default stream mapped to their packages.
    pub profiles: IndexMap<String, Vec<String>>,

    /// Canonical defaults-only document.
    #[serde(skip)]
    pub document: String,

    /// Hex digest of `document`.
    pub digest: String,

    pub artifact: ArtifactRef,
}

impl DefaultRecord {
    pub fn document_bytes(&self) -> &[u8] {
        self.document.as_bytes()
    }

    pub fn profiles_json(&self) -> ModsyncResult<String> {
        Ok(serde_json::to_string(&self.profiles)?)
    }
}
