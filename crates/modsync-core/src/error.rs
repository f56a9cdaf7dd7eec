//! Error types for modsync-core.

use miette::Diagnostic;
use modsync_config::error::ConfigError;
use modsync_db::DbError;
use modsync_modulemd::ModulemdError;
use modsync_utils::error::{FileSystemError, HashError, PathError};
use thiserror::Error;

use crate::ModsyncResult;

/// Core error type for module extraction and import.
#[derive(Error, Diagnostic, Debug)]
pub enum ModsyncError {
    #[error("Module '{0}' not found in the module index")]
    #[diagnostic(
        code(modsync::module_not_found),
        help("Run `modsync parse <FILE>` to list the modules the index provides")
    )]
    ModuleNotFound(String),

    #[error("Stream {stream} of module '{module}' has no {field}")]
    #[diagnostic(
        code(modsync::malformed_stream),
        help("Every module stream must carry name, stream, version, context and arch")
    )]
    MalformedStream {
        module: String,
        stream: String,
        field: &'static str,
    },

    #[error("Failed to write canonical document for {unit}")]
    #[diagnostic(code(modsync::document_write))]
    DocumentWrite {
        unit: String,
        #[source]
        source: ModulemdError,
    },

    #[error("Failed to create artifact: {0}")]
    #[diagnostic(
        code(modsync::artifact_creation),
        help("Check that the artifact storage path is writable")
    )]
    ArtifactCreation(#[source] FileSystemError),

    #[error("Version {version} of {nsvca} does not fit in the database")]
    #[diagnostic(
        code(modsync::version_out_of_range),
        help("Stream versions above 9223372036854775807 cannot be stored")
    )]
    VersionOutOfRange { nsvca: String, version: u64 },

    #[error("Invalid NSVCA '{0}'")]
    #[diagnostic(
        code(modsync::invalid_nsvca),
        help("Use the form NAME:STREAM:VERSION:CONTEXT:ARCH")
    )]
    InvalidNsvca(String),

    #[error("No stored record matches {0}")]
    #[diagnostic(
        code(modsync::record_not_found),
        help("Import the module index first with `modsync import <FILE>`")
    )]
    RecordNotFound(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Modulemd(#[from] ModulemdError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(modsync::path))]
    PathError(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(modsync::hash))]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(code(modsync::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Error while {action}")]
    #[diagnostic(code(modsync::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<diesel::result::Error> for ModsyncError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Db(err.into())
    }
}

pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> ModsyncResult<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> ModsyncResult<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            ModsyncError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
