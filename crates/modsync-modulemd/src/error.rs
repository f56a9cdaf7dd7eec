//! Error types for the modulemd codec.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading or writing module metadata documents.
#[derive(Error, Diagnostic, Debug)]
pub enum ModulemdError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(modsync_modulemd::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML document #{document}: {source}")]
    #[diagnostic(
        code(modsync_modulemd::parse),
        help("The module index may be corrupted or is not a modulemd YAML stream")
    )]
    Parse {
        document: usize,
        source: serde_yaml::Error,
    },

    #[error("Module index is not valid UTF-8 (invalid byte at offset {offset})")]
    #[diagnostic(
        code(modsync_modulemd::invalid_utf8),
        help("Module indexes must be UTF-8 encoded YAML")
    )]
    InvalidUtf8 { offset: usize },

    #[error("Unsupported {kind} document version {version} (document #{document})")]
    #[diagnostic(
        code(modsync_modulemd::unsupported_version),
        help("Supported are modulemd v1 and v2 and modulemd-defaults v1 documents")
    )]
    UnsupportedVersion {
        document: usize,
        kind: String,
        version: u64,
    },

    #[error("Module stream in document #{0} has no module name")]
    #[diagnostic(
        code(modsync_modulemd::missing_module_name),
        help("Every modulemd document in an index must set data.name")
    )]
    MissingModuleName(usize),

    #[error("Failed to write {kind} document: {source}")]
    #[diagnostic(code(modsync_modulemd::write))]
    Write {
        kind: &'static str,
        source: serde_yaml::Error,
    },

    #[error("Failed to decompress module index: {0}")]
    #[diagnostic(
        code(modsync_modulemd::decompress),
        help("The compressed index appears to be truncated or corrupted")
    )]
    Decompress(String),
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, ModulemdError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            ModulemdError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModulemdError::MissingModuleName(3);
        assert_eq!(err.to_string(), "Module stream in document #3 has no module name");

        let err = ModulemdError::UnsupportedVersion {
            document: 0,
            kind: "modulemd".to_string(),
            version: 3,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported modulemd document version 3 (document #0)"
        );
    }

    #[test]
    fn test_invalid_utf8_display() {
        let err = ModulemdError::InvalidUtf8 { offset: 42 };
        assert_eq!(
            err.to_string(),
            "Module index is not valid UTF-8 (invalid byte at offset 42)"
        );
    }

    #[test]
    fn test_with_context() {
        let result: std::io::Result<()> = Err(std::io::Error::other("boom"));
        let err = result.with_context(|| "reading modules.yaml".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Error while reading modules.yaml: boom");
    }
}
