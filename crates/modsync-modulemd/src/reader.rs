//! Loading module indexes from plain or compressed files.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::{
    error::{ErrorContext, ModulemdError, Result},
    index::ModuleIndex,
};

/// Magic bytes for Zstandard compressed files.
pub const ZST_MAGIC_BYTES: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Magic bytes for gzip compressed files.
pub const GZIP_MAGIC_BYTES: [u8; 2] = [0x1f, 0x8b];

/// Compression detected from the leading bytes of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn detect(content: &[u8]) -> Self {
        if content.starts_with(&ZST_MAGIC_BYTES) {
            Compression::Zstd
        } else if content.starts_with(&GZIP_MAGIC_BYTES) {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

/// Returns the decompressed bytes of an index.
///
/// # Errors
///
/// Returns [`ModulemdError::Decompress`] if the content carries a compression
/// signature but cannot be decoded.
pub fn decompress(content: Vec<u8>) -> Result<Vec<u8>> {
    let compression = Compression::detect(&content);
    debug!("index compression: {compression:?}");

    match compression {
        Compression::None => Ok(content),
        Compression::Zstd => {
            let mut decoder = zstd::Decoder::new(content.as_slice())
                .map_err(|e| ModulemdError::Decompress(format!("creating zstd decoder: {e}")))?;
            read_all(&mut decoder, "zstd")
        }
        Compression::Gzip => read_all(&mut GzDecoder::new(content.as_slice()), "gzip"),
    }
}

fn read_all<R: Read>(reader: &mut R, format: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| ModulemdError::Decompress(format!("decoding {format}: {e}")))?;
    Ok(out)
}

/// Parses index content that may be zstd or gzip compressed.
pub fn process_index_content(content: Vec<u8>) -> Result<ModuleIndex> {
    let bytes = decompress(content)?;
    ModuleIndex::parse(&bytes)
}

/// Reads and parses an index file such as `modules.yaml` or `modules.yaml.zst`.
pub fn read_index_file<P: AsRef<Path>>(path: P) -> Result<ModuleIndex> {
    let path = path.as_ref();
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    process_index_content(content)
}

/// Reads index content from any reader, for example standard input.
pub fn read_index<R: Read>(mut reader: R) -> Result<ModuleIndex> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .map_err(|source: io::Error| {
            ModulemdError::IoError {
                action: "reading module index".to_string(),
                source,
            }
        })?;
    process_index_content(content)
}
