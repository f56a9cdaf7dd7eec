//! Module metadata extraction and canonicalization.
//!
//! [`extract::extract_streams`] and [`extract::extract_defaults`] walk a
//! parsed [`ModuleIndex`](modsync_modulemd::ModuleIndex) and turn every module
//! stream and every default-stream declaration into a record paired with a
//! standalone canonical document. Documents are stored through an
//! [`ArtifactStore`](artifact::ArtifactStore); [`import::import_index`] persists
//! the records.

use error::ModsyncError;

pub mod artifact;
pub mod error;
pub mod extract;
pub mod import;
pub mod record;

pub type ModsyncResult<T> = std::result::Result<T, ModsyncError>;
