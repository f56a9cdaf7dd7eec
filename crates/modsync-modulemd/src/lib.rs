//! Codec for modulemd YAML document streams.
//!
//! A module index is a YAML stream mixing `modulemd` v2 documents, one per
//! built module stream, and `modulemd-defaults` v1 documents naming the default
//! stream and profiles of a module. [`ModuleIndex`] reads such a stream, can be
//! built up programmatically, and serializes back to the same format.
//!
//! # Example
//!
//! ```
//! use modsync_modulemd::ModuleIndex;
//!
//! let yaml = "---\ndocument: modulemd-defaults\nversion: 1\ndata:\n  module: foo\n  stream: main\n...\n";
//! let index = ModuleIndex::parse_str(yaml).unwrap();
//! assert_eq!(index.default_streams().get("foo"), Some(&"main"));
//! ```

pub mod document;
pub mod error;
pub mod index;
pub mod reader;

pub use document::{Artifacts, Dependencies, ModuleDefaults, ModuleStream, Profile};
pub use error::{ModulemdError, Result};
pub use index::{Module, ModuleIndex};
pub use reader::{read_index, read_index_file};
