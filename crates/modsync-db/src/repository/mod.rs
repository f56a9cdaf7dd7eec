//! Repository pattern implementations for database operations.
//!
//! - [`ModulemdRepository`] - Module stream records
//! - [`DefaultsRepository`] - Module defaults records

pub mod defaults;
pub mod modulemd;

pub use defaults::DefaultsRepository;
pub use modulemd::ModulemdRepository;
