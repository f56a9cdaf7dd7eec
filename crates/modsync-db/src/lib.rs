//! SQLite persistence for module streams and module defaults.
//!
//! Stream rows are unique on their NSVCA identity and defaults rows on their
//! content digest. Inserting a row that already exists is a no-op.

pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DbConnection;
pub use error::{DbError, Result};
