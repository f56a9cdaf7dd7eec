//! Database connection management.

use std::path::Path;

use diesel::{sql_query, Connection, RunQueryDsl, SqliteConnection};
use tracing::debug;

use crate::{
    error::{DbError, Result},
    migration::apply_migrations,
};

/// Database connection wrapper with migration support.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens the database at `path`, creating it and its parent directory when
    /// missing, and runs pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = SqliteConnection::establish(&path.to_string_lossy())?;

        // WAL mode for better concurrent access
        sql_query("PRAGMA journal_mode = WAL;")
            .execute(&mut conn)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        apply_migrations(&mut conn)?;
        debug!("opened database {}", path.display());

        Ok(Self { conn })
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = SqliteConnection::establish(":memory:")?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Gets a mutable reference to the underlying connection.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl std::ops::Deref for DbConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl std::ops::DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::repository::ModulemdRepository;

    #[test]
    fn test_open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/modsync.db");

        let mut db = DbConnection::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(ModulemdRepository::count(db.conn()).unwrap(), 0);

        drop(db);
        let mut db = DbConnection::open(&path).unwrap();
        assert_eq!(ModulemdRepository::count(&mut db).unwrap(), 0);
    }
}
