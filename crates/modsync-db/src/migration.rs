use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

use crate::error::{DbError, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs all pending schema migrations.
pub fn apply_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    for version in applied {
        debug!("applied migration {version}");
    }

    Ok(())
}
