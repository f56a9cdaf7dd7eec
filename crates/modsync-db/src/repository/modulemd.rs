//! Module stream repository.

use diesel::prelude::*;

use crate::{
    models::{Modulemd, NewModulemd},
    schema::modulemds,
};

/// Repository for module stream operations.
pub struct ModulemdRepository;

impl ModulemdRepository {
    /// Lists all streams ordered by name, stream and newest version first.
    pub fn list_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Modulemd>> {
        Self::list_filtered(conn, None, None)
    }

    /// Lists streams, optionally restricted to a module name and stream name.
    pub fn list_filtered(
        conn: &mut SqliteConnection,
        name: Option<&str>,
        stream: Option<&str>,
    ) -> QueryResult<Vec<Modulemd>> {
        let mut query = modulemds::table.into_boxed();

        if let Some(name) = name {
            query = query.filter(modulemds::name.eq(name));
        }
        if let Some(stream) = stream {
            query = query.filter(modulemds::stream.eq(stream));
        }

        query
            .order((
                modulemds::name.asc(),
                modulemds::stream.asc(),
                modulemds::version.desc(),
                modulemds::context.asc(),
                modulemds::arch.asc(),
            ))
            .load(conn)
    }

    /// Finds a stream by its full NSVCA identity.
    pub fn find_by_nsvca(
        conn: &mut SqliteConnection,
        name: &str,
        stream: &str,
        version: i64,
        context: &str,
        arch: &str,
    ) -> QueryResult<Option<Modulemd>> {
        modulemds::table
            .filter(modulemds::name.eq(name))
            .filter(modulemds::stream.eq(stream))
            .filter(modulemds::version.eq(version))
            .filter(modulemds::context.eq(context))
            .filter(modulemds::arch.eq(arch))
            .first(conn)
            .optional()
    }

    /// Inserts a stream unless one with the same NSVCA exists.
    ///
    /// Returns `true` when a new row was written.
    pub fn insert(conn: &mut SqliteConnection, modulemd: &NewModulemd) -> QueryResult<bool> {
        diesel::insert_or_ignore_into(modulemds::table)
            .values(modulemd)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn count(conn: &mut SqliteConnection) -> QueryResult<i64> {
        modulemds::table.count().get_result(conn)
    }
}
