//! Module defaults repository.

use diesel::prelude::*;

use crate::{
    models::{ModulemdDefaults, NewModulemdDefaults},
    schema::modulemd_defaults,
};

/// Repository for module defaults operations.
pub struct DefaultsRepository;

impl DefaultsRepository {
    pub fn list_all(conn: &mut SqliteConnection) -> QueryResult<Vec<ModulemdDefaults>> {
        Self::list_filtered(conn, None)
    }

    /// Lists defaults ordered by module, optionally restricted to one module.
    pub fn list_filtered(
        conn: &mut SqliteConnection,
        module: Option<&str>,
    ) -> QueryResult<Vec<ModulemdDefaults>> {
        let mut query = modulemd_defaults::table.into_boxed();
        if let Some(module) = module {
            query = query.filter(modulemd_defaults::module.eq(module));
        }
        query
            .order((modulemd_defaults::module.asc(), modulemd_defaults::id.asc()))
            .load(conn)
    }

    pub fn find_by_digest(
        conn: &mut SqliteConnection,
        digest: &str,
    ) -> QueryResult<Option<ModulemdDefaults>> {
        modulemd_defaults::table
            .filter(modulemd_defaults::digest.eq(digest))
            .first(conn)
            .optional()
    }

    /// Inserts a defaults entry unless one with the same digest exists.
    ///
    /// Returns `true` when a new row was written.
    pub fn insert(
        conn: &mut SqliteConnection,
        defaults: &NewModulemdDefaults,
    ) -> QueryResult<bool> {
        diesel::insert_or_ignore_into(modulemd_defaults::table)
            .values(defaults)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn count(conn: &mut SqliteConnection) -> QueryResult<i64> {
        modulemd_defaults::table.count().get_result(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DbConnection;

    fn new_defaults<'a>(module: &'a str, stream: &'a str, digest: &'a str) -> NewModulemdDefaults<'a> {
        NewModulemdDefaults {
            module,
            stream,
            profiles: r#"{"default":["nodejs","npm"]}"#,
            digest,
            artifact_size: 10,
            artifact_path: "/store/d1",
        }
    }

    #[test]
    fn test_insert_dedupes_on_digest() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let conn = db.conn();

        assert!(DefaultsRepository::insert(conn, &new_defaults("nodejs", "10", "d1")).unwrap());
        assert!(!DefaultsRepository::insert(conn, &new_defaults("nodejs", "10", "d1")).unwrap());
        assert!(DefaultsRepository::insert(conn, &new_defaults("nodejs", "12", "d2")).unwrap());
        assert_eq!(DefaultsRepository::count(conn).unwrap(), 2);
    }

    #[test]
    fn test_queries() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let conn = db.conn();

        DefaultsRepository::insert(conn, &new_defaults("perl", "5.26", "p1")).unwrap();
        DefaultsRepository::insert(conn, &new_defaults("nodejs", "10", "n1")).unwrap();

        let all = DefaultsRepository::list_all(conn).unwrap();
        let modules: Vec<_> = all.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, ["nodejs", "perl"]);

        let found = DefaultsRepository::find_by_digest(conn, "n1").unwrap().unwrap();
        assert_eq!(found.profiles["default"], ["nodejs", "npm"]);
        assert!(DefaultsRepository::find_by_digest(conn, "zz").unwrap().is_none());

        let perl = DefaultsRepository::list_filtered(conn, Some("perl")).unwrap();
        assert_eq!(perl.len(), 1);
    }
}
