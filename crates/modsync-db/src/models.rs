use diesel::{prelude::*, sqlite::Sqlite};
use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::{modulemd_defaults, modulemds};

/// A stored module stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modulemd {
    pub id: i32,
    pub name: String,
    pub stream: String,
    pub version: i64,
    pub context: String,
    pub arch: String,
    pub artifacts: Vec<String>,
    pub dependencies: IndexMap<String, Vec<String>>,
    pub artifact_digest: String,
    pub artifact_size: i64,
    pub artifact_path: String,
    pub created_at: String,
}

impl Modulemd {
    pub fn nsvca(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.name, self.stream, self.version, self.context, self.arch
        )
    }
}

impl Queryable<modulemds::SqlType, Sqlite> for Modulemd {
    type Row = (
        i32,
        String,
        String,
        i64,
        String,
        String,
        String,
        String,
        String,
        i64,
        String,
        String,
    );

    fn build(row: Self::Row) -> diesel::deserialize::Result<Self> {
        Ok(Self {
            id: row.0,
            name: row.1,
            stream: row.2,
            version: row.3,
            context: row.4,
            arch: row.5,
            artifacts: serde_json::from_str(&row.6)?,
            dependencies: serde_json::from_str(&row.7)?,
            artifact_digest: row.8,
            artifact_size: row.9,
            artifact_path: row.10,
            created_at: row.11,
        })
    }
}

/// A stored module defaults entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModulemdDefaults {
    pub id: i32,
    pub module: String,
    pub stream: String,
    pub profiles: IndexMap<String, Vec<String>>,
    pub digest: String,
    pub artifact_size: i64,
    pub artifact_path: String,
    pub created_at: String,
}

impl Queryable<modulemd_defaults::SqlType, Sqlite> for ModulemdDefaults {
    type Row = (i32, String, String, String, String, i64, String, String);

    fn build(row: Self::Row) -> diesel::deserialize::Result<Self> {
        Ok(Self {
            id: row.0,
            module: row.1,
            stream: row.2,
            profiles: serde_json::from_str(&row.3)?,
            digest: row.4,
            artifact_size: row.5,
            artifact_path: row.6,
            created_at: row.7,
        })
    }
}

/// Insert form of a module stream. `artifacts` and `dependencies` hold JSON
/// text.
#[derive(Debug, Insertable)]
#[diesel(table_name = modulemds)]
pub struct NewModulemd<'a> {
    pub name: &'a str,
    pub stream: &'a str,
    pub version: i64,
    pub context: &'a str,
    pub arch: &'a str,
    pub artifacts: &'a str,
    pub dependencies: &'a str,
    pub artifact_digest: &'a str,
    pub artifact_size: i64,
    pub artifact_path: &'a str,
}

/// Insert form of a module defaults entry. `profiles` holds JSON text.
#[derive(Debug, Insertable)]
#[diesel(table_name = modulemd_defaults)]
pub struct NewModulemdDefaults<'a> {
    pub module: &'a str,
    pub stream: &'a str,
    pub profiles: &'a str,
    pub digest: &'a str,
    pub artifact_size: i64,
    pub artifact_path: &'a str,
}
