//! Persisting extracted records.

use diesel::{Connection, SqliteConnection};
use modsync_db::{
    models::{NewModulemd, NewModulemdDefaults},
    repository::{DefaultsRepository, ModulemdRepository},
};
use modsync_modulemd::ModuleIndex;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    artifact::{ArtifactRef, ArtifactStore},
    error::ModsyncError,
    extract::{extract_defaults, extract_streams, select_modules},
    record::{DefaultRecord, StreamRecord},
    ModsyncResult,
};

/// Counts of records written or found already present by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub streams_added: usize,
    pub streams_existing: usize,
    pub defaults_added: usize,
    pub defaults_existing: usize,
}

/// Extracts records from `index` and stores them in the database.
///
/// With an empty `modules` list every module of the index is imported;
/// otherwise only the named modules and their defaults. All rows are written
/// in one transaction: any failure leaves the database unchanged. Artifacts
/// created before the failure stay in the store.
pub fn import_index<S>(
    conn: &mut SqliteConnection,
    index: &ModuleIndex,
    modules: &[String],
    store: &S,
) -> ModsyncResult<ImportSummary>
where
    S: ArtifactStore + ?Sized,
{
    let names = select_modules(index, modules);

    let streams = extract_streams(&names, index, store)?;
    let mut defaults = extract_defaults(index, store)?;
    defaults.retain(|record| names.contains(&record.module.as_str()));

    let summary = conn.transaction::<_, ModsyncError, _>(|conn| {
        let mut summary = ImportSummary::default();

        for record in &streams {
            if persist_stream(conn, record)? {
                summary.streams_added += 1;
            } else {
                debug!("stream {} already stored", record.nsvca);
                summary.streams_existing += 1;
            }
        }

        for record in &defaults {
            if persist_defaults(conn, record)? {
                summary.defaults_added += 1;
            } else {
                debug!("defaults {} already stored", record.digest);
                summary.defaults_existing += 1;
            }
        }

        Ok(summary)
    })?;

    info!(
        "Imported {} new streams ({} already present) and {} new defaults ({} already present)",
        summary.streams_added,
        summary.streams_existing,
        summary.defaults_added,
        summary.defaults_existing
    );

    Ok(summary)
}

fn persist_stream(conn: &mut SqliteConnection, record: &StreamRecord) -> ModsyncResult<bool> {
    let version = i64::try_from(record.nsvca.version).map_err(|_| {
        ModsyncError::VersionOutOfRange {
            nsvca: record.nsvca.to_string(),
            version: record.nsvca.version,
        }
    })?;
    let artifacts = record.artifacts_json()?;
    let dependencies = record.dependencies_json()?;
    let artifact_path = record.artifact.storage_path.to_string_lossy();

    let row = NewModulemd {
        name: &record.nsvca.name,
        stream: &record.nsvca.stream,
        version,
        context: &record.nsvca.context,
        arch: &record.nsvca.arch,
        artifacts: &artifacts,
        dependencies: &dependencies,
        artifact_digest: &record.artifact.digest,
        artifact_size: stored_size(&record.artifact),
        artifact_path: &artifact_path,
    };

    Ok(ModulemdRepository::insert(conn, &row)?)
}

fn persist_defaults(conn: &mut SqliteConnection, record: &DefaultRecord) -> ModsyncResult<bool> {
    let profiles = record.profiles_json()?;
    let artifact_path = record.artifact.storage_path.to_string_lossy();

    let row = NewModulemdDefaults {
        module: &record.module,
        stream: &record.default_stream,
        profiles: &profiles,
        digest: &record.digest,
        artifact_size: stored_size(&record.artifact),
        artifact_path: &artifact_path,
    };

    Ok(DefaultsRepository::insert(conn, &row)?)
}

fn stored_size(artifact: &ArtifactRef) -> i64 {
    i64::try_from(artifact.size).unwrap_or(i64::MAX)
}
