use std::fs;

use modsync_config::config::{get_config, Config};
use modsync_core::{
    error::{ErrorContext, ModsyncError},
    record::Nsvca,
    ModsyncResult,
};
use modsync_db::{
    repository::{DefaultsRepository, ModulemdRepository},
    DbConnection,
};
use modsync_utils::hash::verify_checksum;
use tracing::{debug, warn};

/// Prints a stored canonical document.
///
/// An argument containing `:` names a stream by NSVCA; anything else is taken
/// as the digest of a stored defaults document.
pub fn show(target: &str) -> ModsyncResult<()> {
    let config = get_config();
    let mut db = DbConnection::open(config.get_db_path()?)?;

    let (path, digest) = if target.contains(':') {
        find_stream(&mut db, target)?
    } else {
        let record = DefaultsRepository::find_by_digest(db.conn(), target)?
            .ok_or_else(|| ModsyncError::RecordNotFound(format!("defaults {target}")))?;
        debug!("Reading {} defaults from {}", record.module, record.artifact_path);
        (record.artifact_path, record.digest)
    };

    print_artifact(&config, &path, &digest)
}

fn find_stream(db: &mut DbConnection, nsvca: &str) -> ModsyncResult<(String, String)> {
    let nsvca: Nsvca = nsvca.parse()?;
    let version = i64::try_from(nsvca.version).map_err(|_| {
        ModsyncError::VersionOutOfRange {
            nsvca: nsvca.to_string(),
            version: nsvca.version,
        }
    })?;

    let record = ModulemdRepository::find_by_nsvca(
        db.conn(),
        &nsvca.name,
        &nsvca.stream,
        version,
        &nsvca.context,
        &nsvca.arch,
    )?
    .ok_or_else(|| ModsyncError::RecordNotFound(nsvca.to_string()))?;

    debug!("Reading {} from {}", nsvca, record.artifact_path);
    Ok((record.artifact_path, record.artifact_digest))
}

fn print_artifact(config: &Config, path: &str, digest: &str) -> ModsyncResult<()> {
    let document =
        fs::read_to_string(path).with_context(|| format!("reading artifact {path}"))?;

    if !verify_checksum(path, config.digest_algorithm(), digest)? {
        warn!(
            "Artifact {} does not match its recorded {} digest",
            path,
            config.digest_algorithm()
        );
    }

    print!("{document}");
    Ok(())
}
