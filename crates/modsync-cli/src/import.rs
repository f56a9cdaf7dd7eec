use modsync_config::config::get_config;
use modsync_core::{artifact::FsArtifactStore, import::import_index, ModsyncResult};
use modsync_db::DbConnection;
use tracing::debug;

use crate::utils::{load_index, print_json};

pub fn import_file(file: &str, modules: &[String], json: bool) -> ModsyncResult<()> {
    let config = get_config();
    let index = load_index(file)?;

    let storage_path = config.get_storage_path()?;
    let db_path = config.get_db_path()?;
    debug!(
        "Importing {file} into {} with artifacts under {}",
        db_path.display(),
        storage_path.display()
    );

    let store = FsArtifactStore::new(storage_path, config.digest_algorithm());
    let mut db = DbConnection::open(&db_path)?;
    let summary = import_index(db.conn(), &index, modules, &store)?;

    if json {
        print_json(&summary)?;
    }
    Ok(())
}
