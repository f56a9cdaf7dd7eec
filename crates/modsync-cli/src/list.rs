use modsync_config::config::get_config;
use modsync_core::ModsyncResult;
use modsync_db::{
    repository::{DefaultsRepository, ModulemdRepository},
    DbConnection,
};
use nu_ansi_term::Color::{Cyan, Green, LightRed};
use tracing::info;

use crate::utils::{format_requires, print_json, render_table, short_digest, Colored};

fn open_db() -> ModsyncResult<DbConnection> {
    Ok(DbConnection::open(get_config().get_db_path()?)?)
}

pub fn list_streams(name: Option<&str>, stream: Option<&str>, json: bool) -> ModsyncResult<()> {
    let mut db = open_db()?;
    let rows = ModulemdRepository::list_filtered(db.conn(), name, stream)?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        info!("No module streams stored");
        return Ok(());
    }

    let total = rows.len();
    let rows = rows
        .iter()
        .map(|row| {
            [
                format!("{}", Colored(Cyan, &row.name)),
                format!("{}", Colored(Green, &row.stream)),
                format!("{}", Colored(LightRed, row.version)),
                row.context.clone(),
                row.arch.clone(),
                row.artifacts.len().to_string(),
                format_requires(&row.dependencies),
                short_digest(&row.artifact_digest).to_string(),
            ]
        })
        .collect();

    let table = render_table(
        "Module Streams",
        [
            "Name", "Stream", "Version", "Context", "Arch", "RPMs", "Requires", "Digest",
        ],
        rows,
    );
    info!("\n{table}");
    info!("{} streams", Colored(Cyan, total));
    Ok(())
}

pub fn list_defaults(module: Option<&str>, json: bool) -> ModsyncResult<()> {
    let mut db = open_db()?;
    let rows = DefaultsRepository::list_filtered(db.conn(), module)?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        info!("No module defaults stored");
        return Ok(());
    }

    let rows = rows
        .iter()
        .map(|row| {
            let profiles = row
                .profiles
                .iter()
                .map(|(profile, rpms)| format!("{profile} ({})", rpms.len()))
                .collect::<Vec<_>>()
                .join(", ");
            [
                format!("{}", Colored(Cyan, &row.module)),
                format!("{}", Colored(Green, &row.stream)),
                profiles,
                short_digest(&row.digest).to_string(),
            ]
        })
        .collect();

    let table = render_table(
        "Module Defaults",
        ["Module", "Stream", "Profiles", "Digest"],
        rows,
    );
    info!("\n{table}");
    Ok(())
}
