use modsync_config::config::get_config;
use modsync_core::{
    artifact::MemoryArtifactStore,
    extract::{extract_defaults, extract_streams, select_modules},
    record::{DefaultRecord, StreamRecord},
    ModsyncResult,
};
use nu_ansi_term::Color::{Cyan, Green};
use serde::Serialize;
use tracing::{debug, info};

use crate::utils::{format_requires, load_index, print_json, render_table, short_digest, Colored};

#[derive(Serialize)]
struct ParseOutput {
    streams: Vec<StreamRecord>,
    defaults: Vec<DefaultRecord>,
}

pub fn parse_index(file: &str, modules: &[String], json: bool) -> ModsyncResult<()> {
    let index = load_index(file)?;
    debug!(
        "Read {} streams and {} defaults from {file}",
        index.stream_count(),
        index.defaults_count()
    );

    let store = MemoryArtifactStore::new(get_config().digest_algorithm());
    let names = select_modules(&index, modules);

    let streams = extract_streams(&names, &index, &store)?;
    let mut defaults = extract_defaults(&index, &store)?;
    defaults.retain(|record| names.contains(&record.module.as_str()));

    if json {
        return print_json(&ParseOutput {
            streams,
            defaults,
        });
    }

    if streams.is_empty() {
        info!("No module streams found");
    } else {
        let rows = streams
            .iter()
            .map(|record| {
                [
                    format!("{}", Colored(Cyan, &record.nsvca)),
                    record.artifacts.len().to_string(),
                    format_requires(&record.dependencies),
                    short_digest(&record.artifact.digest).to_string(),
                ]
            })
            .collect();
        let table = render_table(
            "Module Streams",
            ["NSVCA", "RPMs", "Requires", "Digest"],
            rows,
        );
        info!("\n{table}");
    }

    if !defaults.is_empty() {
        let rows = defaults
            .iter()
            .map(|record| {
                [
                    format!("{}", Colored(Cyan, &record.module)),
                    format!("{}", Colored(Green, &record.default_stream)),
                    record.profiles.keys().cloned().collect::<Vec<_>>().join(","),
                    short_digest(&record.digest).to_string(),
                ]
            })
            .collect();
        let table = render_table(
            "Module Defaults",
            ["Module", "Stream", "Profiles", "Digest"],
            rows,
        );
        info!("\n{table}");
    }

    Ok(())
}
