//! Extraction of stream and defaults records from a module index.
//!
//! Each extracted unit is re-serialized on its own into a canonical document,
//! which is handed to an [`ArtifactStore`] for content-addressed storage.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use modsync_modulemd::{Module, ModuleDefaults, ModuleIndex, ModuleStream};
use tracing::debug;

use crate::{
    artifact::ArtifactStore,
    error::ModsyncError,
    record::{DefaultRecord, Nsvca, StreamRecord},
    ModsyncResult,
};

/// Names of the modules to process: `requested` when non-empty, otherwise
/// every module of the index in index order.
pub fn select_modules<'a>(index: &'a ModuleIndex, requested: &'a [String]) -> Vec<&'a str> {
    if requested.is_empty() {
        index.module_names().collect()
    } else {
        requested.iter().map(String::as_str).collect()
    }
}

/// Extracts one record per stream of each named module.
///
/// Every name is resolved before any artifact is created, so an unknown
/// module leaves the store untouched. Repeated names are visited once.
/// Records follow the order of the names, then the index order of streams.
///
/// # Errors
///
/// * [`ModsyncError::ModuleNotFound`] if a name is not in the index
/// * [`ModsyncError::MalformedStream`] if a stream lacks an NSVCA field
/// * [`ModsyncError::DocumentWrite`] if a canonical document cannot be written
/// * [`ModsyncError::ArtifactCreation`] if the store rejects a document
pub fn extract_streams<S, I>(
    module_names: I,
    index: &ModuleIndex,
    store: &S,
) -> ModsyncResult<Vec<StreamRecord>>
where
    S: ArtifactStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut modules: Vec<&Module> = Vec::new();
    for name in module_names {
        let name = name.as_ref();
        if !seen.insert(name.to_string()) {
            continue;
        }
        let module = index
            .get_module(name)
            .ok_or_else(|| ModsyncError::ModuleNotFound(name.to_string()))?;
        modules.push(module);
    }

    let mut units = Vec::new();
    for module in modules {
        for stream in module.streams() {
            units.push((stream_identity(module.name(), stream)?, stream));
        }
    }

    units
        .into_iter()
        .map(|(nsvca, stream)| build_stream_record(nsvca, stream, store))
        .collect()
}

/// Extracts one record per module that declares a default stream.
///
/// Modules without defaults, or whose defaults name no stream, are skipped.
pub fn extract_defaults<S>(index: &ModuleIndex, store: &S) -> ModsyncResult<Vec<DefaultRecord>>
where
    S: ArtifactStore + ?Sized,
{
    let mut records = Vec::new();

    for (name, default_stream) in index.default_streams() {
        let Some(module) = index.get_module(name) else {
            continue;
        };
        let Some(defaults) = module.defaults() else {
            continue;
        };

        let profiles = resolve_profiles(
            defaults.profiles_for_stream(default_stream),
            module.latest_stream(default_stream),
        );

        let document = defaults_document(defaults)?;
        let digest = store.algorithm().digest(document.as_bytes());
        let artifact = store.create_artifact(document.as_bytes())?;
        debug!("extracted defaults {name}:{default_stream} ({digest})");

        records.push(DefaultRecord {
            module: name.to_string(),
            default_stream: default_stream.to_string(),
            profiles,
            document,
            digest,
            artifact,
        });
    }

    Ok(records)
}

fn stream_identity(module: &str, stream: &ModuleStream) -> ModsyncResult<Nsvca> {
    let malformed = |field| {
        ModsyncError::MalformedStream {
            module: module.to_string(),
            stream: stream.nsvca(),
            field,
        }
    };

    Ok(Nsvca {
        name: stream.name.clone().ok_or_else(|| malformed("name"))?,
        stream: stream.stream.clone().ok_or_else(|| malformed("stream"))?,
        version: stream.version.ok_or_else(|| malformed("version"))?,
        context: stream.context.clone().ok_or_else(|| malformed("context"))?,
        arch: stream.arch.clone().ok_or_else(|| malformed("arch"))?,
    })
}

fn build_stream_record<S>(
    nsvca: Nsvca,
    stream: &ModuleStream,
    store: &S,
) -> ModsyncResult<StreamRecord>
where
    S: ArtifactStore + ?Sized,
{
    let document = stream_document(&nsvca, stream)?;
    let artifact = store.create_artifact(document.as_bytes())?;
    debug!("extracted stream {nsvca} ({})", artifact.digest);

    Ok(StreamRecord {
        artifacts: stream.rpm_artifacts().to_vec(),
        dependencies: flatten_dependencies(stream),
        nsvca,
        document,
        artifact,
    })
}

/// Merges the runtime requirements of all dependency blocks.
///
/// A module named by several blocks keeps the stream list of the last block
/// that names it; lists are not unioned.
fn flatten_dependencies(stream: &ModuleStream) -> IndexMap<String, Vec<String>> {
    let mut flattened = IndexMap::new();
    for dependency in &stream.dependencies {
        for (module, streams) in &dependency.requires {
            if module.is_empty() {
                continue;
            }
            flattened.insert(module.clone(), streams.clone());
        }
    }
    flattened
}

/// Maps each default profile name to the packages of that profile in the
/// stream definition. Unknown profiles map to an empty list.
fn resolve_profiles(
    names: Option<&BTreeSet<String>>,
    definition: Option<&ModuleStream>,
) -> IndexMap<String, Vec<String>> {
    names
        .into_iter()
        .flatten()
        .map(|name| {
            let packages = definition
                .and_then(|stream| stream.profiles.get(name))
                .map(|profile| profile.rpms.clone())
                .unwrap_or_default();
            (name.clone(), packages)
        })
        .collect()
}

fn stream_document(nsvca: &Nsvca, stream: &ModuleStream) -> ModsyncResult<String> {
    let write_error = |source| {
        ModsyncError::DocumentWrite {
            unit: nsvca.to_string(),
            source,
        }
    };

    let mut single = ModuleIndex::new();
    single.add_stream(stream.clone()).map_err(write_error)?;
    single.dump().map_err(write_error)
}

fn defaults_document(defaults: &ModuleDefaults) -> ModsyncResult<String> {
    let mut single = ModuleIndex::new();
    single.add_defaults(defaults.clone());
    single.dump().map_err(|source| {
        ModsyncError::DocumentWrite {
            unit: format!("{} defaults", defaults.module),
            source,
        }
    })
}
