use indexmap::IndexMap;
use serde::{de::IgnoredAny, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    document::{ModuleDefaults, ModuleStream, ModuleStreamV1},
    error::{ModulemdError, Result},
};

pub const MODULEMD_DOCUMENT: &str = "modulemd";
pub const DEFAULTS_DOCUMENT: &str = "modulemd-defaults";

const MODULEMD_VERSION: u64 = 2;
const MODULEMD_LEGACY_VERSION: u64 = 1;
const DEFAULTS_VERSION: u64 = 1;

/// Kind and version of a document; `data` is skipped.
#[derive(Deserialize)]
struct Header {
    document: String,
    version: u64,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    document: &'a str,
    version: u64,
    data: &'a T,
}

/// All streams and the defaults entry known for one module name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    name: String,
    streams: Vec<ModuleStream>,
    defaults: Option<ModuleDefaults>,
}

impl Module {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stream documents in insertion order.
    pub fn streams(&self) -> &[ModuleStream] {
        &self.streams
    }

    pub fn defaults(&self) -> Option<&ModuleDefaults> {
        self.defaults.as_ref()
    }

    /// Returns the highest version of `stream`, the first one on ties.
    pub fn latest_stream(&self, stream: &str) -> Option<&ModuleStream> {
        self.streams
            .iter()
            .filter(|s| s.stream.as_deref() == Some(stream))
            .fold(None, |best: Option<&ModuleStream>, candidate| {
                match best {
                    Some(current) if current.version >= candidate.version => Some(current),
                    _ => Some(candidate),
                }
            })
    }
}

/// An in-memory collection of module streams and module defaults.
///
/// Modules keep the order in which their names were first seen; streams of a
/// module keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleIndex {
    modules: IndexMap<String, Module>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a multi-document modulemd YAML stream.
    ///
    /// `modulemd` v2 documents become streams and `modulemd-defaults` v1
    /// documents become defaults. `modulemd` v1 documents are upgraded to the
    /// v2 layout first. Documents of other kinds, such as
    /// `modulemd-translations`, are skipped. A later defaults document for the
    /// same module replaces an earlier one.
    ///
    /// Headers are read in a first pass so that each `data` section is decoded
    /// directly into its typed form, keeping scalars as written.
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut index = Self::new();
        if text.trim().is_empty() {
            return Ok(index);
        }

        let headers = serde_yaml::Deserializer::from_str(text)
            .enumerate()
            .map(|(position, document)| {
                Option::<Header>::deserialize(document).map_err(|source| {
                    ModulemdError::Parse {
                        document: position,
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let documents = serde_yaml::Deserializer::from_str(text).zip(headers);
        for (position, (document, header)) in documents.enumerate() {
            let Some(header) = header else {
                continue;
            };
            let parse_error = |source| {
                ModulemdError::Parse {
                    document: position,
                    source,
                }
            };

            match (header.document.as_str(), header.version) {
                (MODULEMD_DOCUMENT, MODULEMD_VERSION) => {
                    let Envelope { data } =
                        Envelope::<ModuleStream>::deserialize(document).map_err(parse_error)?;
                    index.add_parsed_stream(position, data)?;
                }
                (MODULEMD_DOCUMENT, MODULEMD_LEGACY_VERSION) => {
                    let Envelope { data } =
                        Envelope::<ModuleStreamV1>::deserialize(document).map_err(parse_error)?;
                    debug!("Upgrading modulemd v1 document at position {position}");
                    index.add_parsed_stream(position, data.into())?;
                }
                (DEFAULTS_DOCUMENT, DEFAULTS_VERSION) => {
                    let Envelope { data } =
                        Envelope::<ModuleDefaults>::deserialize(document).map_err(parse_error)?;
                    let module = data.module.clone();
                    if index.add_defaults(data).is_some() {
                        warn!("Duplicate defaults for module '{module}', keeping the last one");
                    }
                }
                (MODULEMD_DOCUMENT | DEFAULTS_DOCUMENT, version) => {
                    return Err(ModulemdError::UnsupportedVersion {
                        document: position,
                        kind: header.document.clone(),
                        version,
                    });
                }
                (other, _) => {
                    IgnoredAny::deserialize(document).map_err(parse_error)?;
                    debug!("Skipping unsupported document '{other}' at position {position}");
                }
            }
        }

        Ok(index)
    }

    /// Parses raw index bytes.
    ///
    /// # Errors
    ///
    /// * [`ModulemdError::InvalidUtf8`] if the bytes are not valid UTF-8
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|err| {
            ModulemdError::InvalidUtf8 {
                offset: err.valid_up_to(),
            }
        })?;
        Self::parse_str(text)
    }

    fn add_parsed_stream(&mut self, position: usize, stream: ModuleStream) -> Result<()> {
        if stream.name.is_none() {
            return Err(ModulemdError::MissingModuleName(position));
        }
        self.add_stream(stream)
    }

    /// Adds a stream under its module name.
    ///
    /// # Errors
    ///
    /// * [`ModulemdError::MissingModuleName`] if the stream has no name
    pub fn add_stream(&mut self, stream: ModuleStream) -> Result<()> {
        let name = stream
            .name
            .clone()
            .ok_or(ModulemdError::MissingModuleName(0))?;
        self.modules
            .entry(name)
            .or_insert_with_key(|name| Module::new(name))
            .streams
            .push(stream);
        Ok(())
    }

    /// Sets the defaults of a module, returning the entry it replaced.
    pub fn add_defaults(&mut self, defaults: ModuleDefaults) -> Option<ModuleDefaults> {
        let name = defaults.module.clone();
        self.modules
            .entry(name)
            .or_insert_with_key(|name| Module::new(name))
            .defaults
            .replace(defaults)
    }

    pub fn get_module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Maps each module that has a default stream to that stream.
    pub fn default_streams(&self) -> IndexMap<&str, &str> {
        self.modules
            .values()
            .filter_map(|module| {
                let stream = module.defaults.as_ref()?.stream.as_deref()?;
                (!stream.is_empty()).then_some((module.name.as_str(), stream))
            })
            .collect()
    }

    pub fn stream_count(&self) -> usize {
        self.modules.values().map(|m| m.streams.len()).sum()
    }

    pub fn defaults_count(&self) -> usize {
        self.modules
            .values()
            .filter(|m| m.defaults.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Serializes the index as a YAML document stream.
    ///
    /// Stream documents come first, then defaults documents, each in module
    /// order. Every document opens with `---` and closes with `...`.
    pub fn dump(&self) -> Result<String> {
        let mut out = String::new();
        for module in self.modules.values() {
            for stream in &module.streams {
                push_document(&mut out, MODULEMD_DOCUMENT, MODULEMD_VERSION, stream)?;
            }
        }
        for module in self.modules.values() {
            if let Some(defaults) = &module.defaults {
                push_document(&mut out, DEFAULTS_DOCUMENT, DEFAULTS_VERSION, defaults)?;
            }
        }
        Ok(out)
    }
}

fn push_document<T: Serialize>(
    out: &mut String,
    kind: &'static str,
    version: u64,
    data: &T,
) -> Result<()> {
    let body = serde_yaml::to_string(&DocumentRef {
        document: kind,
        version,
        data,
    })
    .map_err(|source| ModulemdError::Write { kind, source })?;

    out.push_str("---\n");
    out.push_str(&body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("...\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODEJS_INDEX: &str = r#"---
document: modulemd
version: 2
data:
  name: nodejs
  stream: 10
  version: 20180920144611
  context: 6c81f848
  arch: x86_64
  summary: Javascript runtime
  dependencies:
  - buildrequires:
      platform: [f29]
    requires:
      platform: [f29]
  profiles:
    default:
      rpms: [nodejs, npm]
    minimal:
      rpms: [nodejs]
  artifacts:
    rpms:
    - nodejs-1:10.11.0-1.module_2200+adbac02b.x86_64
    - npm-1:6.4.1-1.10.11.0.1.module_2200+adbac02b.x86_64
...
---
document: modulemd
version: 2
data:
  name: nodejs
  stream: 8
  version: 20180816123422
  context: 6c81f848
  arch: x86_64
...
---
document: modulemd-translations
version: 1
data:
  module: nodejs
  stream: 10
  modified: 201811081200
...
---
document: modulemd-defaults
version: 1
data:
  module: nodejs
  stream: 10
  profiles:
    10: [default]
...
"#;

    #[test]
    fn test_parse_index() {
        let index = ModuleIndex::parse_str(NODEJS_INDEX).unwrap();
        assert_eq!(index.module_names().collect::<Vec<_>>(), ["nodejs"]);
        assert_eq!(index.stream_count(), 2);
        assert_eq!(index.defaults_count(), 1);

        let module = index.get_module("nodejs").unwrap();
        assert_eq!(module.streams()[0].stream.as_deref(), Some("10"));
        assert_eq!(module.streams()[1].stream.as_deref(), Some("8"));
        assert_eq!(module.streams()[0].rpm_artifacts().len(), 2);

        let defaults = index.default_streams();
        assert_eq!(defaults.get("nodejs"), Some(&"10"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(ModuleIndex::parse_str("").unwrap().is_empty());
        assert!(ModuleIndex::parse_str("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let yaml = "---\ndocument: modulemd\nversion: 3\ndata:\n  name: foo\n...\n";
        let err = ModuleIndex::parse_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            ModulemdError::UnsupportedVersion { version: 3, .. }
        ));

        let yaml = "---\ndocument: modulemd-defaults\nversion: 2\ndata:\n  module: foo\n...\n";
        let err = ModuleIndex::parse_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            ModulemdError::UnsupportedVersion { version: 2, .. }
        ));
    }

    #[test]
    fn test_parse_upgrades_v1_stream() {
        let yaml = r#"---
document: modulemd
version: 1
data:
  name: foo
  stream: 1.10
  version: 5
  dependencies:
    requires:
      platform: f28
...
"#;
        let index = ModuleIndex::parse_str(yaml).unwrap();
        let stream = &index.get_module("foo").unwrap().streams()[0];
        assert_eq!(stream.stream.as_deref(), Some("1.10"));
        assert_eq!(stream.dependencies[0].requires["platform"], vec!["f28"]);

        let dumped = index.dump().unwrap();
        assert!(dumped.starts_with("---\ndocument: modulemd\nversion: 2\n"));
    }

    #[test]
    fn test_float_like_stream_names_survive_parse_and_dump() {
        let yaml = r#"---
document: modulemd
version: 2
data:
  name: nginx
  stream: 1.10
  version: 1
  context: c0ffee42
  arch: x86_64
  dependencies:
  - requires:
      nginx: [1.20]
...
---
document: modulemd
version: 2
data:
  name: nginx
  stream: 1.1
  version: 1
  context: c0ffee42
  arch: x86_64
...
---
document: modulemd-defaults
version: 1
data:
  module: nginx
  stream: 1.10
  profiles:
    1.10: [common]
...
"#;
        let index = ModuleIndex::parse_str(yaml).unwrap();
        let streams = index.get_module("nginx").unwrap().streams();
        assert_eq!(streams[0].nsvca(), "nginx:1.10:1:c0ffee42:x86_64");
        assert_eq!(streams[1].nsvca(), "nginx:1.1:1:c0ffee42:x86_64");
        assert_eq!(streams[0].dependencies[0].requires["nginx"], vec!["1.20"]);
        assert_eq!(index.default_streams().get("nginx"), Some(&"1.10"));

        let reparsed = ModuleIndex::parse_str(&index.dump().unwrap()).unwrap();
        assert_eq!(reparsed, index);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut bytes = b"---\ndocument: modulemd\nversion: 2\ndata:\n  name: foo\n  summary: ".to_vec();
        let offset = bytes.len();
        bytes.extend_from_slice(&[0xff, b'\n']);
        bytes.extend_from_slice(b"...\n");

        let err = ModuleIndex::parse(&bytes).unwrap_err();
        assert!(matches!(err, ModulemdError::InvalidUtf8 { offset: o } if o == offset));
    }

    #[test]
    fn test_stream_without_name() {
        let yaml = "---\ndocument: modulemd\nversion: 2\ndata:\n  stream: main\n...\n";
        let err = ModuleIndex::parse_str(yaml).unwrap_err();
        assert!(matches!(err, ModulemdError::MissingModuleName(0)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ModuleIndex::parse_str("---\ndocument: [unclosed\n").unwrap_err();
        assert!(matches!(err, ModulemdError::Parse { .. }));
    }

    #[test]
    fn test_duplicate_defaults_last_wins() {
        let yaml = r#"---
document: modulemd-defaults
version: 1
data:
  module: foo
  stream: a
...
---
document: modulemd-defaults
version: 1
data:
  module: foo
  stream: b
...
"#;
        let index = ModuleIndex::parse_str(yaml).unwrap();
        assert_eq!(index.default_streams().get("foo"), Some(&"b"));
    }

    #[test]
    fn test_defaults_without_stream() {
        let mut index = ModuleIndex::new();
        index.add_defaults(ModuleDefaults::new("foo"));
        assert_eq!(index.defaults_count(), 1);
        assert!(index.default_streams().is_empty());
    }

    #[test]
    fn test_latest_stream() {
        let mut index = ModuleIndex::new();
        for version in [3, 7, 5] {
            index
                .add_stream(ModuleStream {
                    name: Some("foo".into()),
                    stream: Some("main".into()),
                    version: Some(version),
                    ..Default::default()
                })
                .unwrap();
        }
        let module = index.get_module("foo").unwrap();
        assert_eq!(module.latest_stream("main").unwrap().version, Some(7));
        assert!(module.latest_stream("other").is_none());
    }

    #[test]
    fn test_dump_reparses_to_same_index() {
        let index = ModuleIndex::parse_str(NODEJS_INDEX).unwrap();
        let dumped = index.dump().unwrap();

        assert!(dumped.starts_with("---\ndocument: modulemd\n"));
        assert!(dumped.ends_with("...\n"));
        assert_eq!(dumped.matches("\n...\n").count(), 3);
        assert!(!dumped.contains("modulemd-translations"));

        let defaults_at = dumped.find("modulemd-defaults").unwrap();
        let last_stream_at = dumped.rfind("document: modulemd\n").unwrap();
        assert!(last_stream_at < defaults_at);

        let reparsed = ModuleIndex::parse_str(&dumped).unwrap();
        assert_eq!(reparsed, index);
    }

    #[test]
    fn test_dump_single_stream_is_deterministic() {
        let mut index = ModuleIndex::new();
        index
            .add_stream(ModuleStream {
                name: Some("foo".into()),
                stream: Some("1".into()),
                version: Some(1),
                context: Some("c0ffee42".into()),
                arch: Some("noarch".into()),
                ..Default::default()
            })
            .unwrap();

        let first = index.dump().unwrap();
        let second = index.clone().dump().unwrap();
        assert_eq!(first, second);
        assert!(first.contains("version: 1\n"));
        assert!(!first.contains("stream: 1\n"));

        let reparsed = ModuleIndex::parse_str(&first).unwrap();
        assert_eq!(reparsed, index);
    }
}
