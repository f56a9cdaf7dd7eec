//! Typed views of `modulemd` and `modulemd-defaults` document data.
//!
//! Only the fields the importer reads are typed. Every other key is kept in
//! the `extra` mapping of the owning struct so that a parsed document can be
//! written back without losing content.
//!
//! Typed scalars are read as strings straight from the YAML source, so an
//! unquoted stream name such as `1.10` stays `1.10`.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    marker::PhantomData,
};

use indexmap::IndexMap;
use serde::{
    de::{self, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor},
    Deserialize, Serialize,
};
use serde_yaml::{Mapping, Value};

/// The `data` section of a `modulemd` v2 document: one build of a module
/// stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModuleStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_version"
    )]
    pub version: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    /// Untyped keys such as `summary`, `license`, `components` or `xmd`.
    #[serde(flatten)]
    pub extra: Mapping,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependencies>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, Profile>,

    #[serde(default, skip_serializing_if = "Artifacts::is_empty")]
    pub artifacts: Artifacts,
}

impl ModuleStream {
    /// Returns the NSVCA identity string, with `?` for absent fields.
    pub fn nsvca(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.name.as_deref().unwrap_or("?"),
            self.stream.as_deref().unwrap_or("?"),
            self.version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string()),
            self.context.as_deref().unwrap_or("?"),
            self.arch.as_deref().unwrap_or("?"),
        )
    }

    /// RPM artifact identifiers in document order.
    pub fn rpm_artifacts(&self) -> &[String] {
        &self.artifacts.rpms
    }
}

/// One entry of the `dependencies` list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Dependencies {
    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "stream_lists"
    )]
    pub buildrequires: IndexMap<String, Vec<String>>,

    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "stream_lists"
    )]
    pub requires: IndexMap<String, Vec<String>>,
}

/// An installation profile of a stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_list"
    )]
    pub rpms: Vec<String>,

    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Artifacts {
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_list"
    )]
    pub rpms: Vec<String>,

    /// Other artifact kinds, for example `rpm-map`.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Artifacts {
    pub fn is_empty(&self) -> bool {
        self.rpms.is_empty() && self.extra.is_empty()
    }
}

/// The `data` section of a `modulemd-defaults` v1 document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModuleDefaults {
    pub module: String,

    /// Default stream, absent when the module has no default stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,

    /// Default profile names keyed by stream name.
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "profile_sets"
    )]
    pub profiles: BTreeMap<String, BTreeSet<String>>,

    /// Untyped keys such as `modified` or `intents`.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ModuleDefaults {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Default::default()
        }
    }

    /// Default profile names for `stream`, sorted.
    pub fn profiles_for_stream(&self, stream: &str) -> Option<&BTreeSet<String>> {
        self.profiles.get(stream)
    }

    /// Default profile names for the default stream.
    pub fn default_profiles(&self) -> Option<&BTreeSet<String>> {
        self.stream
            .as_deref()
            .and_then(|stream| self.profiles_for_stream(stream))
    }
}

/// The `data` section of a `modulemd` v1 document.
///
/// Version 1 lists dependencies as a single mapping of module name to one
/// stream. [`ModuleStream::from`] upgrades it to the version 2 layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct ModuleStreamV1 {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    stream: Option<String>,

    #[serde(default, deserialize_with = "optional_version")]
    version: Option<u64>,

    #[serde(default)]
    context: Option<String>,

    #[serde(default)]
    arch: Option<String>,

    #[serde(flatten)]
    extra: Mapping,

    #[serde(default, deserialize_with = "null_as_default")]
    dependencies: DependenciesV1,

    #[serde(default)]
    profiles: IndexMap<String, Profile>,

    #[serde(default)]
    artifacts: Artifacts,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct DependenciesV1 {
    #[serde(default, deserialize_with = "null_as_default")]
    buildrequires: IndexMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    requires: IndexMap<String, String>,
}

impl From<ModuleStreamV1> for ModuleStream {
    fn from(v1: ModuleStreamV1) -> Self {
        let widen = |deps: IndexMap<String, String>| {
            deps.into_iter()
                .map(|(module, stream)| (module, vec![stream]))
                .collect::<IndexMap<_, _>>()
        };

        let dependencies = if v1.dependencies == DependenciesV1::default() {
            Vec::new()
        } else {
            vec![Dependencies {
                buildrequires: widen(v1.dependencies.buildrequires),
                requires: widen(v1.dependencies.requires),
            }]
        };

        let mut extra = v1.extra;
        if let Some(eol) = extra.remove("eol") {
            let mut rawhide = Mapping::new();
            rawhide.insert("eol".into(), eol);
            match extra.get_mut("servicelevels") {
                Some(Value::Mapping(levels)) => {
                    if !levels.contains_key("rawhide") {
                        levels.insert("rawhide".into(), Value::Mapping(rawhide));
                    }
                }
                _ => {
                    let mut levels = Mapping::new();
                    levels.insert("rawhide".into(), Value::Mapping(rawhide));
                    extra.insert("servicelevels".into(), Value::Mapping(levels));
                }
            }
        }

        Self {
            name: v1.name,
            stream: v1.stream,
            version: v1.version,
            context: v1.context,
            arch: v1.arch,
            extra,
            dependencies,
            profiles: v1.profiles,
            artifacts: v1.artifacts,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A YAML sequence of strings. Null reads as an empty list.
struct StringList(Vec<String>);

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StringListVisitor;

        impl<'de> Visitor<'de> for StringListVisitor {
            type Value = StringList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of strings")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(StringList(Vec::new()))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                self.visit_unit()
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<String>()? {
                    items.push(item);
                }
                Ok(StringList(items))
            }
        }

        deserializer.deserialize_any(StringListVisitor)
    }
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    StringList::deserialize(deserializer).map(|list| list.0)
}

/// A mapping of names to string lists, collected into `M`. Null reads as an
/// empty mapping.
struct KeyedLists<M>(PhantomData<M>);

impl<'de, M> Visitor<'de> for KeyedLists<M>
where
    M: Default + Extend<(String, Vec<String>)>,
{
    type Value = M;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of names to lists of strings")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(M::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        self.visit_unit()
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut result = M::default();
        while let Some((key, list)) = map.next_entry::<String, StringList>()? {
            result.extend([(key, list.0)]);
        }
        Ok(result)
    }
}

fn stream_lists<'de, D>(deserializer: D) -> Result<IndexMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(KeyedLists(PhantomData))
}

fn profile_sets<'de, D>(deserializer: D) -> Result<BTreeMap<String, BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let lists: BTreeMap<String, Vec<String>> =
        deserializer.deserialize_any(KeyedLists(PhantomData))?;
    Ok(lists
        .into_iter()
        .map(|(stream, names)| (stream, names.into_iter().collect()))
        .collect())
}

fn optional_version<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct VersionVisitor;

    impl<'de> Visitor<'de> for VersionVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned integer module version")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim()
                .parse()
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(VersionVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_numeric_scalars() {
        let yaml = r#"
name: nodejs
stream: 10
version: "20180920144611"
context: 6c81f848
arch: x86_64
"#;
        let stream: ModuleStream = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(stream.stream.as_deref(), Some("10"));
        assert_eq!(stream.version, Some(20180920144611));
        assert_eq!(stream.nsvca(), "nodejs:10:20180920144611:6c81f848:x86_64");
    }

    #[test]
    fn test_stream_keeps_unknown_keys() {
        let yaml = r#"
name: foo
stream: "1"
version: 1
context: c0ffee42
arch: noarch
summary: Foo module
license:
  module: [MIT]
artifacts:
  rpms: [foo-0:1.0-1.noarch]
  rpm-map: {}
"#;
        let stream: ModuleStream = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            stream.extra.get("summary"),
            Some(&Value::String("Foo module".into()))
        );
        assert!(stream.extra.contains_key("license"));
        assert_eq!(stream.rpm_artifacts(), ["foo-0:1.0-1.noarch"]);
        assert!(stream.artifacts.extra.contains_key("rpm-map"));
    }

    #[test]
    fn test_stream_missing_fields() {
        let stream: ModuleStream = serde_yaml::from_str("summary: nothing else").unwrap();
        assert!(stream.name.is_none());
        assert!(stream.version.is_none());
        assert!(stream.rpm_artifacts().is_empty());
        assert_eq!(stream.nsvca(), "?:?:?:?:?");
    }

    #[test]
    fn test_invalid_version() {
        let result = serde_yaml::from_str::<ModuleStream>("name: a\nversion: -3\n");
        assert!(result.is_err());
        let result = serde_yaml::from_str::<ModuleStream>("name: a\nversion: abc\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_dependencies() {
        let yaml = r#"
buildrequires:
  platform: [f29]
requires:
  platform: [f29, f30]
  nodejs: [10]
  empty:
"#;
        let deps: Dependencies = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(deps.buildrequires["platform"], vec!["f29"]);
        assert_eq!(deps.requires["platform"], vec!["f29", "f30"]);
        assert_eq!(deps.requires["nodejs"], vec!["10"]);
        assert!(deps.requires["empty"].is_empty());
        let keys: Vec<_> = deps.requires.keys().collect();
        assert_eq!(keys, ["platform", "nodejs", "empty"]);
    }

    #[test]
    fn test_scalar_list_rejected() {
        let result = serde_yaml::from_str::<Dependencies>("requires:\n  nodejs: 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_float_like_streams_kept_verbatim() {
        let yaml = r#"
name: nginx
stream: 1.10
version: 3
context: 0.20
arch: x86_64
dependencies:
- requires:
    nginx: [1.20, 1.1]
    1.0: []
profiles:
  1.10:
    rpms: [nginx]
"#;
        let stream: ModuleStream = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(stream.stream.as_deref(), Some("1.10"));
        assert_eq!(stream.context.as_deref(), Some("0.20"));
        assert_eq!(stream.nsvca(), "nginx:1.10:3:0.20:x86_64");
        assert_eq!(stream.dependencies[0].requires["nginx"], vec!["1.20", "1.1"]);
        assert!(stream.dependencies[0].requires.contains_key("1.0"));
        assert!(stream.profiles.contains_key("1.10"));

        let written = serde_yaml::to_string(&stream).unwrap();
        let reread: ModuleStream = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reread, stream);
    }

    #[test]
    fn test_float_like_defaults_kept_verbatim() {
        let yaml = r#"
module: nginx
stream: 1.10
profiles:
  1.10: [common]
  1.1: [minimal]
"#;
        let defaults: ModuleDefaults = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(defaults.stream.as_deref(), Some("1.10"));
        let profiles: Vec<_> = defaults.default_profiles().unwrap().iter().collect();
        assert_eq!(profiles, ["common"]);
        assert!(defaults.profiles_for_stream("1.1").is_some());
    }

    #[test]
    fn test_null_identity_fields() {
        let stream: ModuleStream =
            serde_yaml::from_str("name: foo\nstream: ~\ncontext:\n").unwrap();
        assert!(stream.stream.is_none());
        assert!(stream.context.is_none());
    }

    #[test]
    fn test_upgrade_v1_stream() {
        let yaml = r#"
name: foo
stream: 1.10
version: 20180101000000
summary: Foo
eol: 2019-12-01
dependencies:
  buildrequires:
    platform: f28
  requires:
    platform: f28
    bar: 1.0
profiles:
  default:
    rpms: [foo]
"#;
        let v1: ModuleStreamV1 = serde_yaml::from_str(yaml).unwrap();
        let stream = ModuleStream::from(v1);

        assert_eq!(stream.stream.as_deref(), Some("1.10"));
        assert_eq!(stream.version, Some(20180101000000));
        assert_eq!(stream.dependencies.len(), 1);
        assert_eq!(stream.dependencies[0].buildrequires["platform"], vec!["f28"]);
        assert_eq!(stream.dependencies[0].requires["bar"], vec!["1.0"]);
        assert_eq!(stream.profiles["default"].rpms, vec!["foo"]);
        assert!(!stream.extra.contains_key("eol"));
        assert_eq!(
            stream.extra["servicelevels"]["rawhide"]["eol"],
            Value::String("2019-12-01".into())
        );
    }

    #[test]
    fn test_upgrade_v1_without_dependencies() {
        let v1: ModuleStreamV1 = serde_yaml::from_str("name: foo\ndependencies:\n").unwrap();
        assert!(ModuleStream::from(v1).dependencies.is_empty());
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
module: nodejs
stream: 10
profiles:
  10: [minimal, default, default]
  8: [default]
modified: 201812071200
"#;
        let defaults: ModuleDefaults = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(defaults.module, "nodejs");
        assert_eq!(defaults.stream.as_deref(), Some("10"));

        let profiles: Vec<_> = defaults.default_profiles().unwrap().iter().collect();
        assert_eq!(profiles, ["default", "minimal"]);
        assert!(defaults.profiles_for_stream("12").is_none());
        assert!(defaults.extra.contains_key("modified"));
    }

    #[test]
    fn test_defaults_require_module() {
        assert!(serde_yaml::from_str::<ModuleDefaults>("stream: main\n").is_err());
    }
}
