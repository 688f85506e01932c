// src/core/registry.rs

//! # Alias Registry
//!
//! Normalizes the raw `aliases` section into [`AliasEntry`] values and resolves a
//! user supplied name (primary or synonym) to exactly one entry.
//!
//! Entries are kept sorted by name, so lookups are deterministic: when two entries
//! share a synonym, the alphabetically first one wins.

use crate::models::{AliasEntry, RawAlias, StructuredAlias};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A structured alias that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// The alias key.
    pub name: String,
    /// The decoder's message.
    pub message: String,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.name, self.message)
    }
}

/// An alias whose value has a shape that cannot describe an alias (number, list...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedAlias {
    /// The alias key.
    pub name: String,
    /// Type of the value found, see [`value_kind`].
    pub kind: &'static str,
}

/// The `aliases` section cannot be turned into a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The section is not a mapping.
    #[error("The 'aliases' section must be a mapping, found {0}.")]
    NotAMapping(&'static str),
    /// One or more structured aliases have fields of the wrong type.
    #[error("{}", describe_failures(.0))]
    Decode(Vec<DecodeFailure>),
}

fn describe_failures(failures: &[DecodeFailure]) -> String {
    let noun = if failures.len() == 1 { "entry" } else { "entries" };
    let list = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} alias {} could not be decoded: {}", failures.len(), noun, list)
}

/// The merged, read-only set of aliases for one invocation.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    entries: BTreeMap<String, AliasEntry>,
    skipped: Vec<UnsupportedAlias>,
}

impl AliasRegistry {
    /// Builds the registry from the raw `aliases` section.
    ///
    /// - A string value becomes a single-command entry.
    /// - An object is decoded; absent fields take their defaults.
    /// - Any other shape is reported and skipped.
    ///
    /// Loading is strict: if any object fails to decode, no registry is returned and the
    /// error lists every offending key.
    pub fn load(section: Option<&Value>) -> Result<Self, RegistryError> {
        let raw = match section {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(RegistryError::NotAMapping(value_kind(other))),
        };

        let mut entries = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();

        for (name, value) in raw {
            let raw_alias = match value {
                Value::String(command) => RawAlias::Simple(command.clone()),
                Value::Object(_) => {
                    match serde_json::from_value::<StructuredAlias>(value.clone()) {
                        Ok(alias) => RawAlias::Structured(alias),
                        Err(e) => {
                            log::error!("Failed to decode alias '{}': {}", name, e);
                            failures.push(DecodeFailure {
                                name: name.clone(),
                                message: e.to_string(),
                            });
                            continue;
                        }
                    }
                }
                other => {
                    let kind = value_kind(other);
                    println!("unsupported alias value type for {:?}: {}", name, kind);
                    log::warn!("Skipping alias '{}' with unsupported value type {}.", name, kind);
                    skipped.push(UnsupportedAlias {
                        name: name.clone(),
                        kind,
                    });
                    continue;
                }
            };
            entries.insert(name.clone(), raw_alias.into_entry(name));
        }

        if !failures.is_empty() {
            return Err(RegistryError::Decode(failures));
        }

        log::debug!(
            "Alias registry loaded: {} entries, {} skipped.",
            entries.len(),
            skipped.len()
        );
        Ok(Self { entries, skipped })
    }

    /// Resolves `query` to an entry.
    ///
    /// Primary names are checked first; synonyms are only consulted when no entry is
    /// named `query`.
    pub fn resolve(&self, query: &str) -> Option<&AliasEntry> {
        if let Some(entry) = self.entries.get(query) {
            return Some(entry);
        }
        let found = self
            .entries
            .values()
            .find(|entry| entry.synonyms.iter().any(|s| s == query));
        if let Some(entry) = found {
            log::debug!("'{}' resolved as a synonym of '{}'.", query, entry.name);
        }
        found
    }

    /// Iterates the entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.values()
    }

    /// Aliases that were ignored because of their value type.
    pub fn skipped(&self) -> &[UnsupportedAlias] {
        &self.skipped
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Human name of a JSON value type, used in diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NO_DESCRIPTION;
    use serde_json::json;

    #[test]
    fn test_load_absent_section_is_empty() {
        let registry = AliasRegistry::load(None).unwrap();
        assert!(registry.is_empty());
        let registry = AliasRegistry::load(Some(&Value::Null)).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_mixed_entries() {
        let section = json!({
            "st": "git status",
            "deploy": {
                "aliases": ["d", "ship"],
                "cmds": ["make build", "make push"],
                "desc": "Build and push",
                "env": { "stage": "prod" },
                "dir": "~/work"
            }
        });
        let registry = AliasRegistry::load(Some(&section)).unwrap();
        assert_eq!(registry.len(), 2);

        let st = registry.resolve("st").unwrap();
        assert_eq!(st.commands, vec!["git status".to_string()]);
        assert_eq!(st.description, NO_DESCRIPTION);

        let deploy = registry.resolve("deploy").unwrap();
        assert_eq!(deploy.synonyms, vec!["d".to_string(), "ship".to_string()]);
        assert_eq!(deploy.commands.len(), 2);
        assert_eq!(deploy.description, "Build and push");
        assert_eq!(deploy.working_directory.as_deref(), Some("~/work"));
        assert!(!deploy.parallel);
    }

    #[test]
    fn test_load_accepts_blank_yaml_fields() {
        let section: Value = serde_yaml::from_str(
            "build:\n  cmds: [make]\n  env:\n  aliases:\nst: git status\n",
        )
        .unwrap();
        let registry = AliasRegistry::load(Some(&section)).unwrap();
        assert_eq!(registry.len(), 2);

        let build = registry.resolve("build").unwrap();
        assert_eq!(build.commands, vec!["make".to_string()]);
        assert!(build.environment.is_empty());
        assert!(build.synonyms.is_empty());
        assert!(registry.resolve("st").is_some());
    }

    #[test]
    fn test_load_skips_unsupported_shapes() {
        let section = json!({ "ok": "echo ok", "bad": 42, "list": ["a", "b"] });
        let registry = AliasRegistry::load(Some(&section)).unwrap();
        assert_eq!(registry.len(), 1);
        let mut skipped: Vec<_> = registry
            .skipped()
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();
        skipped.sort();
        assert_eq!(skipped, vec![("bad", "number"), ("list", "list")]);
    }

    #[test]
    fn test_load_is_strict_and_reports_every_bad_entry() {
        let section = json!({
            "good": "echo ok",
            "broken": { "cmds": "not-a-list" },
            "worse": { "parallel": "yes" }
        });
        let err = AliasRegistry::load(Some(&section)).unwrap_err();
        match &err {
            RegistryError::Decode(failures) => {
                let names: Vec<_> = failures.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["broken", "worse"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("2 alias entries"));
        assert!(message.contains("'broken'"));
        assert!(message.contains("'worse'"));
    }

    #[test]
    fn test_load_rejects_non_mapping_section() {
        let section = json!(["a", "b"]);
        assert!(matches!(
            AliasRegistry::load(Some(&section)),
            Err(RegistryError::NotAMapping("list"))
        ));
    }

    #[test]
    fn test_resolve_by_synonym() {
        let section = json!({ "deploy": { "aliases": ["ship"], "cmds": ["make push"] } });
        let registry = AliasRegistry::load(Some(&section)).unwrap();
        assert_eq!(registry.resolve("ship").unwrap().name, "deploy");
        assert!(registry.resolve("nope").is_none());
    }

    #[test]
    fn test_primary_name_beats_synonym() {
        // "build" is a synonym of "a_release", which would be scanned before "build"
        // if synonyms were consulted in the same pass.
        let section = json!({
            "a_release": { "aliases": ["build"], "cmds": ["make release"] },
            "build": { "cmds": ["make build"] }
        });
        let registry = AliasRegistry::load(Some(&section)).unwrap();
        let entry = registry.resolve("build").unwrap();
        assert_eq!(entry.name, "build");
        assert_eq!(entry.commands, vec!["make build".to_string()]);
    }

    #[test]
    fn test_shared_synonym_resolves_to_first_entry_by_name() {
        let section = json!({
            "zeta": { "aliases": ["x"], "cmds": ["echo zeta"] },
            "alpha": { "aliases": ["x"], "cmds": ["echo alpha"] }
        });
        let registry = AliasRegistry::load(Some(&section)).unwrap();
        assert_eq!(registry.resolve("x").unwrap().name, "alpha");
    }
}
