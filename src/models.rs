// src/models.rs

use crate::constants::NO_DESCRIPTION;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

// --- RAW CONFIGURATION MODELS (what is read from the config layers) ---

/// Decodes an explicit `null` (a key left blank in YAML) as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The object form of an alias in the `aliases` section.
/// Every field is optional; absent or null fields take their defaults.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StructuredAlias {
    /// Synonyms for the alias.
    #[serde(deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    /// Shell command templates.
    #[serde(deserialize_with = "null_as_default")]
    pub cmds: Vec<String>,
    /// Human readable description.
    pub desc: Option<String>,
    /// Alias specific environment. Values may be any scalar.
    #[serde(deserialize_with = "null_as_default")]
    pub env: BTreeMap<String, Value>,
    /// Run `cmds` concurrently instead of as a sequence.
    #[serde(deserialize_with = "null_as_default")]
    pub parallel: bool,
    /// Working directory, `~` allowed.
    pub dir: Option<String>,
}

/// A raw alias value, normalized at load time into an [`AliasEntry`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawAlias {
    /// Legacy sugar: the value is the command itself.
    Simple(String),
    /// The full object form.
    Structured(StructuredAlias),
}

impl RawAlias {
    /// Normalizes the raw value into an entry registered under `name`.
    pub fn into_entry(self, name: &str) -> AliasEntry {
        match self {
            Self::Simple(command) => AliasEntry {
                name: name.to_string(),
                commands: vec![command],
                ..AliasEntry::default()
            },
            Self::Structured(alias) => AliasEntry {
                name: name.to_string(),
                synonyms: alias.aliases,
                commands: alias.cmds,
                description: alias
                    .desc
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
                environment: alias
                    .env
                    .iter()
                    .map(|(k, v)| (k.clone(), render_scalar(v)))
                    .collect(),
                working_directory: alias.dir.filter(|d| !d.is_empty()),
                parallel: alias.parallel,
            },
        }
    }
}

/// One job of a grouped parallel run (top-level `parallel` section).
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ParallelCommand {
    /// Prefix shown in front of every output line.
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    /// Color name for the label.
    #[serde(deserialize_with = "null_as_default")]
    pub color: String,
    /// The shell command line.
    #[serde(deserialize_with = "null_as_default")]
    pub command: String,
    /// Working directory, `~` allowed. Empty means inherit.
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
}

// --- RUNTIME MODELS ---

/// A named runnable unit of the alias registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Canonical identifier (the key in the `aliases` section).
    pub name: String,
    /// Alternate names, checked only after every primary name.
    pub synonyms: Vec<String>,
    /// Ordered shell command templates.
    pub commands: Vec<String>,
    /// Description, or the `no desc` sentinel.
    pub description: String,
    /// Alias specific environment, already rendered to strings.
    pub environment: BTreeMap<String, String>,
    /// Raw working directory as written in the config.
    pub working_directory: Option<String>,
    /// Whether `commands` are independent concurrent jobs.
    pub parallel: bool,
}

impl Default for AliasEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            synonyms: Vec::new(),
            commands: Vec::new(),
            description: NO_DESCRIPTION.to_string(),
            environment: BTreeMap::new(),
            working_directory: None,
            parallel: false,
        }
    }
}

/// Case-insensitive variable table used by `{{name}}` placeholders.
/// Names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: HashMap<String, String>,
}

impl VariableTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a variable. The name is lower-cased.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_lowercase(), value.into());
    }

    /// Looks up a variable, ignoring the case of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Iterates `(name, value)` pairs sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut pairs: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when no variable is defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for VariableTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, value) in iter {
            table.insert(name.as_ref(), value);
        }
        table
    }
}

/// Unrecognized CLI flags, raw token → value (empty when valueless).
///
/// Iteration follows the order in which flags first appeared on the command line.
/// Repeating a flag keeps its position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagMap {
    entries: Vec<(String, String)>,
}

impl FlagMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a flag, overwriting the value of an earlier occurrence.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value of a flag by its raw token, e.g. `--env`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates `(raw_key, value)` pairs in command-line order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct flags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no flag was forwarded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut flags = Self::new();
        for (key, value) in iter {
            flags.insert(key, value);
        }
        flags
    }
}

/// Global environment merged with an alias' own environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverlay {
    values: BTreeMap<String, String>,
}

impl EnvironmentOverlay {
    /// Merges `global` with `local`; keys of `local` win.
    pub fn merged(global: &BTreeMap<String, String>, local: &BTreeMap<String, String>) -> Self {
        let mut values = global.clone();
        values.extend(local.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { values }
    }

    /// Reads a value by its name as written in the configuration.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The variables as they are injected into a child process (names upper-cased).
    pub fn injected(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.to_uppercase(), v.clone()))
            .collect()
    }
}

/// A fully materialized child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Host shell program (`sh` or `cmd`).
    pub program: String,
    /// Shell arguments, ending with the command line.
    pub args: Vec<String>,
    /// Working directory; `None` inherits the caller's.
    pub working_dir: Option<PathBuf>,
    /// Variables added on top of the inherited process environment.
    pub env: BTreeMap<String, String>,
    /// The final command line handed to the shell.
    pub line: String,
}

/// Renders a scalar config value the way it is exported to a child or substituted.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_alias_normalizes_to_single_command() {
        let entry = RawAlias::Simple("git status".to_string()).into_entry("st");
        assert_eq!(entry.name, "st");
        assert_eq!(entry.commands, vec!["git status".to_string()]);
        assert_eq!(entry.description, NO_DESCRIPTION);
        assert!(entry.synonyms.is_empty());
        assert!(entry.environment.is_empty());
        assert!(!entry.parallel);
    }

    #[test]
    fn test_structured_alias_renders_env_scalars() {
        let alias: StructuredAlias = serde_json::from_value(json!({
            "cmds": ["serve"],
            "env": { "port": 8080, "debug": true, "name": "api" },
            "desc": ""
        }))
        .unwrap();
        let entry = RawAlias::Structured(alias).into_entry("srv");
        assert_eq!(entry.environment.get("port").map(String::as_str), Some("8080"));
        assert_eq!(entry.environment.get("debug").map(String::as_str), Some("true"));
        assert_eq!(entry.environment.get("name").map(String::as_str), Some("api"));
        // An empty description falls back to the sentinel.
        assert_eq!(entry.description, NO_DESCRIPTION);
    }

    #[test]
    fn test_blank_yaml_keys_take_their_defaults() {
        let value: Value =
            serde_yaml::from_str("cmds:\n  - make\nenv:\naliases:\nparallel:\ndesc:\n").unwrap();
        let alias: StructuredAlias = serde_json::from_value(value).unwrap();
        assert_eq!(alias.cmds, vec!["make".to_string()]);
        assert!(alias.env.is_empty());
        assert!(alias.aliases.is_empty());
        assert!(!alias.parallel);
        assert_eq!(alias.desc, None);

        let job: ParallelCommand =
            serde_json::from_value(json!({ "label": "api", "color": null, "command": "run", "path": null }))
                .unwrap();
        assert_eq!(job.color, "");
        assert_eq!(job.path, "");
    }

    #[test]
    fn test_variable_table_iterates_sorted() {
        let table: VariableTable = [("b", "2"), ("A", "1")].into_iter().collect();
        let pairs: Vec<_> = table.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_variable_table_is_case_insensitive() {
        let table: VariableTable = [("NAME", "world")].into_iter().collect();
        assert_eq!(table.get("name"), Some("world"));
        assert_eq!(table.get("Name"), Some("world"));
        assert_eq!(table.get("other"), None);
    }

    #[test]
    fn test_flag_map_keeps_first_position_and_last_value() {
        let mut flags = FlagMap::new();
        flags.insert("--env", "dev");
        flags.insert("-f", "");
        flags.insert("--env", "prod");
        let pairs: Vec<_> = flags.iter().collect();
        assert_eq!(pairs, vec![("--env", "prod"), ("-f", "")]);
    }

    #[test]
    fn test_environment_overlay_local_wins_and_injects_upper_case() {
        let global = BTreeMap::from([
            ("editor".to_string(), "vim".to_string()),
            ("mode".to_string(), "global".to_string()),
        ]);
        let local = BTreeMap::from([("mode".to_string(), "alias".to_string())]);
        let overlay = EnvironmentOverlay::merged(&global, &local);

        assert_eq!(overlay.get("mode"), Some("alias"));
        let injected = overlay.injected();
        assert_eq!(injected.get("EDITOR").map(String::as_str), Some("vim"));
        assert_eq!(injected.get("MODE").map(String::as_str), Some("alias"));
        assert!(!injected.contains_key("mode"));
    }
}
