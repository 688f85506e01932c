//! # Config Loader
//!
//! Reads the configuration layers of an invocation and merges them into one
//! [`ConfigSnapshot`]:
//!
//! 1. **Global:** `~/.ali/config.{yaml,yml,toml,json}`, skipped with `--local-env`.
//! 2. **Local:** `./.ali` in the current directory.
//! 3. **Includes:** every path listed under `include`, a directory meaning `<dir>/.ali`.
//!
//! Every layer is decoded into a `serde_json::Value` tree regardless of its format, and
//! later layers are merged into earlier ones key by key. Missing layers are empty.
use crate::{
    constants::{GLOBAL_CONFIG_EXTENSIONS, GLOBAL_CONFIG_STEM, LOCAL_CONFIG_FILENAME},
    core::{paths, registry::value_kind},
    models::{ParallelCommand, VariableTable, render_scalar},
};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// A configuration layer or section that cannot be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Could not read config file '{path}': {source}")]
    Read {
        /// The layer path.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid in its format.
    #[error("Could not parse config file '{path}': {message}")]
    Parse {
        /// The layer path.
        path: String,
        /// The decoder's message.
        message: String,
    },
    /// The top level of the file is not a mapping.
    #[error("Config file '{path}' must contain a mapping at the top level, found {kind}.")]
    NotAMapping {
        /// The layer path.
        path: String,
        /// Type of the value found.
        kind: &'static str,
    },
    /// A known section has the wrong shape.
    #[error("Invalid '{section}' section: {message}")]
    InvalidSection {
        /// Section name, e.g. `vars` or `parallel.dev`.
        section: String,
        /// What is wrong with it.
        message: String,
    },
}

/// The on-disk formats a layer can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML, also used for JSON-compatible `.ali` files.
    Yaml,
    /// TOML.
    Toml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension. Anything unknown (including the
    /// extension-less `.ali`) is read as YAML, which also accepts JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::Toml,
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Where the loader looks for its layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Directory holding the global config file. `None` skips the global layer.
    pub global_dir: Option<PathBuf>,
    /// Directory holding the local `.ali` file.
    pub local_dir: Option<PathBuf>,
}

impl ConfigSources {
    /// The standard sources: `~/.ali` (unless `local_only`) and the current directory.
    pub fn standard(local_only: bool) -> Self {
        let global_dir = if local_only {
            None
        } else {
            match paths::ali_dir() {
                Ok(dir) => Some(dir),
                Err(e) => {
                    log::warn!("Global config layer unavailable: {}", e);
                    None
                }
            }
        };
        Self {
            global_dir,
            local_dir: std::env::current_dir().ok(),
        }
    }
}

/// The merged configuration of one invocation. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot {
    root: Map<String, Value>,
}

impl ConfigSnapshot {
    /// Loads and merges every layer described by `sources`.
    pub fn load(sources: &ConfigSources) -> Result<Self, ConfigError> {
        let mut root = Value::Object(Map::new());

        if let Some(global_dir) = &sources.global_dir {
            match find_global_config(global_dir) {
                Some(path) => {
                    log::debug!("Using global config: {}", path.display());
                    merge_values(&mut root, read_layer(&path)?);
                }
                None => log::debug!("No global config found in {}", global_dir.display()),
            }
        }

        if let Some(local_dir) = &sources.local_dir {
            let path = local_dir.join(LOCAL_CONFIG_FILENAME);
            if path.is_file() {
                log::debug!("Using local config: {}", path.display());
                merge_values(&mut root, read_layer(&path)?);
            } else {
                log::debug!("Local config not found at {}", path.display());
            }
        }

        let includes = include_paths(&root);
        log::debug!("Includes: {:?}", includes);
        for include in includes {
            let expanded = paths::expand_tilde(&include);
            let path = if expanded.is_dir() {
                expanded.join(LOCAL_CONFIG_FILENAME)
            } else {
                expanded
            };
            if !path.is_file() {
                println!("failed to get include file stat: {}", path.display());
                log::warn!("Included config '{}' not found, skipping.", path.display());
                continue;
            }
            log::debug!("Merging included config: {}", path.display());
            merge_values(&mut root, read_layer(&path)?);
        }

        match root {
            Value::Object(root) => Ok(Self { root }),
            _ => Ok(Self::default()),
        }
    }

    /// Builds a snapshot from an already decoded tree. A non-mapping tree is empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    /// The raw `aliases` section, if any.
    pub fn aliases(&self) -> Option<&Value> {
        self.root.get("aliases")
    }

    /// The `vars` section as a variable table.
    pub fn variables(&self) -> Result<VariableTable, ConfigError> {
        Ok(scalar_section(&self.root, "vars")?
            .into_iter()
            .collect())
    }

    /// The global `env` section, values rendered to strings.
    pub fn global_env(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        scalar_section(&self.root, "env")
    }

    /// The jobs of the group `parallel.<name>`, or `None` if no such group exists.
    pub fn parallel_group(&self, name: &str) -> Result<Option<Vec<ParallelCommand>>, ConfigError> {
        let Some(group) = self
            .root
            .get("parallel")
            .and_then(Value::as_object)
            .and_then(|groups| groups.get(name))
        else {
            return Ok(None);
        };
        serde_json::from_value(group.clone())
            .map(Some)
            .map_err(|e| ConfigError::InvalidSection {
                section: format!("parallel.{}", name),
                message: e.to_string(),
            })
    }
}

/// Finds `config.<ext>` in `dir`, trying the known extensions in order.
fn find_global_config(dir: &Path) -> Option<PathBuf> {
    GLOBAL_CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", GLOBAL_CONFIG_STEM, ext)))
        .find(|path| path.is_file())
}

/// Reads and decodes a single layer.
pub fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_layer(&content, ConfigFormat::from_path(path)).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            message,
        },
        ConfigError::NotAMapping { kind, .. } => ConfigError::NotAMapping {
            path: path.display().to_string(),
            kind,
        },
        other => other,
    })
}

/// Decodes layer content. Empty content is an empty mapping.
pub fn parse_layer(content: &str, format: ConfigFormat) -> Result<Value, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let parse_error = |message: String| ConfigError::Parse {
        path: String::new(),
        message,
    };
    let value: Value = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
    };
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        other => Err(ConfigError::NotAMapping {
            path: String::new(),
            kind: value_kind(&other),
        }),
    }
}

/// Deep-merges `overlay` into `base`. Mappings merge key by key; anything else is replaced.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn include_paths(root: &Value) -> Vec<String> {
    match root.get("include") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// Reads a `name -> scalar` section. Absent or `null` is empty; nested values are rejected.
fn scalar_section(
    root: &Map<String, Value>,
    section: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let map = match root.get(section) {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ConfigError::InvalidSection {
                section: section.to_string(),
                message: format!("expected a mapping, found {}", value_kind(other)),
            });
        }
    };
    map.iter()
        .map(|(key, value)| match value {
            Value::Array(_) | Value::Object(_) => Err(ConfigError::InvalidSection {
                section: section.to_string(),
                message: format!("'{}' must be a scalar, found {}", key, value_kind(value)),
            }),
            scalar => Ok((key.clone(), render_scalar(scalar))),
        })
        .collect()
}

// MARK: --- UNIT TESTS ---
