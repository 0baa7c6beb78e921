//! Effective configuration with full provenance
//!
//! Layers, lowest precedence first:
//! 1. Type defaults
//! 2. Override files (`.toml` or `.json`, chosen by extension)
//! 3. CLI `key.path=value` overrides
//!
//! Every layer is merged into a live [`Configurable`] through the normal store
//! path, and each contributing source is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::instance::Configurable;
use crate::store::Announce;
use crate::types::ConfigType;

/// Schema version for the effective config snapshot
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "configurator/effective_config@1";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Serializable snapshot of a layered configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,
    pub schema_id: String,

    /// When the layers were merged
    pub created_at: DateTime<Utc>,

    /// Name of the type the defaults came from
    pub type_name: String,

    /// The merged configuration tree
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// A live instance built from layered sources
#[derive(Debug)]
pub struct LayeredConfig {
    instance: Configurable,
    sources: Vec<ConfigSource>,
    created_at: DateTime<Utc>,
}

impl LayeredConfig {
    /// Build an instance of `kind` and apply file and CLI layers to it
    pub fn build<P: AsRef<Path>>(
        kind: &ConfigType,
        files: &[P],
        cli_overrides: &[String],
    ) -> Result<Self, ConfigError> {
        let mut instance = kind.instance();
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for path in files {
            let path = path.as_ref();
            let (value, digest) = load_file(path)?;
            instance.add(&value, Announce::Silent);
            debug!(path = %path.display(), %digest, "applied config file");
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if !cli_overrides.is_empty() {
            let overrides = parse_overrides(cli_overrides)?;
            instance.add(&overrides, Announce::Silent);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        Ok(Self {
            instance,
            sources,
            created_at: Utc::now(),
        })
    }

    pub fn instance(&self) -> &Configurable {
        &self.instance
    }

    pub fn into_instance(self) -> Configurable {
        self.instance
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Snapshot the current tree and provenance
    pub fn to_effective(&self) -> EffectiveConfig {
        EffectiveConfig {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: self.created_at,
            type_name: self.instance.kind().name().to_string(),
            config: self.instance.config().clone(),
            sources: self.sources.clone(),
        }
    }
}

impl EffectiveConfig {
    /// Layer `files` and `cli_overrides` over the defaults of `kind` and
    /// snapshot the result
    pub fn build<P: AsRef<Path>>(
        kind: &ConfigType,
        files: &[P],
        cli_overrides: &[String],
    ) -> Result<Self, ConfigError> {
        LayeredConfig::build(kind, files, cli_overrides).map(|layered| layered.to_effective())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }
}

/// Supported override file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Load and parse an override file, returning the value and digest
pub fn load_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let format = FileFormat::from_path(path)?;

    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let value = match format {
        FileFormat::Json => serde_json::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?,
        FileFormat::Toml => {
            let toml_value: toml::Value = toml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
            toml_to_json(toml_value)
        }
    };

    if !value.is_object() {
        return Err(ConfigError::ParseError(format!(
            "{}: top level must be a table",
            path.display()
        )));
    }

    Ok((value, digest))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Fold `key.path=value` assignments into one nested update.
///
/// Values are parsed as JSON when possible and kept as strings otherwise.
pub fn parse_overrides(assignments: &[String]) -> Result<Value, ConfigError> {
    let mut root = Map::new();

    for assignment in assignments {
        let (path, raw) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(assignment.clone()))?;

        let parts: Vec<&str> = path.split('.').collect();
        if path.is_empty() || parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidOverride(assignment.clone()));
        }

        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        insert_path(&mut root, &parts, value);
    }

    Ok(Value::Object(root))
}

fn insert_path(map: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let slot = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported config file format (expected .toml or .json): {0}")]
    UnsupportedFormat(String),

    #[error("Invalid override (expected key.path=value): {0}")]
    InvalidOverride(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{Builder, NamedTempFile};

    fn overrides(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn temp_with_suffix(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_build_with_defaults_only() {
        let layered = LayeredConfig::build::<PathBuf>(&ConfigType::root(), &[], &[]).unwrap();
        let effective = layered.to_effective();

        assert_eq!(effective.schema_version, SCHEMA_VERSION);
        assert_eq!(effective.type_name, "Configurator");
        assert_eq!(effective.get_path("history.root"), Some(&json!("/")));
        assert_eq!(layered.sources().len(), 1);
        assert_eq!(layered.sources()[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_cli_override() {
        let layered = LayeredConfig::build::<PathBuf>(
            &ConfigType::root(),
            &[],
            &overrides(&["history.pushState=false", "item.urlRoot=/api"]),
        )
        .unwrap();

        let instance = layered.instance();
        assert_eq!(instance.get("pushState"), Some(&json!(false)));
        assert_eq!(instance.get("urlRoot"), Some(&json!("/api")));
        assert_eq!(instance.get("history"), Some(&json!({"root": "/", "pushState": false})));
        assert_eq!(layered.sources().last().map(|s| &s.origin), Some(&ConfigOrigin::Cli));
    }

    #[test]
    fn test_toml_file_layer() {
        let mut temp = temp_with_suffix(".toml");
        writeln!(temp, "[itemView]").unwrap();
        writeln!(temp, "tagName = \"li\"").unwrap();
        writeln!(temp, "[itemView.text]").unwrap();
        writeln!(temp, "empty = \"Nothing here\"").unwrap();

        let layered = LayeredConfig::build(&ConfigType::root(), &[temp.path()], &[]).unwrap();
        let effective = layered.to_effective();

        assert_eq!(effective.get_path("itemView.tagName"), Some(&json!("li")));
        assert_eq!(effective.get_path("itemView.text.empty"), Some(&json!("Nothing here")));
        assert_eq!(effective.get_path("collectionView.tagName"), Some(&json!("section")));

        let source = &effective.sources[1];
        assert_eq!(source.origin, ConfigOrigin::File);
        assert_eq!(source.digest.as_ref().map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_json_file_layer() {
        let mut temp = temp_with_suffix(".json");
        write!(temp, "{{\"router\": {{\"routes\": {{\"about\": \"about\"}}}}}}").unwrap();

        let layered = LayeredConfig::build(&ConfigType::root(), &[temp.path()], &[]).unwrap();
        let routes = layered.instance().get("routes").cloned();

        assert_eq!(routes, Some(json!({"": "index", "about": "about"})));
    }

    #[test]
    fn test_cli_wins_over_file() {
        let mut temp = temp_with_suffix(".toml");
        writeln!(temp, "[history]").unwrap();
        writeln!(temp, "root = \"/app\"").unwrap();

        let layered = LayeredConfig::build(
            &ConfigType::root(),
            &[temp.path()],
            &overrides(&["history.root=/cli"]),
        )
        .unwrap();

        assert_eq!(layered.instance().get("root"), Some(&json!("/cli")));
    }

    #[test]
    fn test_missing_file() {
        let result = LayeredConfig::build(
            &ConfigType::root(),
            &[PathBuf::from("/nonexistent/configurator.toml")],
            &[],
        );
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let mut temp = temp_with_suffix(".toml");
        writeln!(temp, "this is = = not toml").unwrap();

        let result = LayeredConfig::build(&ConfigType::root(), &[temp.path()], &[]);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_parse_overrides_values() {
        let value = parse_overrides(&overrides(&[
            "a.n=3",
            "a.flag=true",
            "a.list=[1,2]",
            "a.text=hello world",
            "b=null",
        ]))
        .unwrap();

        assert_eq!(
            value,
            json!({"a": {"n": 3, "flag": true, "list": [1, 2], "text": "hello world"}, "b": null})
        );
    }

    #[test]
    fn test_parse_overrides_rejects_malformed() {
        for bad in ["novalue", "=1", "a..b=1", ".a=1"] {
            let result = parse_overrides(&overrides(&[bad]));
            assert!(
                matches!(result, Err(ConfigError::InvalidOverride(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_effective_serializes() {
        let layered = LayeredConfig::build::<PathBuf>(&ConfigType::root(), &[], &[]).unwrap();
        let json = layered.to_effective().to_json().unwrap();

        assert!(json.contains("\"schema_id\": \"configurator/effective_config@1\""));
        assert!(json.contains("\"origin\": \"builtin\""));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let mut yaml = temp_with_suffix(".yaml");
        write!(yaml, "history:\n  root: /yaml\n").unwrap();

        let result = load_file(yaml.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let mut ini = temp_with_suffix(".ini");
        writeln!(ini, "[history]").unwrap();
        writeln!(ini, "root = \"/ini\"").unwrap();

        let result = LayeredConfig::build(&ConfigType::root(), &[ini.path()], &[]);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let mut temp = temp_with_suffix(".TOML");
        writeln!(temp, "[history]").unwrap();
        writeln!(temp, "root = \"/upper\"").unwrap();

        let (value, _) = load_file(temp.path()).unwrap();
        assert_eq!(value, json!({"history": {"root": "/upper"}}));
    }

    #[test]
    fn test_effective_build_snapshots_layers() {
        let effective = EffectiveConfig::build::<PathBuf>(
            &ConfigType::root(),
            &[],
            &overrides(&["app.name=demo"]),
        )
        .unwrap();

        assert_eq!(effective.get_path("app.name"), Some(&json!("demo")));
        assert_eq!(effective.get_path("history.root"), Some(&json!("/")));
        assert_eq!(effective.sources.len(), 2);
    }

    #[test]
    fn test_into_instance_stays_live() {
        let layered = LayeredConfig::build::<PathBuf>(
            &ConfigType::root(),
            &[],
            &overrides(&["history.root=/cli"]),
        )
        .unwrap();

        let mut instance = layered.into_instance();
        instance.add(&json!({"history": {"pushState": true}}), Announce::Silent);

        assert_eq!(instance.get("root"), Some(&json!("/cli")));
        assert_eq!(instance.get("pushState"), Some(&json!(true)));
    }
}
