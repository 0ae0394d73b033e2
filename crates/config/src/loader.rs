//! Configuration loader implementation

use crate::model::RequireAssetConfig;
use crate::processor::Processor;
use crate::schema::{ConfigurationSchema, NodeKind, OptionNode};
use crate::validation::ConfigValidator;
use anyhow::{Context, Result};
use figment::{providers::Env, Figment};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};
use types::{ConfigError, RequireAssetError};

/// Prefix of environment variables overriding configuration values.
/// Nested keys are separated by `__`, e.g. `FXP_REQUIRE_ASSET_WEBPACK__ADAPTER`.
/// Option names are case-insensitive; map keys such as output rewrite paths
/// keep the case they have in the variable name.
pub const ENV_PREFIX: &str = "FXP_REQUIRE_ASSET_";

/// Configuration loader that handles YAML/JSON files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and process configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P, schema: &ConfigurationSchema) -> Result<Value> {
        let document = Self::read_document(config_path.as_ref(), schema.name())?;
        Self::process(document, schema)
    }

    /// Load configuration from a YAML string (for testing)
    pub fn load_from_str(yaml_content: &str, schema: &ConfigurationSchema) -> Result<Value> {
        let document = Self::parse_yaml(yaml_content)
            .context("Failed to parse configuration from string")?;
        Self::process(unwrap_root(document, schema.name()), schema)
    }

    /// Load, process, convert and validate configuration
    pub fn load_typed<P: AsRef<Path>>(config_path: P, schema: &ConfigurationSchema) -> Result<RequireAssetConfig> {
        let value = Self::load(config_path, schema)?;
        Self::resolve(value)
    }

    /// Convert a processed configuration and run the semantic checks
    pub fn resolve(value: Value) -> Result<RequireAssetConfig> {
        let config = RequireAssetConfig::from_value(value)?;

        let report = ConfigValidator::validate(&config);
        for issue in &report.warnings {
            warn!(field = %issue.field, "{}", issue.message);
        }
        if let Some(issue) = report.errors.first() {
            return Err(ConfigError::ValidationError {
                field: issue.field.clone(),
                message: issue.message.clone(),
            }
            .into());
        }

        Ok(config)
    }

    /// Read a raw document; the format follows the file extension
    pub fn read_document(config_path: &Path, root_name: &str) -> Result<Value> {
        // Check if config file exists
        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| RequireAssetError::Io {
            path: config_path.display().to_string(),
            message: e.to_string(),
        })?;

        let extension = config_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let document = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat {
                path: config_path.display().to_string(),
            }),
        }
        .with_context(|| format!("Failed to parse configuration file {}", config_path.display()))?;

        debug!(path = %config_path.display(), "configuration file read");
        Ok(unwrap_root(document, root_name))
    }

    fn parse_yaml(content: &str) -> std::result::Result<Value, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Environment overrides as a document; `None` when nothing is set
    pub fn env_document(schema: &ConfigurationSchema) -> Result<Option<Value>> {
        let document: Value = Figment::from(Env::prefixed(ENV_PREFIX).split("__").lowercase(false))
            .extract()
            .context("Failed to read environment overrides")?;

        Ok(match lowercase_option_names(schema.root(), document) {
            Value::Object(map) if map.is_empty() => None,
            Value::Null => None,
            other => Some(other),
        })
    }

    fn process(document: Value, schema: &ConfigurationSchema) -> Result<Value> {
        let mut documents = vec![document];
        if let Some(overrides) = Self::env_document(schema)? {
            debug!("applying environment overrides");
            documents.push(overrides);
        }

        let config = Processor::process(schema, &documents)
            .map_err(RequireAssetError::from)
            .context("Invalid configuration")?;
        Ok(config)
    }

    /// Write the reference configuration of a schema to a file
    pub fn create_reference<P: AsRef<Path>>(path: P, schema: &ConfigurationSchema) -> Result<()> {
        let yaml_content = schema
            .dump_reference()
            .context("Failed to serialize reference configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write reference configuration file")?;

        Ok(())
    }
}

/// Lowercase the keys naming object options; keys of prototyped maps are
/// user data and stay as written
fn lowercase_option_names(node: &OptionNode, value: Value) -> Value {
    match (&node.kind, value) {
        (NodeKind::Object { children, .. }, Value::Object(map)) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let key = key.to_lowercase();
                    let value = match children.iter().find(|c| c.name == key) {
                        Some(child) => lowercase_option_names(child, value),
                        None => value,
                    };
                    (key, value)
                })
                .collect(),
        ),
        (NodeKind::Prototyped { prototype, .. }, Value::Object(map)) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, lowercase_option_names(prototype, value)))
                .collect(),
        ),
        (_, value) => value,
    }
}

/// Accept documents wrapped in the root key as well as bare ones
fn unwrap_root(document: Value, root_name: &str) -> Value {
    match document {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(root_name) => {
            map.remove(root_name).unwrap_or(Value::Null)
        }
        other => other,
    }
}
