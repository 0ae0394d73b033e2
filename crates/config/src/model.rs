//! Typed view of a processed configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use types::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequireAssetConfig {
    /// Templating integration enabled
    #[serde(default)]
    pub twig: bool,
    /// Asset pipeline integration enabled
    #[serde(default)]
    pub assetic: bool,
    /// Output directory prefix
    #[serde(deserialize_with = "scalar::string")]
    pub output_prefix: String,
    /// Output directory prefix in debug mode
    #[serde(deserialize_with = "scalar::string")]
    pub output_prefix_debug: String,
    /// Path of the composer installed packages file
    #[serde(deserialize_with = "scalar::string")]
    pub composer_installed_path: String,
    /// Register bower packages natively
    pub native_bower: bool,
    /// Register npm packages natively
    pub native_npm: bool,
    /// Project base directory
    #[serde(deserialize_with = "scalar::string")]
    pub base_dir: String,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub default_locale: Option<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub fallback_locale: Option<String>,
    #[serde(default = "default_true")]
    pub auto_configuration: bool,
    #[serde(default = "default_less_filter", deserialize_with = "scalar::string")]
    pub less_assetic_filter: String,
    #[serde(default)]
    pub webpack: WebpackConfig,
    /// Defaults applied to every package
    #[serde(default)]
    pub default: DefaultConfig,
    /// Output path rewrites, in declaration order
    #[serde(default)]
    pub output_rewrites: Map<String, Value>,
    #[serde(default)]
    pub packages: IndexMap<String, PackageConfig>,
    #[serde(default, deserialize_with = "scalar::string_map")]
    pub asset_replacement: IndexMap<String, String>,
    /// Locale → asset → localized inputs
    #[serde(default, deserialize_with = "scalar::locale_map")]
    pub locales: IndexMap<String, IndexMap<String, Vec<String>>>,
    #[serde(default)]
    pub common_assets: IndexMap<String, CommonAssetConfig>,
}

/// Webpack integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebpackConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub adapter: WebpackAdapter,
    #[serde(default)]
    pub manifest_adapter: ManifestAdapterConfig,
    #[serde(default)]
    pub assets_adapter: AssetsAdapterConfig,
}

/// How webpack output is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebpackAdapter {
    #[default]
    Auto,
    Manifest,
    Assets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestAdapterConfig {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetsAdapterConfig {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub file: Option<String>,
    #[serde(default)]
    pub cache: AssetsCacheConfig,
}

/// Cache of the webpack assets file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsCacheConfig {
    /// `None` leaves the decision to the host
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default = "default_cache_key", deserialize_with = "scalar::string")]
    pub key: String,
    #[serde(default = "default_cache_service", deserialize_with = "scalar::string")]
    pub service_id: String,
}

/// Package defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultConfig {
    #[serde(default)]
    pub replace_extensions: bool,
    #[serde(default)]
    pub extensions: IndexMap<String, FileExtensionConfig>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub source_path: Option<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub source_base: Option<String>,
    #[serde(default)]
    pub replace_extensions: bool,
    #[serde(default)]
    pub extensions: IndexMap<String, FileExtensionConfig>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileExtensionConfig {
    #[serde(default, deserialize_with = "scalar::list")]
    pub filters: Vec<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub extension: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub exclude: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonAssetConfig {
    #[serde(deserialize_with = "scalar::string")]
    pub output: String,
    #[serde(default, deserialize_with = "scalar::list")]
    pub inputs: Vec<String>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub filters: Vec<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default, deserialize_with = "scalar::list_map")]
    pub locales: IndexMap<String, Vec<String>>,
}

/// Scalar nodes accept strings, numbers, booleans and null; the typed view
/// reads all of them as strings
mod scalar {
    use indexmap::IndexMap;
    use serde::de::{Deserialize, Deserializer, Error};
    use serde_json::Value;

    fn convert<E: Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Bool(b) => Ok(Some(b.to_string())),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!("invalid type: {}, expected a scalar", types::describe_value(&other)))),
        }
    }

    fn items<E: Error>(value: Value) -> Result<Vec<String>, E> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(values) => values
                .into_iter()
                .map(|v| convert(v).map(Option::unwrap_or_default))
                .collect(),
            other => Ok(convert::<E>(other)?.into_iter().collect()),
        }
    }

    /// Null reads as an empty string
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(convert::<D::Error>(Value::deserialize(deserializer)?)?.unwrap_or_default())
    }

    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        convert(Value::deserialize(deserializer)?)
    }

    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        items(Value::deserialize(deserializer)?)
    }

    pub fn string_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IndexMap<String, String>, D::Error> {
        IndexMap::<String, Value>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| Ok((key, convert::<D::Error>(value)?.unwrap_or_default())))
            .collect()
    }

    pub fn list_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IndexMap<String, Vec<String>>, D::Error> {
        IndexMap::<String, Value>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| Ok((key, items::<D::Error>(value)?)))
            .collect()
    }

    pub fn locale_map<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, IndexMap<String, Vec<String>>>, D::Error> {
        IndexMap::<String, IndexMap<String, Value>>::deserialize(deserializer)?
            .into_iter()
            .map(|(locale, assets)| {
                let assets: IndexMap<String, Vec<String>> = assets
                    .into_iter()
                    .map(|(asset, inputs)| Ok((asset, items::<D::Error>(inputs)?)))
                    .collect::<Result<_, D::Error>>()?;
                Ok((locale, assets))
            })
            .collect()
    }
}

fn default_true() -> bool {
    true
}

fn default_less_filter() -> String {
    "less".to_string()
}

fn default_cache_key() -> String {
    crate::builder::WEBPACK_ASSETS_CACHE_KEY.to_string()
}

fn default_cache_service() -> String {
    "cache.app".to_string()
}

impl Default for WebpackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            adapter: WebpackAdapter::default(),
            manifest_adapter: ManifestAdapterConfig::default(),
            assets_adapter: AssetsAdapterConfig::default(),
        }
    }
}

impl Default for AssetsCacheConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            key: default_cache_key(),
            service_id: default_cache_service(),
        }
    }
}

impl RequireAssetConfig {
    /// Convert a processed configuration value
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Output prefix for the given mode
    pub fn output_prefix_for(&self, debug: bool) -> &str {
        if debug {
            &self.output_prefix_debug
        } else {
            &self.output_prefix
        }
    }

    /// Selected webpack adapter, if webpack is enabled
    pub fn webpack_adapter(&self) -> Option<WebpackAdapter> {
        self.webpack.enabled.then_some(self.webpack.adapter)
    }

    /// Rewritten output path for an asset, if one is declared
    pub fn output_rewrite(&self, asset: &str) -> Option<&Value> {
        self.output_rewrites.get(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, Configuration};
    use crate::processor::Processor;
    use serde_json::json;

    #[test]
    fn test_typed_defaults() {
        let schema = build("/srv/app", "en").unwrap();
        let value = Processor::process(&schema, &[json!({})]).unwrap();
        let config = RequireAssetConfig::from_value(value).unwrap();

        assert_eq!(config.output_prefix_for(false), "assets");
        assert_eq!(config.output_prefix_for(true), "assets-dev");
        assert_eq!(config.default_locale.as_deref(), Some("en"));
        assert_eq!(config.fallback_locale, None);
        assert_eq!(config.webpack_adapter(), None);
        assert_eq!(config.webpack.assets_adapter.file.as_deref(), Some("/srv/app/assets.json"));
        assert_eq!(config.webpack.assets_adapter.cache, AssetsCacheConfig::default());
        assert!(!config.default.replace_extensions);
    }

    #[test]
    fn test_typed_sections() {
        let schema = build("/srv/app", "en").unwrap();
        let document = json!({
            "webpack": {"adapter": "manifest", "manifest_adapter": {"file": "manifest.json"}},
            "output_rewrites": {"foo/bar.js": "bar.js"},
            "packages": {"acme": {"source_path": "vendor/acme", "patterns": ["*.js"]}},
            "common_assets": {
                "app.js": {"output": "js/app.js", "inputs": ["@acme/a.js", "@acme/b.js"]}
            },
            "locales": {"fr": {"@acme/a.js": ["@acme/a-fr.js"]}}
        });
        let value = Processor::process_one(&schema, &document).unwrap();
        let config = RequireAssetConfig::from_value(value).unwrap();

        assert_eq!(config.webpack_adapter(), Some(WebpackAdapter::Manifest));
        assert_eq!(config.output_rewrite("foo/bar.js"), Some(&json!("bar.js")));
        assert_eq!(config.packages["acme"].patterns, ["*.js"]);
        assert_eq!(config.common_assets["app.js"].inputs.len(), 2);
        assert_eq!(config.locales["fr"]["@acme/a.js"], ["@acme/a-fr.js"]);
    }

    #[test]
    fn test_scalar_values_read_as_strings() {
        let schema = build("/srv/app", "en").unwrap();
        let document = json!({
            "output_prefix": 2024,
            "output_prefix_debug": true,
            "fallback_locale": null,
            "default_locale": 1,
            "asset_replacement": {"@acme/a.js": 3},
            "default": {"patterns": ["*.js", 7]},
            "locales": {"fr": {"@acme/a.js": [1.5]}}
        });
        let value = Processor::process_one(&schema, &document).unwrap();
        let config = RequireAssetConfig::from_value(value).unwrap();

        assert_eq!(config.output_prefix, "2024");
        assert_eq!(config.output_prefix_debug, "true");
        assert_eq!(config.fallback_locale, None);
        assert_eq!(config.default_locale.as_deref(), Some("1"));
        assert_eq!(config.asset_replacement["@acme/a.js"], "3");
        assert_eq!(config.default.patterns, ["*.js", "7"]);
        assert_eq!(config.locales["fr"]["@acme/a.js"], ["1.5"]);
    }

    #[test]
    fn test_null_scalar_reads_as_empty_string() {
        let schema = build("/srv/app", "en").unwrap();
        let value = Processor::process_one(&schema, &json!({"output_prefix": null})).unwrap();
        let config = RequireAssetConfig::from_value(value).unwrap();
        assert_eq!(config.output_prefix, "");
        assert_eq!(config.output_prefix_debug, "assets-dev");
    }

    #[test]
    fn test_sections_keep_declaration_order() {
        let schema = build("/srv/app", "en").unwrap();
        let document = json!({
            "packages": {"zeta": {}, "alpha": {}},
            "common_assets": {"z.js": {"output": "z.js"}, "a.js": {"output": "a.js"}},
            "asset_replacement": {"@z/z.js": "z.js", "@a/a.js": "a.js"},
            "locales": {"fr": {}, "de": {}}
        });
        let value = Processor::process_one(&schema, &document).unwrap();
        let config = RequireAssetConfig::from_value(value).unwrap();

        assert_eq!(config.packages.keys().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(config.common_assets.keys().collect::<Vec<_>>(), ["z.js", "a.js"]);
        assert_eq!(config.asset_replacement.keys().collect::<Vec<_>>(), ["@z/z.js", "@a/a.js"]);
        assert_eq!(config.locales.keys().collect::<Vec<_>>(), ["fr", "de"]);
    }

    #[test]
    fn test_legacy_document_deserializes() {
        let schema = Configuration::legacy("/srv/app/app").build().unwrap();
        let value = Processor::process(&schema, &[]).unwrap();
        let config = RequireAssetConfig::from_value(value).unwrap();
        assert!(!config.twig);
        assert_eq!(config.default_locale, None);
        assert!(!config.webpack.enabled);
        assert_eq!(config.base_dir, "/srv/app/app/..");
    }
}
