//! Schema builder for the `fxp_require_asset` configuration tree

use crate::fragments::FragmentSet;
use crate::schema::{ConfigurationSchema, OptionNode, ROOT_NAME};
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ConfigError;

/// Cache key used by the webpack assets adapter
pub const WEBPACK_ASSETS_CACHE_KEY: &str = "fxp_require_asset_webpack_assets";

/// Optional integrations present in the host; only used to compute defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Templating integration is available
    pub twig: bool,
    /// Asset pipeline integration is available
    pub assetic: bool,
}

impl Capabilities {
    pub fn new(twig: bool, assetic: bool) -> Self {
        Self { twig, assetic }
    }
}

/// Which generation of the schema to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPreset {
    /// Rooted at the application directory, without webpack or locales
    Legacy,
    /// Rooted at the project directory, with webpack, locales and capabilities
    #[default]
    Current,
}

/// Builds the configuration schema from the project directory and locale
#[derive(Debug, Clone)]
pub struct Configuration {
    base_dir: String,
    default_locale: Option<String>,
    preset: SchemaPreset,
    capabilities: Capabilities,
    fragments: FragmentSet,
}

impl Configuration {
    /// Current schema for a project directory and default locale
    pub fn new(project_dir: impl Into<String>, default_locale: impl Into<String>) -> Self {
        Self {
            base_dir: project_dir.into(),
            default_locale: Some(default_locale.into()),
            preset: SchemaPreset::Current,
            capabilities: Capabilities::default(),
            fragments: FragmentSet::default(),
        }
    }

    /// Legacy schema; paths are computed one level above `root_dir`
    pub fn legacy(root_dir: impl Into<String>) -> Self {
        Self {
            base_dir: root_dir.into(),
            default_locale: None,
            preset: SchemaPreset::Legacy,
            capabilities: Capabilities::default(),
            fragments: FragmentSet::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_fragments(mut self, fragments: FragmentSet) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn preset(&self) -> SchemaPreset {
        self.preset
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Build a fresh schema tree
    pub fn build(&self) -> Result<ConfigurationSchema, ConfigError> {
        if self.base_dir.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "base_dir".to_string(),
            });
        }

        debug!(
            preset = ?self.preset,
            base_dir = %self.base_dir,
            twig = self.capabilities.twig,
            assetic = self.capabilities.assetic,
            "building configuration schema"
        );

        let root = match self.preset {
            SchemaPreset::Current => self.current_root(),
            SchemaPreset::Legacy => self.legacy_root(),
        };

        Ok(ConfigurationSchema::new(root))
    }

    fn current_root(&self) -> OptionNode {
        let base_dir = &self.base_dir;
        let default_locale = self.default_locale.clone().unwrap_or_default();

        let root = OptionNode::object(ROOT_NAME)
            .defaults_if_unset()
            .child(OptionNode::boolean("twig").default_value(self.capabilities.twig))
            .child(OptionNode::boolean("assetic").default_value(self.capabilities.assetic))
            .child(OptionNode::scalar("output_prefix").default_value("assets"))
            .child(OptionNode::scalar("output_prefix_debug").default_value("assets-dev"))
            .child(
                OptionNode::scalar("composer_installed_path")
                    .default_value(format!("{}/vendor/composer/installed.json", base_dir)),
            )
            .child(OptionNode::boolean("native_bower").default_true())
            .child(OptionNode::boolean("native_npm").default_true())
            .child(OptionNode::scalar("base_dir").default_value(base_dir.as_str()))
            .child(OptionNode::scalar("default_locale").default_value(default_locale))
            .child(OptionNode::scalar("fallback_locale").default_null())
            .child(OptionNode::boolean("auto_configuration").default_true())
            .child(OptionNode::scalar("less_assetic_filter").default_value("less"))
            .child(webpack_node(base_dir));

        self.append_global_config(root)
    }

    fn legacy_root(&self) -> OptionNode {
        let base_dir = format!("{}/..", self.base_dir);

        let root = OptionNode::object(ROOT_NAME)
            .defaults_if_unset()
            .child(OptionNode::scalar("output_prefix").default_value("assets"))
            .child(OptionNode::scalar("output_prefix_debug").default_value("assets-dev"))
            .child(
                OptionNode::scalar("composer_installed_path")
                    .default_value(format!("{}/vendor/composer/installed.json", base_dir)),
            )
            .child(OptionNode::boolean("native_bower").default_true())
            .child(OptionNode::boolean("native_npm").default_true())
            .child(OptionNode::scalar("base_dir").default_value(base_dir));

        self.append_global_config(root)
    }

    /// Sections shared by both presets, plus the locale-aware fragments of
    /// the current one
    fn append_global_config(&self, root: OptionNode) -> OptionNode {
        let root = root
            .child(self.default_for_package_node())
            .child(output_rewrites_node())
            .child(self.fragments.package.node_definition());

        let root = match self.preset {
            SchemaPreset::Current => root
                .child(self.fragments.asset_replacement.node_definition())
                .child(self.fragments.locale.node_definition()),
            SchemaPreset::Legacy => root,
        };

        root.child(self.fragments.common_asset.node_definition())
    }

    fn default_for_package_node(&self) -> OptionNode {
        OptionNode::object("default")
            .defaults_if_unset()
            .child(OptionNode::boolean("replace_extensions").default_false())
            .child(self.fragments.file_extension.node_definition())
            .child(self.fragments.pattern.node_definition())
    }
}

/// Rewrites keyed by asset path; the list form `[{name: ..., value: ...}]` is accepted too
fn output_rewrites_node() -> OptionNode {
    OptionNode::map("output_rewrites", OptionNode::variable("rewrite"))
        .use_attribute_as_key("name")
        .normalize_keys(false)
}

/// Webpack integration, disabled unless the section is present.
///
/// This departs from the bundle's historical toggle, which was enabled by
/// default: an empty document resolves to `webpack.enabled = false`.
fn webpack_node(base_dir: &str) -> OptionNode {
    OptionNode::object("webpack")
        .can_be_enabled()
        .child(
            OptionNode::enumeration("adapter", ["auto", "manifest", "assets"])
                .default_value("auto")
                .cannot_be_empty(),
        )
        .child(
            OptionNode::object("manifest_adapter")
                .defaults_if_unset()
                .child(OptionNode::scalar("file").default_null()),
        )
        .child(
            OptionNode::object("assets_adapter")
                .defaults_if_unset()
                .child(OptionNode::scalar("file").default_value(format!("{}/assets.json", base_dir)))
                .child(
                    OptionNode::object("cache")
                        .defaults_if_unset()
                        .child(OptionNode::boolean("enabled").default_null())
                        .child(OptionNode::scalar("key").default_value(WEBPACK_ASSETS_CACHE_KEY))
                        .child(OptionNode::scalar("service_id").default_value("cache.app")),
                ),
        )
}

/// Build the current schema for a base directory and default locale
pub fn build(base_dir: &str, default_locale: &str) -> Result<ConfigurationSchema, ConfigError> {
    Configuration::new(base_dir, default_locale).build()
}
