//! Configuration fragments contributed by the asset component
//!
//! Each fragment is a sub-schema spliced into the tree by the
//! [`Configuration`](crate::builder::Configuration) builder. Hosts that ship
//! their own definitions can swap any of them through [`FragmentSet`].

use crate::schema::OptionNode;
use std::fmt;
use std::sync::Arc;

/// Provider of a sub-schema
pub trait NodeDefinition: Send + Sync {
    fn node_definition(&self) -> OptionNode;
}

impl<F> NodeDefinition for F
where
    F: Fn() -> OptionNode + Send + Sync,
{
    fn node_definition(&self) -> OptionNode {
        self()
    }
}

/// `packages`: asset packages keyed by name
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageConfiguration;

impl NodeDefinition for PackageConfiguration {
    fn node_definition(&self) -> OptionNode {
        let package = OptionNode::object("package")
            .child(OptionNode::scalar("source_path").default_null())
            .child(OptionNode::scalar("source_base").default_null())
            .child(OptionNode::boolean("replace_extensions").default_false())
            .child(FileExtensionConfiguration.node_definition())
            .child(PatternConfiguration.node_definition());

        OptionNode::map("packages", package)
            .use_attribute_as_key("name")
            .info("Asset packages, keyed by package name")
    }
}

/// `extensions`: file extension rules keyed by extension
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtensionConfiguration;

impl NodeDefinition for FileExtensionConfiguration {
    fn node_definition(&self) -> OptionNode {
        let extension = OptionNode::object("extension")
            .child(OptionNode::scalar_list("filters"))
            .child(OptionNode::variable("options").default_value(serde_json::json!({})))
            .child(OptionNode::scalar("extension").default_null())
            .child(OptionNode::boolean("debug").default_null())
            .child(OptionNode::boolean("exclude").default_false());

        OptionNode::map("extensions", extension).use_attribute_as_key("name")
    }
}

/// `patterns`: glob patterns selecting asset files
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternConfiguration;

impl NodeDefinition for PatternConfiguration {
    fn node_definition(&self) -> OptionNode {
        OptionNode::scalar_list("patterns")
    }
}

/// `locales`: localized asset inputs, keyed by locale then by asset
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleConfiguration;

impl NodeDefinition for LocaleConfiguration {
    fn node_definition(&self) -> OptionNode {
        let assets = OptionNode::map("assets", OptionNode::scalar_list("inputs")).normalize_keys(false);

        OptionNode::map("locales", assets).info("Localized assets, keyed by locale")
    }
}

/// `asset_replacement`: asset paths replaced by other asset paths
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetReplacementConfiguration;

impl NodeDefinition for AssetReplacementConfiguration {
    fn node_definition(&self) -> OptionNode {
        OptionNode::map("asset_replacement", OptionNode::scalar("replacement")).normalize_keys(false)
    }
}

/// `common_assets`: assets combined from several inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonAssetConfiguration;

impl NodeDefinition for CommonAssetConfiguration {
    fn node_definition(&self) -> OptionNode {
        let common = OptionNode::object("common_asset")
            .child(OptionNode::scalar("output").required().cannot_be_empty())
            .child(OptionNode::scalar_list("inputs"))
            .child(OptionNode::scalar_list("filters"))
            .child(OptionNode::variable("options").default_value(serde_json::json!({})))
            .child(OptionNode::boolean("debug").default_null())
            .child(OptionNode::map("locales", OptionNode::scalar_list("inputs")).normalize_keys(false));

        OptionNode::map("common_assets", common).use_attribute_as_key("name")
    }
}

/// The six fragment providers spliced into the schema
#[derive(Clone)]
pub struct FragmentSet {
    pub package: Arc<dyn NodeDefinition>,
    pub locale: Arc<dyn NodeDefinition>,
    pub file_extension: Arc<dyn NodeDefinition>,
    pub pattern: Arc<dyn NodeDefinition>,
    pub asset_replacement: Arc<dyn NodeDefinition>,
    pub common_asset: Arc<dyn NodeDefinition>,
}

impl FragmentSet {
    pub fn with_package(mut self, provider: impl NodeDefinition + 'static) -> Self {
        self.package = Arc::new(provider);
        self
    }

    pub fn with_locale(mut self, provider: impl NodeDefinition + 'static) -> Self {
        self.locale = Arc::new(provider);
        self
    }

    pub fn with_file_extension(mut self, provider: impl NodeDefinition + 'static) -> Self {
        self.file_extension = Arc::new(provider);
        self
    }

    pub fn with_pattern(mut self, provider: impl NodeDefinition + 'static) -> Self {
        self.pattern = Arc::new(provider);
        self
    }

    pub fn with_asset_replacement(mut self, provider: impl NodeDefinition + 'static) -> Self {
        self.asset_replacement = Arc::new(provider);
        self
    }

    pub fn with_common_asset(mut self, provider: impl NodeDefinition + 'static) -> Self {
        self.common_asset = Arc::new(provider);
        self
    }
}

impl Default for FragmentSet {
    fn default() -> Self {
        Self {
            package: Arc::new(PackageConfiguration),
            locale: Arc::new(LocaleConfiguration),
            file_extension: Arc::new(FileExtensionConfiguration),
            pattern: Arc::new(PatternConfiguration),
            asset_replacement: Arc::new(AssetReplacementConfiguration),
            common_asset: Arc::new(CommonAssetConfiguration),
        }
    }
}

impl fmt::Debug for FragmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentSet")
            .field("package", &self.package.node_definition().name)
            .field("locale", &self.locale.node_definition().name)
            .field("file_extension", &self.file_extension.node_definition().name)
            .field("pattern", &self.pattern.node_definition().name)
            .field("asset_replacement", &self.asset_replacement.node_definition().name)
            .field("common_asset", &self.common_asset.node_definition().name)
            .finish()
    }
}
