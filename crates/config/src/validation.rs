//! Configuration validation utilities
//!
//! The processor enforces the shape of a document; the checks here look at
//! the meaning of the resolved values and are reported as errors or warnings.

use crate::model::{RequireAssetConfig, WebpackAdapter};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &RequireAssetConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_output(config, &mut report);
        Self::validate_paths(config, &mut report);
        Self::validate_locales(config, &mut report);
        Self::validate_webpack(config, &mut report);
        Self::validate_packages(config, &mut report);

        report
    }

    fn validate_output(config: &RequireAssetConfig, report: &mut ValidationReport) {
        if config.output_prefix.trim().is_empty() {
            report.add_error("output_prefix", "Output prefix cannot be empty");
        }

        if config.output_prefix_debug.trim().is_empty() {
            report.add_error("output_prefix_debug", "Debug output prefix cannot be empty");
        } else if config.output_prefix_debug == config.output_prefix {
            report.add_error(
                "output_prefix_debug",
                "Debug output prefix must differ from the output prefix",
            );
        }
    }

    fn validate_paths(config: &RequireAssetConfig, report: &mut ValidationReport) {
        if config.base_dir.trim().is_empty() {
            report.add_error("base_dir", "Base directory cannot be empty");
        }

        if config.composer_installed_path.trim().is_empty() {
            report.add_error("composer_installed_path", "Composer installed path cannot be empty");
        }
    }

    fn validate_locales(config: &RequireAssetConfig, report: &mut ValidationReport) {
        if let Some(ref default_locale) = config.default_locale {
            if default_locale.trim().is_empty() {
                report.add_warning("default_locale", "Default locale is empty, localized assets will be ignored");
            }

            if config.fallback_locale.as_deref() == Some(default_locale.as_str()) {
                report.add_warning("fallback_locale", "Fallback locale is the same as the default locale");
            }
        }

        for (locale, assets) in &config.locales {
            if assets.is_empty() {
                report.add_warning("locales", &format!("Locale {} declares no assets", locale));
            }
        }
    }

    fn validate_webpack(config: &RequireAssetConfig, report: &mut ValidationReport) {
        if !config.webpack.enabled {
            return;
        }

        match config.webpack.adapter {
            WebpackAdapter::Manifest if config.webpack.manifest_adapter.file.is_none() => {
                report.add_warning(
                    "webpack.manifest_adapter.file",
                    "Manifest adapter is selected but no manifest file is configured",
                );
            }
            WebpackAdapter::Assets if config.webpack.assets_adapter.file.is_none() => {
                report.add_error(
                    "webpack.assets_adapter.file",
                    "Assets adapter is selected but no assets file is configured",
                );
            }
            _ => {}
        }

        if config.webpack.assets_adapter.cache.key.trim().is_empty() {
            report.add_error("webpack.assets_adapter.cache.key", "Cache key cannot be empty");
        }
    }

    fn validate_packages(config: &RequireAssetConfig, report: &mut ValidationReport) {
        for (name, package) in &config.packages {
            if name.trim().is_empty() {
                report.add_error("packages", "Package name cannot be empty");
            }

            if package.source_path.is_none() {
                report.add_warning(
                    "packages.source_path",
                    &format!("Package {} has no source path, it must be installed by composer", name),
                );
            }
        }

        for (name, common) in &config.common_assets {
            if common.inputs.is_empty() {
                report.add_warning("common_assets.inputs", &format!("Common asset {} has no inputs", name));
            }
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
