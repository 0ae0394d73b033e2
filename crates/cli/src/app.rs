//! Command execution

use crate::args::{Cli, Command, OutputFormat};
use anyhow::{Context, Result};
use config::{Capabilities, ConfigLoader, ConfigValidator, Configuration, ConfigurationSchema, RequireAssetConfig};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Schema plus output settings shared by every command
pub struct Application {
    schema: ConfigurationSchema,
    format: OutputFormat,
}

impl Application {
    /// Build the schema from the command line settings
    pub fn new(cli: &Cli) -> Result<Self> {
        let base_dir = match &cli.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };
        let base_dir = base_dir.to_string_lossy().into_owned();

        let configuration = if cli.legacy {
            Configuration::legacy(base_dir)
        } else {
            Configuration::new(base_dir, cli.default_locale.clone())
        }
        .with_capabilities(Capabilities::new(cli.twig, cli.assetic));

        let schema = configuration.build()?;
        info!(preset = ?configuration.preset(), "schema ready");

        Ok(Self {
            schema,
            format: cli.format,
        })
    }

    pub fn run<W: Write>(&self, command: &Command, out: &mut W) -> Result<()> {
        match command {
            Command::DumpReference => self.write(out, &self.schema.reference()),
            Command::Schema => self.write(out, &self.schema),
            Command::Validate { file } => self.validate(file, out),
            Command::Resolve { file } => {
                let config = ConfigLoader::load(file, &self.schema)?;
                self.write(out, &config)
            }
        }
    }

    fn validate<W: Write>(&self, file: &Path, out: &mut W) -> Result<()> {
        let value = ConfigLoader::load(file, &self.schema)?;
        let config = RequireAssetConfig::from_value(value)?;
        let report = ConfigValidator::validate(&config);

        for issue in &report.errors {
            writeln!(out, "error: {}: {}", issue.field, issue.message)?;
        }
        for issue in &report.warnings {
            warn!(field = %issue.field, "{}", issue.message);
            writeln!(out, "warning: {}: {}", issue.field, issue.message)?;
        }
        writeln!(out, "{}", report.summary())?;

        if report.has_errors() {
            anyhow::bail!("{} is not valid", file.display());
        }
        writeln!(out, "{} is valid", file.display())?;
        Ok(())
    }

    fn write<W: Write, T: Serialize>(&self, out: &mut W, value: &T) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML")?,
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
                json.push('\n');
                json
            }
        };
        out.write_all(rendered.as_bytes())?;
        Ok(())
    }
}
