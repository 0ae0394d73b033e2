//! Command line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect and validate `fxp_require_asset` configuration
#[derive(Debug, Parser)]
#[command(name = "require-asset", version)]
pub struct Cli {
    /// Project directory used to compute path defaults (defaults to the current directory)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Default locale
    #[arg(long, global = true, default_value = "en")]
    pub default_locale: String,

    /// Use the legacy schema; the base directory is then the application root directory
    #[arg(long, global = true)]
    pub legacy: bool,

    /// Templating integration is available
    #[arg(long, global = true)]
    pub twig: bool,

    /// Asset pipeline integration is available
    #[arg(long, global = true)]
    pub assetic: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the reference configuration with every default
    DumpReference,
    /// Print the schema tree
    Schema,
    /// Validate a configuration file
    Validate {
        /// YAML or JSON configuration file
        file: PathBuf,
    },
    /// Print the processed configuration of a file
    Resolve {
        /// YAML or JSON configuration file
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}
