//! Shared types for the Require Asset configuration system
//!
//! This crate contains the error taxonomy and the small value helpers shared
//! by the schema builder, the processor and the command line tool.

pub mod error;
pub mod value;

// Re-export commonly used types
pub use error::{ConfigError, RequireAssetError, SchemaError};
pub use value::{describe_value, ValueKind};
