//! Error types for the Require Asset configuration system

use thiserror::Error;

/// Main error type for the require asset configuration system
#[derive(Error, Debug)]
pub enum RequireAssetError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors raised while processing a document against the schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Filesystem errors while reading configuration documents
    #[error("I/O error: {path}: {message}")]
    Io { path: String, message: String },
}

/// Configuration specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Unsupported document format
    #[error("Unsupported configuration format: {path}")]
    UnsupportedFormat { path: String },

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },
}

/// Errors reported by the processor when a document does not fit the schema.
///
/// Every variant carries the dotted path of the offending node, rooted at the
/// schema root name (e.g. `fxp_require_asset.webpack.adapter`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The value has the wrong type for the node
    #[error("Invalid type for path \"{path}\". Expected {expected}, but got {actual}")]
    InvalidType {
        path: String,
        expected: String,
        actual: String,
    },

    /// The value is not one of the enumerated values
    #[error("The value {value} is not allowed for path \"{path}\". Permissible values: {}", .allowed.join(", "))]
    InvalidEnumValue {
        path: String,
        value: String,
        allowed: Vec<String>,
    },

    /// The node cannot be empty but received an empty value
    #[error("The path \"{path}\" cannot contain an empty value, but got {value}")]
    EmptyValue { path: String, value: String },

    /// The key is not declared under the object node
    #[error("Unrecognized option \"{key}\" under \"{path}\". Available options are {}", .known.join(", "))]
    UnrecognizedOption {
        path: String,
        key: String,
        known: Vec<String>,
    },

    /// A required child was not configured
    #[error("The child config \"{name}\" under \"{path}\" must be configured")]
    MissingRequired { path: String, name: String },

    /// A list entry of a keyed prototype lacks its key attribute
    #[error("The attribute \"{attribute}\" must be set for path \"{path}\"")]
    MissingKeyAttribute { path: String, attribute: String },
}

impl SchemaError {
    /// Dotted path of the node the error was raised for
    pub fn path(&self) -> &str {
        match self {
            SchemaError::InvalidType { path, .. }
            | SchemaError::InvalidEnumValue { path, .. }
            | SchemaError::EmptyValue { path, .. }
            | SchemaError::UnrecognizedOption { path, .. }
            | SchemaError::MissingRequired { path, .. }
            | SchemaError::MissingKeyAttribute { path, .. } => path,
        }
    }
}

// Conversion implementations for common error types

impl From<ConfigError> for RequireAssetError {
    fn from(err: ConfigError) -> Self {
        RequireAssetError::Config(err.to_string())
    }
}

impl From<SchemaError> for RequireAssetError {
    fn from(err: SchemaError) -> Self {
        RequireAssetError::Schema(err.to_string())
    }
}
