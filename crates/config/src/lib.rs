//! Configuration schema for the Require Asset bundle
//!
//! This crate declares the `fxp_require_asset` configuration tree, processes
//! raw YAML/JSON documents and environment overrides against it, and exposes
//! the result as a typed configuration.

pub mod builder;
pub mod fragments;
pub mod loader;
pub mod model;
pub mod processor;
pub mod schema;
pub mod validation;

pub use builder::{build, Capabilities, Configuration, SchemaPreset};
pub use fragments::{FragmentSet, NodeDefinition};
pub use loader::ConfigLoader;
pub use model::*;
pub use processor::Processor;
pub use schema::*;
pub use validation::*;
