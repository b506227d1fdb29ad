// src/config/mod.rs

//! Graph manifests.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads a manifest from disk or from a string.
//! - [`validate`] checks dependency references and acyclicity.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{EngineSection, GraphConfig, RawGraphConfig, TaskConfig};
pub use validate::validate_config;
