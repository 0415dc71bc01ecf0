//! Model configuration for hmm-infer.
//!
//! This crate provides:
//! - The JSON model file schema and its conversion into [`hmm_core::HmmParameters`]
//! - Model path resolution (CLI → env → XDG → built-in preset)
//! - Semantic validation with stable error codes
//! - Built-in presets and provenance snapshots

pub mod model;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use model::{ModelFile, ValidationSettings};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_model_path, ModelSource, ResolvedPath};
pub use snapshot::ModelSnapshot;
pub use validate::{validate_model, ValidationError, ValidationResult};

/// Schema version for model files.
pub const MODEL_SCHEMA_VERSION: &str = "1.0.0";
