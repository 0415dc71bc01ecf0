//! Model snapshots for output provenance.
//!
//! A snapshot records which model produced a result so that decodes can be
//! tied back to the exact parameters used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::ModelFile;
use crate::resolve::{ModelSource, ResolvedPath};

/// A frozen description of the loaded model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// When the model was loaded.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    #[serde(default)]
    pub model_name: Option<String>,

    /// Path the model was read from, if any.
    #[serde(default)]
    pub model_path: Option<String>,

    /// Where the model came from.
    pub source: String,

    /// SHA-256 of the raw file content, or of the canonical JSON for presets.
    pub content_hash: String,

    pub num_states: usize,
    pub num_symbols: usize,
}

impl ModelSnapshot {
    /// Snapshot a model loaded from `resolved`.
    ///
    /// `raw` is the file content as read; when absent the model is hashed in
    /// its serialized form.
    pub fn new(model: &ModelFile, resolved: &ResolvedPath, raw: Option<&str>) -> Self {
        let content_hash = match raw {
            Some(content) => hash_content(content),
            None => hash_content(&serde_json::to_string(model).unwrap_or_default()),
        };

        Self {
            timestamp: Utc::now(),
            schema_version: model.schema_version.clone(),
            model_name: model.name.clone(),
            model_path: resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string()),
            source: resolved.source.to_string(),
            content_hash,
            num_states: model.num_states(),
            num_symbols: model.num_symbols(),
        }
    }

    /// Snapshot a built-in preset.
    pub fn for_preset(model: &ModelFile) -> Self {
        Self::new(
            model,
            &ResolvedPath {
                path: None,
                source: ModelSource::BuiltinPreset,
            },
            None,
        )
    }

    /// Check if two snapshots describe the same model content.
    pub fn matches(&self, other: &ModelSnapshot) -> bool {
        self.content_hash == other.content_hash
    }

    /// Short identifier (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.content_hash[..12.min(self.content_hash.len())]
    }
}

/// Compute SHA-256 hash of content.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
