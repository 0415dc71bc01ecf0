//! Model file types.
//!
//! A model file is a JSON document holding the three HMM parameter matrices
//! plus optional labels and evaluation settings.

use hmm_core::{EmissionLayout, ForwardMode, HmmParameters, DEFAULT_STOCHASTIC_TOLERANCE};
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Complete model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub schema_version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Optional state labels, one per transition row.
    #[serde(default)]
    pub states: Option<Vec<String>>,

    /// Optional symbol labels, one per observable symbol.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,

    /// Orientation of `emission`.
    #[serde(default)]
    pub emission_layout: EmissionLayout,

    pub transition: Vec<Vec<f64>>,
    pub emission: Vec<Vec<f64>>,
    pub initial: Vec<f64>,

    #[serde(default)]
    pub validation: ValidationSettings,

    /// Accumulation used by `evaluate` unless overridden.
    #[serde(default)]
    pub forward_mode: ForwardMode,
}

/// Stochasticity checking applied when a model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Reject models whose distributions do not sum to 1.
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_STOCHASTIC_TOLERANCE
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            strict: false,
            tolerance: DEFAULT_STOCHASTIC_TOLERANCE,
        }
    }
}

impl ModelFile {
    /// Load a model from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        Self::from_file_with_raw(path).map(|(model, _)| model)
    }

    /// Load a model and keep the file text it was parsed from.
    ///
    /// The raw text is what [`crate::ModelSnapshot`] hashes.
    pub fn from_file_with_raw(
        path: &std::path::Path,
    ) -> Result<(Self, String), ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let model = Self::from_str(&content)?;
        Ok((model, content))
    }

    /// Parse a model from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Shape-check and convert into core parameters.
    pub fn to_parameters(&self) -> Result<HmmParameters, ValidationError> {
        let params = HmmParameters::with_layout(
            self.transition.clone(),
            self.emission.clone(),
            self.initial.clone(),
            self.emission_layout,
        )?;
        Ok(params)
    }

    /// Number of hidden states implied by the transition matrix.
    pub fn num_states(&self) -> usize {
        self.transition.len()
    }

    /// Number of symbols implied by the emission matrix and its layout.
    pub fn num_symbols(&self) -> usize {
        match self.emission_layout {
            EmissionLayout::SymbolMajor => self.emission.len(),
            EmissionLayout::StateMajor => self.emission.first().map(Vec::len).unwrap_or(0),
        }
    }

    /// Map observation tokens to symbol indices.
    ///
    /// A token matching a symbol label maps to that label's index; otherwise
    /// it must be a decimal index. Range checking is left to the decoder.
    pub fn encode_observations<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Vec<usize>, ValidationError> {
        tokens
            .iter()
            .enumerate()
            .map(|(position, token)| {
                let token = token.as_ref().trim();
                if let Some(idx) = self
                    .symbols
                    .as_ref()
                    .and_then(|labels| labels.iter().position(|l| l == token))
                {
                    return Ok(idx);
                }
                token
                    .parse::<usize>()
                    .map_err(|_| ValidationError::UnknownSymbol {
                        token: token.to_string(),
                        position,
                    })
            })
            .collect()
    }

    /// Label for a state index, falling back to the index itself.
    pub fn state_label(&self, index: usize) -> String {
        self.states
            .as_ref()
            .and_then(|labels| labels.get(index))
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Label for a symbol index, falling back to the index itself.
    pub fn symbol_label(&self, index: usize) -> String {
        self.symbols
            .as_ref()
            .and_then(|labels| labels.get(index))
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Display name for logs and output.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}
