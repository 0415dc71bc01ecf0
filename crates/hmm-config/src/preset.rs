//! Built-in models.
//!
//! - Weather: two hidden weather states observed through daily activities
//! - Casino: fair and loaded die with sticky switching
//! - Scenario: the two-state reference model from the worked decode example

use hmm_core::{EmissionLayout, ForwardMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{ModelFile, ValidationSettings};
use crate::MODEL_SCHEMA_VERSION;

/// Available built-in models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Rainy/sunny weather inferred from walk/shop/clean
    Weather,
    /// Occasionally dishonest casino
    Casino,
    /// Reference two-state model with non-stochastic emission columns
    Scenario,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Weather, PresetName::Casino, PresetName::Scenario];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Weather => "weather",
            PresetName::Casino => "casino",
            PresetName::Scenario => "scenario",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "weather" => Some(PresetName::Weather),
            "casino" | "dice" => Some(PresetName::Casino),
            "scenario" | "reference" => Some(PresetName::Scenario),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Weather => "Two weather states observed through walk, shop and clean",
            PresetName::Casino => "Fair and loaded die; the loaded die favours six",
            PresetName::Scenario => {
                "Two-state reference model; emission columns do not sum to 1"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("Unknown preset '{0}'. Available: weather, casino, scenario")]
    UnknownPreset(String),
}

/// Get the model for a preset.
pub fn get_preset(name: PresetName) -> ModelFile {
    match name {
        PresetName::Weather => weather_preset(),
        PresetName::Casino => casino_preset(),
        PresetName::Scenario => scenario_preset(),
    }
}

fn labels(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(|s| s.to_string()).collect())
}

fn weather_preset() -> ModelFile {
    ModelFile {
        schema_version: MODEL_SCHEMA_VERSION.to_string(),
        name: Some("weather".to_string()),
        description: Some(PresetName::Weather.description().to_string()),
        states: labels(&["rainy", "sunny"]),
        symbols: labels(&["walk", "shop", "clean"]),
        emission_layout: EmissionLayout::SymbolMajor,
        transition: vec![vec![0.7, 0.3], vec![0.4, 0.6]],
        emission: vec![vec![0.1, 0.6], vec![0.4, 0.3], vec![0.5, 0.1]],
        initial: vec![0.6, 0.4],
        validation: ValidationSettings::default(),
        forward_mode: ForwardMode::Linear,
    }
}

fn casino_preset() -> ModelFile {
    let fair = vec![1.0 / 6.0; 6];
    let loaded = vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.5];
    ModelFile {
        schema_version: MODEL_SCHEMA_VERSION.to_string(),
        name: Some("casino".to_string()),
        description: Some(PresetName::Casino.description().to_string()),
        states: labels(&["fair", "loaded"]),
        symbols: labels(&["one", "two", "three", "four", "five", "six"]),
        emission_layout: EmissionLayout::StateMajor,
        transition: vec![vec![0.95, 0.05], vec![0.1, 0.9]],
        emission: vec![fair, loaded],
        initial: vec![0.5, 0.5],
        validation: ValidationSettings::default(),
        // Long roll sequences underflow the linear accumulation.
        forward_mode: ForwardMode::Log,
    }
}

fn scenario_preset() -> ModelFile {
    ModelFile {
        schema_version: MODEL_SCHEMA_VERSION.to_string(),
        name: Some("scenario".to_string()),
        description: Some(PresetName::Scenario.description().to_string()),
        states: None,
        symbols: None,
        emission_layout: EmissionLayout::SymbolMajor,
        transition: vec![vec![0.7, 0.3], vec![0.4, 0.6]],
        emission: vec![vec![0.9, 0.1], vec![0.2, 0.8]],
        initial: vec![0.6, 0.4],
        validation: ValidationSettings::default(),
        forward_mode: ForwardMode::Linear,
    }
}

/// Summary of a preset for listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub num_states: usize,
    pub num_symbols: usize,
    pub states: Vec<String>,
    pub symbols: Vec<String>,
    pub forward_mode: ForwardMode,
}

impl PresetInfo {
    /// Create info from a preset.
    pub fn from_preset(name: PresetName) -> Self {
        let model = get_preset(name);
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            num_states: model.num_states(),
            num_symbols: model.num_symbols(),
            states: (0..model.num_states()).map(|i| model.state_label(i)).collect(),
            symbols: (0..model.num_symbols())
                .map(|i| model.symbol_label(i))
                .collect(),
            forward_mode: model.forward_mode,
        }
    }
}

/// List all presets with summary info.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
