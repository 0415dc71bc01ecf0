//! Model validation errors and semantic validation.

use hmm_core::{HmmError, HmmParameters, ParameterKind, StochasticViolation, ViolationReason};
use std::collections::HashSet;
use thiserror::Error;
use tracing::warn;

use crate::model::ModelFile;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Model validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error(transparent)]
    Shape(#[from] HmmError),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Unknown observation token '{token}' at position {position}")]
    UnknownSymbol { token: String, position: usize },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("{parameter} distribution {index} is not stochastic (sum = {sum})")]
    NotStochastic {
        parameter: ParameterKind,
        index: usize,
        sum: f64,
    },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::Shape(_) => 62,
            ValidationError::SemanticError(_) => 63,
            ValidationError::UnknownSymbol { .. } => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
            ValidationError::NotStochastic { .. } => 67,
        }
    }
}

impl From<StochasticViolation> for ValidationError {
    fn from(v: StochasticViolation) -> Self {
        ValidationError::NotStochastic {
            parameter: v.parameter,
            index: v.index,
            sum: v.sum,
        }
    }
}

/// Validate a model file and build its parameters.
///
/// Stochasticity is only enforced when `validation.strict` is set or
/// `force_strict` is true.
pub fn validate_model(model: &ModelFile, force_strict: bool) -> ValidationResult<HmmParameters> {
    if model.schema_version != crate::MODEL_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::MODEL_SCHEMA_VERSION.to_string(),
            actual: model.schema_version.clone(),
        });
    }

    let params = model.to_parameters()?;

    if let Some(ref states) = model.states {
        validate_labels("states", states, params.num_states())?;
    }
    if let Some(ref symbols) = model.symbols {
        validate_labels("symbols", symbols, params.num_symbols())?;
    }

    validate_entries("transition", &model.transition)?;
    validate_entries("emission", &model.emission)?;
    validate_entries("initial", std::slice::from_ref(&model.initial))?;

    let tolerance = model.validation.tolerance;
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "validation.tolerance".to_string(),
            message: format!("Must be finite and non-negative, got {}", tolerance),
        });
    }

    if model.validation.strict || force_strict {
        let check = params.validate_stochastic_with(tolerance);
        if let Some(violation) = check.violation {
            warn!(
                model = model.display_name(),
                parameter = %violation.parameter,
                index = violation.index,
                sum = violation.sum,
                "strict mode rejected model"
            );
            return Err(match violation.reason {
                ViolationReason::SumOutOfTolerance => violation.into(),
                ViolationReason::InvalidEntry => ValidationError::InvalidValue {
                    field: format!("{}[{}]", violation.parameter, violation.index),
                    message: "Contains a negative or non-finite entry".to_string(),
                },
            });
        }
    }

    Ok(params)
}

fn validate_labels(field: &str, labels: &[String], expected: usize) -> ValidationResult<()> {
    if labels.len() != expected {
        return Err(ValidationError::SemanticError(format!(
            "{} has {} labels but the model has {}",
            field,
            labels.len(),
            expected
        )));
    }

    let mut seen = HashSet::new();
    for label in labels {
        if label.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: "Labels must not be empty".to_string(),
            });
        }
        if !seen.insert(label.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate label '{}' in {}",
                label, field
            )));
        }
    }

    Ok(())
}

fn validate_entries(field: &str, rows: &[Vec<f64>]) -> ValidationResult<()> {
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                let location = if field == "initial" {
                    format!("{}[{}]", field, j)
                } else {
                    format!("{}[{}][{}]", field, i, j)
                };
                return Err(ValidationError::InvalidValue {
                    field: location,
                    message: format!("Must be finite and non-negative, got {}", value),
                });
            }
        }
    }
    Ok(())
}
