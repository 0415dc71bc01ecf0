//! Error types for HMM construction and inference.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which parameter an error or check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Transition,
    Emission,
    Initial,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Transition => "transition",
            ParameterKind::Emission => "emission",
            ParameterKind::Initial => "initial",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Matrix/vector dimensions, rendered as `3x3` or `4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dims(pub Vec<usize>);

impl Dims {
    pub fn vector(len: usize) -> Self {
        Dims(vec![len])
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Dims(vec![rows, cols])
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join("x"))
    }
}

/// Errors from parameter construction and inference calls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmmError {
    /// Matrix/vector dimensions are inconsistent.
    #[error("shape mismatch for {parameter}: expected {expected}, got {actual}")]
    ShapeMismatch {
        parameter: ParameterKind,
        expected: Dims,
        actual: Dims,
    },

    /// A parameter has no states or no symbols.
    #[error("{parameter} has an empty dimension; state and symbol counts must be positive")]
    EmptyParameter { parameter: ParameterKind },

    /// An observation is outside `[0, num_symbols)`.
    #[error("observation {symbol} at position {position} is out of range (num_symbols = {num_symbols})")]
    OutOfRangeSymbol {
        position: usize,
        symbol: usize,
        num_symbols: usize,
    },

    /// The observation sequence has length zero.
    #[error("observation sequence is empty")]
    EmptyObservations,
}

impl HmmError {
    /// True for construction-time dimension errors.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            HmmError::ShapeMismatch { .. } | HmmError::EmptyParameter { .. }
        )
    }

    /// True for errors scoped to a single decode/evaluate call.
    pub fn is_observation_error(&self) -> bool {
        matches!(
            self,
            HmmError::OutOfRangeSymbol { .. } | HmmError::EmptyObservations
        )
    }
}

/// Result type alias for HMM operations.
pub type Result<T> = std::result::Result<T, HmmError>;
