//! HMM parameter set: transition matrix, emission matrix, initial distribution.
//!
//! Parameters are shape-checked once at construction and are immutable
//! afterwards. Stochasticity is *not* enforced at construction; callers that
//! want strict validation use [`HmmParameters::validate_stochastic`].
//!
//! Emission probabilities are stored symbol-major, `emission[symbol][state]`,
//! so that one time step reads a contiguous row of length `num_states`.

use crate::error::{Dims, HmmError, ParameterKind, Result};
use hmm_math::row_sum;
use serde::{Deserialize, Serialize};

/// Default tolerance for row sums in [`HmmParameters::validate_stochastic`].
pub const DEFAULT_STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// Orientation of an emission matrix supplied to the constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionLayout {
    /// `emission[symbol][state]`.
    #[default]
    SymbolMajor,
    /// `emission[state][symbol]`.
    StateMajor,
}

/// Why a parameter failed the stochasticity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// Distribution does not sum to 1 within tolerance.
    SumOutOfTolerance,
    /// Distribution contains a negative or non-finite entry.
    InvalidEntry,
}

/// The first distribution that failed [`HmmParameters::validate_stochastic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticViolation {
    pub parameter: ParameterKind,
    /// Transition row, emission state, or 0 for the initial vector.
    pub index: usize,
    pub sum: f64,
    pub reason: ViolationReason,
}

/// Outcome of a stochasticity check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticCheck {
    pub valid: bool,
    pub violation: Option<StochasticViolation>,
}

impl StochasticCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            violation: None,
        }
    }

    fn failed(violation: StochasticViolation) -> Self {
        Self {
            valid: false,
            violation: Some(violation),
        }
    }

    /// Offending row index, if any.
    pub fn offending_index(&self) -> Option<usize> {
        self.violation.map(|v| v.index)
    }
}

/// Nested-vector form used for serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameters {
    transition: Vec<Vec<f64>>,
    emission: Vec<Vec<f64>>,
    initial: Vec<f64>,
}

/// Shape-checked parameters of a discrete, time-homogeneous HMM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawParameters", try_from = "RawParameters")]
pub struct HmmParameters {
    num_states: usize,
    num_symbols: usize,
    /// Row-major `[num_states * num_states]`.
    transition: Vec<f64>,
    /// Symbol-major `[num_symbols * num_states]`.
    emission: Vec<f64>,
    initial: Vec<f64>,
}

impl HmmParameters {
    /// Build parameters from a symbol-major emission matrix (`emission[symbol][state]`).
    pub fn new(
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
        initial: Vec<f64>,
    ) -> Result<Self> {
        Self::with_layout(transition, emission, initial, EmissionLayout::SymbolMajor)
    }

    /// Build parameters from an emission matrix in the given orientation.
    pub fn with_layout(
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
        initial: Vec<f64>,
        layout: EmissionLayout,
    ) -> Result<Self> {
        let num_states = transition.len();
        if num_states == 0 {
            return Err(HmmError::EmptyParameter {
                parameter: ParameterKind::Transition,
            });
        }
        let transition = flatten_square(&transition, num_states)?;

        let (num_symbols, emission) = match layout {
            EmissionLayout::SymbolMajor => flatten_symbol_major(&emission, num_states)?,
            EmissionLayout::StateMajor => transpose_state_major(&emission, num_states)?,
        };

        if initial.len() != num_states {
            return Err(HmmError::ShapeMismatch {
                parameter: ParameterKind::Initial,
                expected: Dims::vector(num_states),
                actual: Dims::vector(initial.len()),
            });
        }

        Ok(Self {
            num_states,
            num_symbols,
            transition,
            emission,
            initial,
        })
    }

    /// Number of hidden states (S).
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Number of observable symbols (O).
    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// Probability of moving from state `from` at t to state `to` at t+1.
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.transition[from * self.num_states + to]
    }

    /// Outgoing transition distribution of `from`.
    pub fn transition_row(&self, from: usize) -> &[f64] {
        let start = from * self.num_states;
        &self.transition[start..start + self.num_states]
    }

    /// `P(symbol | state)`.
    pub fn emission(&self, symbol: usize, state: usize) -> f64 {
        self.emission[symbol * self.num_states + state]
    }

    /// `P(symbol | s)` for every state `s`.
    pub fn emission_row(&self, symbol: usize) -> &[f64] {
        let start = symbol * self.num_states;
        &self.emission[start..start + self.num_states]
    }

    /// Initial probability of `state`.
    pub fn initial(&self, state: usize) -> f64 {
        self.initial[state]
    }

    /// Initial distribution.
    pub fn initial_distribution(&self) -> &[f64] {
        &self.initial
    }

    /// Check that an observation sequence is non-empty and in range.
    pub fn check_observations(&self, observations: &[usize]) -> Result<()> {
        if observations.is_empty() {
            return Err(HmmError::EmptyObservations);
        }
        if let Some((position, &symbol)) = observations
            .iter()
            .enumerate()
            .find(|&(_, &symbol)| symbol >= self.num_symbols)
        {
            return Err(HmmError::OutOfRangeSymbol {
                position,
                symbol,
                num_symbols: self.num_symbols,
            });
        }
        Ok(())
    }

    /// Stochasticity check with [`DEFAULT_STOCHASTIC_TOLERANCE`].
    pub fn validate_stochastic(&self) -> StochasticCheck {
        self.validate_stochastic_with(DEFAULT_STOCHASTIC_TOLERANCE)
    }

    /// Check every distribution sums to 1 within `tolerance` and has no
    /// negative or non-finite entries.
    ///
    /// Order: transition rows, then per-state emission distributions, then the
    /// initial vector. The first violation is reported.
    pub fn validate_stochastic_with(&self, tolerance: f64) -> StochasticCheck {
        for from in 0..self.num_states {
            if let Some(v) = check_distribution(
                ParameterKind::Transition,
                from,
                self.transition_row(from).iter().copied(),
                tolerance,
            ) {
                return StochasticCheck::failed(v);
            }
        }

        for state in 0..self.num_states {
            let column = (0..self.num_symbols).map(|symbol| self.emission(symbol, state));
            if let Some(v) = check_distribution(ParameterKind::Emission, state, column, tolerance) {
                return StochasticCheck::failed(v);
            }
        }

        if let Some(v) = check_distribution(
            ParameterKind::Initial,
            0,
            self.initial.iter().copied(),
            tolerance,
        ) {
            return StochasticCheck::failed(v);
        }

        StochasticCheck::ok()
    }

    /// Transition matrix as nested rows.
    pub fn transition_rows(&self) -> Vec<Vec<f64>> {
        self.transition
            .chunks_exact(self.num_states)
            .map(|row| row.to_vec())
            .collect()
    }

    /// Emission matrix as nested symbol-major rows.
    pub fn emission_rows(&self) -> Vec<Vec<f64>> {
        self.emission
            .chunks_exact(self.num_states)
            .map(|row| row.to_vec())
            .collect()
    }
}

impl From<HmmParameters> for RawParameters {
    fn from(params: HmmParameters) -> Self {
        RawParameters {
            transition: params.transition_rows(),
            emission: params.emission_rows(),
            initial: params.initial,
        }
    }
}

impl TryFrom<RawParameters> for HmmParameters {
    type Error = HmmError;

    fn try_from(raw: RawParameters) -> Result<Self> {
        HmmParameters::new(raw.transition, raw.emission, raw.initial)
    }
}

fn check_distribution(
    parameter: ParameterKind,
    index: usize,
    values: impl Iterator<Item = f64>,
    tolerance: f64,
) -> Option<StochasticViolation> {
    let values: Vec<f64> = values.collect();
    let sum = row_sum(&values);
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Some(StochasticViolation {
            parameter,
            index,
            sum,
            reason: ViolationReason::InvalidEntry,
        });
    }
    if (sum - 1.0).abs() > tolerance {
        return Some(StochasticViolation {
            parameter,
            index,
            sum,
            reason: ViolationReason::SumOutOfTolerance,
        });
    }
    None
}

fn flatten_square(rows: &[Vec<f64>], num_states: usize) -> Result<Vec<f64>> {
    let mut flat = Vec::with_capacity(num_states * num_states);
    for row in rows {
        if row.len() != num_states {
            return Err(HmmError::ShapeMismatch {
                parameter: ParameterKind::Transition,
                expected: Dims::matrix(num_states, num_states),
                actual: Dims::matrix(num_states, row.len()),
            });
        }
        flat.extend_from_slice(row);
    }
    Ok(flat)
}

fn flatten_symbol_major(rows: &[Vec<f64>], num_states: usize) -> Result<(usize, Vec<f64>)> {
    let num_symbols = rows.len();
    if num_symbols == 0 {
        return Err(HmmError::EmptyParameter {
            parameter: ParameterKind::Emission,
        });
    }
    let mut flat = Vec::with_capacity(num_symbols * num_states);
    for row in rows {
        if row.len() != num_states {
            return Err(HmmError::ShapeMismatch {
                parameter: ParameterKind::Emission,
                expected: Dims::matrix(num_symbols, num_states),
                actual: Dims::matrix(num_symbols, row.len()),
            });
        }
        flat.extend_from_slice(row);
    }
    Ok((num_symbols, flat))
}

fn transpose_state_major(rows: &[Vec<f64>], num_states: usize) -> Result<(usize, Vec<f64>)> {
    let num_symbols = rows.first().map(Vec::len).unwrap_or(0);
    if rows.len() != num_states {
        return Err(HmmError::ShapeMismatch {
            parameter: ParameterKind::Emission,
            expected: Dims::matrix(num_states, num_symbols),
            actual: Dims::matrix(rows.len(), num_symbols),
        });
    }
    if num_symbols == 0 {
        return Err(HmmError::EmptyParameter {
            parameter: ParameterKind::Emission,
        });
    }
    if let Some(row) = rows.iter().find(|row| row.len() != num_symbols) {
        return Err(HmmError::ShapeMismatch {
            parameter: ParameterKind::Emission,
            expected: Dims::matrix(num_states, num_symbols),
            actual: Dims::matrix(num_states, row.len()),
        });
    }
    let mut flat = vec![0.0; num_symbols * num_states];
    for (state, row) in rows.iter().enumerate() {
        for (symbol, &p) in row.iter().enumerate() {
            flat[symbol * num_states + state] = p;
        }
    }
    Ok((num_symbols, flat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state() -> HmmParameters {
        HmmParameters::new(
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.9, 0.1], vec![0.2, 0.8]],
            vec![0.6, 0.4],
        )
        .unwrap()
    }

    fn stochastic_two_state() -> HmmParameters {
        HmmParameters::new(
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.8, 0.3], vec![0.2, 0.7]],
            vec![0.6, 0.4],
        )
        .unwrap()
    }

    #[test]
    fn dimensions_and_accessors() {
        let p = two_state();
        assert_eq!(p.num_states(), 2);
        assert_eq!(p.num_symbols(), 2);
        assert_eq!(p.transition(0, 1), 0.3);
        assert_eq!(p.transition_row(1), &[0.4, 0.6]);
        assert_eq!(p.emission(1, 0), 0.2);
        assert_eq!(p.emission_row(0), &[0.9, 0.1]);
        assert_eq!(p.initial(1), 0.4);
        assert_eq!(p.initial_distribution(), &[0.6, 0.4]);
    }

    #[test]
    fn non_square_transition_rejected() {
        let err = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0, 1.0, 1.0]],
            vec![0.3, 0.3, 0.4],
        )
        .unwrap_err();
        assert_eq!(
            err,
            HmmError::ShapeMismatch {
                parameter: ParameterKind::Transition,
                expected: Dims::matrix(3, 3),
                actual: Dims::matrix(3, 2),
            }
        );
    }

    #[test]
    fn ragged_transition_rejected() {
        let err = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![1.0]],
            vec![vec![1.0, 1.0]],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HmmError::ShapeMismatch {
                parameter: ParameterKind::Transition,
                ..
            }
        ));
    }

    #[test]
    fn emission_state_dimension_mismatch_rejected() {
        let err = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![0.2, 0.3, 0.5]],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert_eq!(
            err,
            HmmError::ShapeMismatch {
                parameter: ParameterKind::Emission,
                expected: Dims::matrix(1, 2),
                actual: Dims::matrix(1, 3),
            }
        );
    }

    #[test]
    fn initial_length_mismatch_rejected() {
        let err = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0, 1.0]],
            vec![1.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            HmmError::ShapeMismatch {
                parameter: ParameterKind::Initial,
                expected: Dims::vector(2),
                actual: Dims::vector(1),
            }
        );
    }

    #[test]
    fn empty_dimensions_rejected() {
        let err = HmmParameters::new(vec![], vec![vec![]], vec![]).unwrap_err();
        assert_eq!(
            err,
            HmmError::EmptyParameter {
                parameter: ParameterKind::Transition
            }
        );

        let err = HmmParameters::new(vec![vec![1.0]], vec![], vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            HmmError::EmptyParameter {
                parameter: ParameterKind::Emission
            }
        );
        assert!(err.is_shape_error());
    }

    #[test]
    fn state_major_layout_matches_symbol_major() {
        let symbol_major = stochastic_two_state();
        let state_major = HmmParameters::with_layout(
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.8, 0.2], vec![0.3, 0.7]],
            vec![0.6, 0.4],
            EmissionLayout::StateMajor,
        )
        .unwrap();
        assert_eq!(symbol_major, state_major);
    }

    #[test]
    fn state_major_wrong_state_count_rejected() {
        let err = HmmParameters::with_layout(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![0.5, 0.5]],
            vec![0.5, 0.5],
            EmissionLayout::StateMajor,
        )
        .unwrap_err();
        assert_eq!(
            err,
            HmmError::ShapeMismatch {
                parameter: ParameterKind::Emission,
                expected: Dims::matrix(2, 2),
                actual: Dims::matrix(1, 2),
            }
        );
    }

    #[test]
    fn stochastic_model_passes() {
        let check = stochastic_two_state().validate_stochastic();
        assert!(check.valid);
        assert_eq!(check.violation, None);
        assert_eq!(check.offending_index(), None);
    }

    #[test]
    fn emission_columns_checked_per_state() {
        // Rows of this matrix sum to 1, but per-state distributions do not.
        let check = two_state().validate_stochastic();
        assert!(!check.valid);
        let v = check.violation.unwrap();
        assert_eq!(v.parameter, ParameterKind::Emission);
        assert_eq!(v.index, 0);
        assert!((v.sum - 1.1).abs() < 1e-12);
        assert_eq!(v.reason, ViolationReason::SumOutOfTolerance);
    }

    #[test]
    fn transition_row_violation_reports_row() {
        let p = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.9, 0.3]],
            vec![vec![1.0, 1.0]],
            vec![0.5, 0.5],
        )
        .unwrap();
        let check = p.validate_stochastic();
        assert!(!check.valid);
        assert_eq!(check.offending_index(), Some(1));
        assert_eq!(
            check.violation.unwrap().parameter,
            ParameterKind::Transition
        );
    }

    #[test]
    fn negative_entry_is_invalid_even_if_sum_is_one() {
        let p = HmmParameters::new(
            vec![vec![1.2, -0.2], vec![0.5, 0.5]],
            vec![vec![1.0, 1.0]],
            vec![0.5, 0.5],
        )
        .unwrap();
        let v = p.validate_stochastic().violation.unwrap();
        assert_eq!(v.reason, ViolationReason::InvalidEntry);
        assert_eq!(v.index, 0);
    }

    #[test]
    fn initial_violation_reported_last() {
        let p = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![1.0, 1.0]],
            vec![0.5, 0.6],
        )
        .unwrap();
        let v = p.validate_stochastic().violation.unwrap();
        assert_eq!(v.parameter, ParameterKind::Initial);
        assert_eq!(v.index, 0);
    }

    #[test]
    fn tolerance_is_respected() {
        let p = HmmParameters::new(
            vec![vec![0.5, 0.5001], vec![0.5, 0.5]],
            vec![vec![1.0, 1.0]],
            vec![0.5, 0.5],
        )
        .unwrap();
        assert!(!p.validate_stochastic().valid);
        assert!(p.validate_stochastic_with(1e-3).valid);
    }

    #[test]
    fn check_observations_errors() {
        let p = two_state();
        assert!(p.check_observations(&[0, 1, 1]).is_ok());
        assert_eq!(
            p.check_observations(&[]).unwrap_err(),
            HmmError::EmptyObservations
        );
        assert_eq!(
            p.check_observations(&[0, 2, 5]).unwrap_err(),
            HmmError::OutOfRangeSymbol {
                position: 1,
                symbol: 2,
                num_symbols: 2,
            }
        );
    }

    #[test]
    fn serde_roundtrip_goes_through_shape_check() {
        let p = two_state();
        let json = serde_json::to_string(&p).unwrap();
        let back: HmmParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        let bad = r#"{"transition":[[1.0,0.0]],"emission":[[1.0]],"initial":[1.0]}"#;
        assert!(serde_json::from_str::<HmmParameters>(bad).is_err());
    }

    #[test]
    fn parameters_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HmmParameters>();
    }
}
