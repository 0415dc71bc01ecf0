//! Discrete hidden Markov model inference.
//!
//! Two independent dynamic programs over a shared, immutable parameter set:
//! - [`ViterbiDecoder`]: most probable hidden-state path, computed in log space
//! - [`ForwardEvaluator`]: total probability of an observation sequence
//!
//! Both borrow [`HmmParameters`] read-only and allocate their working tables
//! per call, so one parameter set can serve any number of concurrent calls.
//!
//! # Example
//!
//! ```
//! use hmm_core::{ForwardEvaluator, HmmParameters, ViterbiDecoder};
//!
//! let params = HmmParameters::new(
//!     vec![vec![0.7, 0.3], vec![0.4, 0.6]],
//!     vec![vec![0.9, 0.1], vec![0.2, 0.8]], // emission[symbol][state]
//!     vec![0.6, 0.4],
//! )?;
//!
//! let path = ViterbiDecoder::decode(&params, &[0, 0, 1])?;
//! assert_eq!(path.states, vec![0, 0, 1]);
//!
//! let p = ForwardEvaluator::evaluate(&params, &[0, 0, 1])?;
//! assert!((p - 0.145164).abs() < 1e-12);
//! # Ok::<(), hmm_core::HmmError>(())
//! ```

pub mod error;
pub mod forward;
pub mod params;
pub mod viterbi;

pub use error::{Dims, HmmError, ParameterKind, Result};
pub use forward::{ForwardEvaluator, ForwardMode, ForwardOutcome};
pub use params::{
    EmissionLayout, HmmParameters, StochasticCheck, StochasticViolation, ViolationReason,
    DEFAULT_STOCHASTIC_TOLERANCE,
};
pub use viterbi::{BackpointerTable, ScoreTable, ViterbiDecoder, ViterbiPath};
