//! Viterbi decoding: most probable hidden-state path in log space.
//!
//! The forward pass fills an `L x S` score table, row `t` computed only from
//! row `t-1`:
//!
//! - `score[0][s] = ln(initial[s]) + ln(emission[obs[0]][s])`
//! - `belief[prev] = score[t-1][prev] + ln(transition[prev][s])`
//! - `score[t][s] = max(belief) + ln(emission[obs[t]][s])`
//! - `backpointer[t][s] = argmax(belief)`
//!
//! Every argmax (per-step and termination) resolves ties to the lowest state
//! index. Zero probabilities become `-inf`; a step at which every state is
//! impossible yields an all `-inf` row and decoding continues, with index 0
//! winning each all-tied argmax from then on.

use crate::error::Result;
use crate::params::HmmParameters;
use hmm_math::{argmax_first, ln_prob, ln_probs, max_and_argmax};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// `L x S` table of log-domain best-path scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    num_steps: usize,
    num_states: usize,
    scores: Vec<f64>,
}

impl ScoreTable {
    fn new(num_steps: usize, num_states: usize) -> Self {
        Self {
            num_steps,
            num_states,
            scores: vec![f64::NEG_INFINITY; num_steps * num_states],
        }
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Log-probability of the best path ending in `state` at `step`.
    pub fn get(&self, step: usize, state: usize) -> f64 {
        self.row(step)[state]
    }

    /// Scores of every state at `step`.
    pub fn row(&self, step: usize) -> &[f64] {
        let start = step * self.num_states;
        &self.scores[start..start + self.num_states]
    }

    /// Table as nested rows `[step][state]`.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.scores
            .chunks_exact(self.num_states)
            .map(|row| row.to_vec())
            .collect()
    }

    /// `exp(score)` for every cell: unnormalized best-path probabilities.
    pub fn exp_rows(&self) -> Vec<Vec<f64>> {
        self.scores
            .chunks_exact(self.num_states)
            .map(|row| row.iter().map(|s| s.exp()).collect())
            .collect()
    }
}

/// `L x S` table of predecessor states. Row 0 is all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpointerTable {
    num_steps: usize,
    num_states: usize,
    pointers: Vec<usize>,
}

impl BackpointerTable {
    fn new(num_steps: usize, num_states: usize) -> Self {
        Self {
            num_steps,
            num_states,
            pointers: vec![0; num_steps * num_states],
        }
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Best predecessor (at `step - 1`) of `state` at `step`.
    pub fn get(&self, step: usize, state: usize) -> usize {
        self.pointers[step * self.num_states + state]
    }

    pub fn row(&self, step: usize) -> &[usize] {
        let start = step * self.num_states;
        &self.pointers[start..start + self.num_states]
    }
}

/// Result of [`ViterbiDecoder::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViterbiPath {
    /// Most probable state at each time step.
    pub states: Vec<usize>,
    /// Full log-domain score table.
    pub scores: ScoreTable,
    /// Predecessor table used to reconstruct `states`.
    pub backpointers: BackpointerTable,
}

impl ViterbiPath {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Log-probability of the decoded path (joint with the observations).
    pub fn log_probability(&self) -> f64 {
        match self.states.last() {
            Some(&last) => self.scores.get(self.len() - 1, last),
            None => f64::NEG_INFINITY,
        }
    }

    /// `exp(score[t][s])` per step and state.
    ///
    /// A per-step confidence, not a normalized posterior: rows do not sum to 1.
    pub fn state_probabilities(&self) -> Vec<Vec<f64>> {
        self.scores.exp_rows()
    }

    /// `exp(score[t][states[t]])` along the decoded path.
    pub fn path_confidence(&self) -> Vec<f64> {
        self.states
            .iter()
            .enumerate()
            .map(|(t, &s)| self.scores.get(t, s).exp())
            .collect()
    }
}

/// Viterbi maximum-likelihood path decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViterbiDecoder;

impl ViterbiDecoder {
    /// Decode the most probable state sequence for `observations`.
    ///
    /// Fails with `EmptyObservations` or `OutOfRangeSymbol`; numerically
    /// degenerate inputs never fail.
    pub fn decode(params: &HmmParameters, observations: &[usize]) -> Result<ViterbiPath> {
        params.check_observations(observations)?;

        let n = params.num_states();
        let len = observations.len();
        debug!(num_states = n, num_steps = len, "viterbi decode");

        let log_transition: Vec<f64> = (0..n)
            .flat_map(|from| ln_probs(params.transition_row(from)))
            .collect();

        let mut scores = ScoreTable::new(len, n);
        let mut backpointers = BackpointerTable::new(len, n);

        let emit = params.emission_row(observations[0]);
        for (s, cell) in scores.scores[..n].iter_mut().enumerate() {
            *cell = ln_prob(params.initial(s)) + ln_prob(emit[s]);
        }

        let mut belief = vec![f64::NEG_INFINITY; n];
        for (t, &symbol) in observations.iter().enumerate().skip(1) {
            let emit = params.emission_row(symbol);
            let (done, rest) = scores.scores.split_at_mut(t * n);
            let prev_row = &done[(t - 1) * n..];
            let row = &mut rest[..n];
            let pointers = &mut backpointers.pointers[t * n..(t + 1) * n];

            for s in 0..n {
                for (prev, b) in belief.iter_mut().enumerate() {
                    *b = prev_row[prev] + log_transition[prev * n + s];
                }
                let (best_prev, best) = max_and_argmax(&belief).unwrap_or((0, f64::NEG_INFINITY));
                row[s] = best + ln_prob(emit[s]);
                pointers[s] = best_prev;
            }

            if row.iter().all(|&v| v == f64::NEG_INFINITY) {
                trace!(step = t, symbol, "all states impossible at step");
            }
        }

        let mut states = vec![0; len];
        states[len - 1] = argmax_first(scores.row(len - 1)).unwrap_or(0);
        for t in (1..len).rev() {
            states[t - 1] = backpointers.get(t, states[t]);
        }

        let path = ViterbiPath {
            states,
            scores,
            backpointers,
        };
        trace!(log_probability = path.log_probability(), "viterbi decode complete");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmmError;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn two_state() -> HmmParameters {
        HmmParameters::new(
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.9, 0.1], vec![0.2, 0.8]],
            vec![0.6, 0.4],
        )
        .unwrap()
    }

    #[test]
    fn decodes_two_state_example_by_hand() {
        let path = ViterbiDecoder::decode(&two_state(), &[0, 0, 1]).unwrap();
        assert_eq!(path.states, vec![0, 0, 1]);

        // t0: 0.6*0.9, 0.4*0.1
        assert!(approx_eq(path.scores.get(0, 0), 0.54f64.ln(), 1e-12));
        assert!(approx_eq(path.scores.get(0, 1), 0.04f64.ln(), 1e-12));
        // t1: max(0.54*0.7, 0.04*0.4)*0.9, max(0.54*0.3, 0.04*0.6)*0.1
        assert!(approx_eq(path.scores.get(1, 0), 0.3402f64.ln(), 1e-12));
        assert!(approx_eq(path.scores.get(1, 1), 0.0162f64.ln(), 1e-12));
        // t2
        assert!(approx_eq(path.scores.get(2, 0), 0.047628f64.ln(), 1e-12));
        assert!(approx_eq(path.scores.get(2, 1), 0.081648f64.ln(), 1e-12));

        assert_eq!(path.backpointers.row(1), &[0, 0]);
        assert_eq!(path.backpointers.row(2), &[0, 0]);
        assert!(approx_eq(path.log_probability(), 0.081648f64.ln(), 1e-12));
    }

    #[test]
    fn single_step_is_argmax_of_first_row() {
        let path = ViterbiDecoder::decode(&two_state(), &[1]).unwrap();
        // 0.6*0.2 = 0.12 vs 0.4*0.8 = 0.32
        assert_eq!(path.states, vec![1]);
        assert_eq!(path.len(), 1);
        assert_eq!(path.backpointers.row(0), &[0, 0]);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let params = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![0.5, 0.5]],
            vec![0.5, 0.5],
        )
        .unwrap();
        let path = ViterbiDecoder::decode(&params, &[0, 0, 0, 0]).unwrap();
        assert_eq!(path.states, vec![0, 0, 0, 0]);
        for t in 1..4 {
            assert_eq!(path.backpointers.row(t), &[0, 0]);
        }
    }

    #[test]
    fn impossible_step_yields_neg_inf_row_and_continues() {
        let params = HmmParameters::new(
            vec![vec![0.6, 0.4], vec![0.3, 0.7]],
            vec![vec![0.5, 0.1], vec![0.5, 0.9], vec![0.0, 0.0]],
            vec![0.5, 0.5],
        )
        .unwrap();
        let path = ViterbiDecoder::decode(&params, &[0, 1, 2, 1]).unwrap();

        assert_eq!(path.len(), 4);
        assert!(path.scores.row(2).iter().all(|&v| v == f64::NEG_INFINITY));
        assert!(path.scores.row(3).iter().all(|&v| v == f64::NEG_INFINITY));
        assert_eq!(path.backpointers.row(3), &[0, 0]);
        assert_eq!(path.states[3], 0);
        assert_eq!(path.states[2], 0);
        assert!(path.log_probability() == f64::NEG_INFINITY);
        for row in path.scores.to_rows() {
            assert!(row.iter().all(|v| !v.is_nan()));
        }
    }

    #[test]
    fn zero_initial_state_never_starts_path() {
        let params = HmmParameters::new(
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![0.1, 0.9]],
            vec![1.0, 0.0],
        )
        .unwrap();
        let path = ViterbiDecoder::decode(&params, &[0]).unwrap();
        assert_eq!(path.states, vec![0]);
        assert_eq!(path.scores.get(0, 1), f64::NEG_INFINITY);
    }

    #[test]
    fn state_probabilities_are_exp_of_scores() {
        let path = ViterbiDecoder::decode(&two_state(), &[0, 0, 1]).unwrap();
        let probs = path.state_probabilities();
        assert_eq!(probs.len(), 3);
        assert!(approx_eq(probs[0][0], 0.54, 1e-12));
        assert!(approx_eq(probs[2][1], 0.081648, 1e-12));

        let conf = path.path_confidence();
        assert!(approx_eq(conf[0], 0.54, 1e-12));
        assert!(approx_eq(conf[1], 0.3402, 1e-12));
        assert!(approx_eq(conf[2], 0.081648, 1e-12));
    }

    #[test]
    fn out_of_range_symbol_is_rejected() {
        let err = ViterbiDecoder::decode(&two_state(), &[0, 3]).unwrap_err();
        assert_eq!(
            err,
            HmmError::OutOfRangeSymbol {
                position: 1,
                symbol: 3,
                num_symbols: 2,
            }
        );
    }

    #[test]
    fn empty_observations_rejected() {
        let err = ViterbiDecoder::decode(&two_state(), &[]).unwrap_err();
        assert_eq!(err, HmmError::EmptyObservations);
    }

    #[test]
    fn score_table_dimensions() {
        let path = ViterbiDecoder::decode(&two_state(), &[0, 1, 0, 1, 1]).unwrap();
        assert_eq!(path.scores.num_steps(), 5);
        assert_eq!(path.scores.num_states(), 2);
        assert_eq!(path.backpointers.num_steps(), 5);
        assert_eq!(path.scores.to_rows().len(), 5);
    }
}
