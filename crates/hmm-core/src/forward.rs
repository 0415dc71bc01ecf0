//! Forward algorithm: total probability of an observation sequence.
//!
//! Two accumulations of the same recurrence over a rolling `S`-vector:
//!
//! - [`ForwardEvaluator::evaluate`] works in the linear domain, exactly
//!   `alpha'[s] = (sum_prev alpha[prev] * transition[prev][s]) * emission[obs[t]][s]`.
//!   There is no rescaling, so long sequences underflow to `0.0`.
//! - [`ForwardEvaluator::evaluate_log`] carries `ln(alpha)` and combines
//!   predecessors with log-sum-exp, returning `ln P(obs)`.

use crate::error::Result;
use crate::params::HmmParameters;
use hmm_math::{ln_prob, ln_probs, log_sum_exp};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Which accumulation [`ForwardEvaluator::evaluate_with`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Linear-domain products (underflows on long sequences).
    #[default]
    Linear,
    /// Log-domain accumulation.
    Log,
}

impl std::str::FromStr for ForwardMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "lin" => Ok(ForwardMode::Linear),
            "log" | "log-space" | "logspace" => Ok(ForwardMode::Log),
            _ => Err(format!("unknown forward mode: {}", s)),
        }
    }
}

impl fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardMode::Linear => write!(f, "linear"),
            ForwardMode::Log => write!(f, "log"),
        }
    }
}

/// Both views of a forward evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardOutcome {
    pub mode: ForwardMode,
    /// `P(obs)`; `exp(log_probability)` in log mode, so it may still be 0.
    pub probability: f64,
    /// `ln P(obs)`; `ln(probability)` in linear mode.
    pub log_probability: f64,
}

/// Forward total-probability evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardEvaluator;

impl ForwardEvaluator {
    /// Total probability of `observations`, linear domain.
    pub fn evaluate(params: &HmmParameters, observations: &[usize]) -> Result<f64> {
        params.check_observations(observations)?;

        let n = params.num_states();
        debug!(num_states = n, num_steps = observations.len(), "forward evaluate");

        let emit = params.emission_row(observations[0]);
        let mut alpha: Vec<f64> = params
            .initial_distribution()
            .iter()
            .zip(emit)
            .map(|(p, e)| p * e)
            .collect();
        let mut next = vec![0.0; n];

        for &symbol in &observations[1..] {
            let emit = params.emission_row(symbol);
            for (s, out) in next.iter_mut().enumerate() {
                let prior: f64 = alpha
                    .iter()
                    .enumerate()
                    .map(|(prev, a)| a * params.transition(prev, s))
                    .sum();
                *out = prior * emit[s];
            }
            std::mem::swap(&mut alpha, &mut next);
        }

        let total: f64 = alpha.iter().sum();
        trace!(probability = total, "forward evaluate complete");
        Ok(total)
    }

    /// Natural log of the total probability, accumulated in log space.
    ///
    /// Returns `-inf` for sequences the model cannot produce.
    pub fn evaluate_log(params: &HmmParameters, observations: &[usize]) -> Result<f64> {
        params.check_observations(observations)?;

        let n = params.num_states();
        debug!(num_states = n, num_steps = observations.len(), "forward evaluate (log)");

        let log_transition: Vec<f64> = (0..n)
            .flat_map(|from| ln_probs(params.transition_row(from)))
            .collect();

        let emit = params.emission_row(observations[0]);
        let mut log_alpha: Vec<f64> = (0..n)
            .map(|s| ln_prob(params.initial(s)) + ln_prob(emit[s]))
            .collect();
        let mut next = vec![f64::NEG_INFINITY; n];
        let mut terms = vec![f64::NEG_INFINITY; n];

        for &symbol in &observations[1..] {
            let emit = params.emission_row(symbol);
            for (s, out) in next.iter_mut().enumerate() {
                for (prev, term) in terms.iter_mut().enumerate() {
                    *term = log_alpha[prev] + log_transition[prev * n + s];
                }
                *out = log_sum_exp(&terms) + ln_prob(emit[s]);
            }
            std::mem::swap(&mut log_alpha, &mut next);
        }

        let total = log_sum_exp(&log_alpha);
        trace!(log_probability = total, "forward evaluate (log) complete");
        Ok(total)
    }

    /// Evaluate with the requested accumulation and report both views.
    pub fn evaluate_with(
        params: &HmmParameters,
        observations: &[usize],
        mode: ForwardMode,
    ) -> Result<ForwardOutcome> {
        let outcome = match mode {
            ForwardMode::Linear => {
                let probability = Self::evaluate(params, observations)?;
                ForwardOutcome {
                    mode,
                    probability,
                    log_probability: ln_prob(probability),
                }
            }
            ForwardMode::Log => {
                let log_probability = Self::evaluate_log(params, observations)?;
                ForwardOutcome {
                    mode,
                    probability: log_probability.exp(),
                    log_probability,
                }
            }
        };
        Ok(outcome)
    }
}
