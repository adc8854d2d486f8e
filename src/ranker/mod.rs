//! The iterative ranker family.
//!
//! Every ranker follows the same protocol: validate the matrix, normalize
//! it, iterate an algorithm-specific update rule until the summed per-node
//! change drops to epsilon or the iteration ceiling is hit, record stats,
//! and max-normalize the result. The shared pieces live here; each
//! algorithm contributes only its update rule.
//!
//! Hitting the iteration ceiling is not an error — the last computed vector
//! is returned and the stats show the non-converged delta.

pub mod pagerank;
pub mod textrank;
pub mod hits;
pub mod spreading;
pub mod mapped;

pub use hits::{CombinedHitsRanker, HitsRanker, HitsScores};
pub use mapped::{MappedRanker, RankedTerms};
pub use pagerank::{PageRanker, WeightedPageRanker};
pub use spreading::SpreadingActivation;
pub use textrank::TextRanker;

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

use crate::matrix::LinkMatrix;
use crate::{Error, Result};

// ============================================================================
// Options & stats
// ============================================================================

/// Shared construction parameters for the whole ranker family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankerOptions {
    /// How much score propagates through links vs. is retained/reset.
    /// Must lie in (0, 1].
    pub damping: f64,
    /// Convergence threshold on the total per-iteration score change.
    pub epsilon: f64,
    /// Hard iteration ceiling; reaching it is a normal termination path.
    pub max_iterations: usize,
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            damping: 0.85,
            epsilon: 1e-4,
            max_iterations: 10_000,
        }
    }
}

impl RankerOptions {
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Diagnostic snapshot of the last `evaluate` call. Not part of the ranking
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankerStats {
    pub iterations: usize,
    /// The accumulator value at the last iteration; above epsilon when the
    /// iteration ceiling cut the run short.
    pub final_delta: f64,
    pub setup_time: Duration,
    pub iter_time: Duration,
    pub total_time: Duration,
}

impl RankerStats {
    pub(crate) fn record(
        iterations: usize,
        final_delta: f64,
        started: Instant,
        iteration_started: Instant,
    ) -> Self {
        let finished = Instant::now();
        Self {
            iterations,
            final_delta,
            setup_time: iteration_started - started,
            iter_time: finished - iteration_started,
            total_time: finished - started,
        }
    }

    /// Whether the run stopped because the accumulator dropped to epsilon,
    /// rather than the iteration ceiling or an overflow.
    pub fn converged(&self, epsilon: f64) -> bool {
        self.final_delta <= epsilon
    }
}

// ============================================================================
// Ranker trait
// ============================================================================

/// A ranker that maps a link matrix to one score per node.
///
/// [`HitsRanker`] is not part of this trait: it returns a pair of vectors
/// and defines its own `evaluate`. [`CombinedHitsRanker`] folds the pair
/// into one score and rejoins the trait.
pub trait Ranker {
    /// Run the iteration and return the max-normalized score vector.
    fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<Vec<f64>>;

    /// Stats for the most recent `evaluate`, if one has run.
    fn stats(&self) -> Option<&RankerStats>;

    fn options(&self) -> &RankerOptions;
}

// ============================================================================
// Shared harness
// ============================================================================

pub(crate) struct Convergence {
    pub iterations: usize,
    pub delta: f64,
    pub overflowed: bool,
}

/// Validate and normalize a ranker input matrix. An empty matrix and an
/// all-zero matrix fail distinctly.
pub(crate) fn normalized_input(matrix: &LinkMatrix) -> Result<LinkMatrix> {
    if matrix.is_empty() {
        return Err(Error::EmptyMatrix(
            "cannot rank an empty link matrix".into(),
        ));
    }
    matrix.normalize()
}

/// Drive `step` to a fixed point: stop when the summed absolute per-node
/// change is at most epsilon, or when the iteration ceiling is exceeded
/// (best-effort result, logged, not an error).
///
/// With `guard_non_finite` set, a step that produces any non-finite value is
/// discarded and the last finite state is returned with `overflowed` set.
pub(crate) fn run_to_fixed_point(
    mut state: Vec<f64>,
    options: &RankerOptions,
    guard_non_finite: bool,
    mut step: impl FnMut(&[f64]) -> Vec<f64>,
) -> (Vec<f64>, Convergence) {
    let mut delta = f64::INFINITY;
    let mut iterations = 0usize;
    let mut overflowed = false;

    while delta > options.epsilon {
        if iterations > options.max_iterations {
            warn!(
                limit = options.max_iterations,
                delta, "iteration limit reached; ending the computation prematurely"
            );
            break;
        }
        let next = step(&state);
        iterations += 1;
        if guard_non_finite && next.iter().any(|v| !v.is_finite()) {
            warn!(
                iteration = iterations,
                "overflow produced non-finite scores; keeping the last finite vector"
            );
            overflowed = true;
            break;
        }
        delta = state
            .iter()
            .zip(&next)
            .map(|(old, new)| (old - new).abs())
            .sum();
        state = next;
    }

    (
        state,
        Convergence {
            iterations,
            delta,
            overflowed,
        },
    )
}

/// Divide a score vector by its own maximum. An all-zero vector means the
/// ranking collapsed and cannot be normalized.
pub(crate) fn normalize_scores(scores: Vec<f64>, algorithm: &str) -> Result<Vec<f64>> {
    let highest = scores.iter().copied().fold(0.0, f64::max);
    if highest == 0.0 {
        return Err(Error::DegenerateRanking(format!(
            "{algorithm} returned all zeros"
        )));
    }
    Ok(scores.into_iter().map(|s| s / highest).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_stops_on_epsilon() {
        // Halving converges geometrically.
        let opts = RankerOptions::default().with_epsilon(0.01);
        let (state, conv) =
            run_to_fixed_point(vec![1.0], &opts, false, |s| vec![s[0] / 2.0]);
        assert!(conv.delta <= 0.01);
        assert!(!conv.overflowed);
        assert!(state[0] < 0.02);
    }

    #[test]
    fn test_harness_iteration_ceiling_is_soft() {
        let opts = RankerOptions::default().with_max_iterations(3).with_epsilon(0.0);
        // Oscillates forever; the ceiling must cut it off and keep the
        // last computed state.
        let (state, conv) = run_to_fixed_point(vec![0.0], &opts, false, |s| vec![1.0 - s[0]]);
        assert_eq!(conv.iterations, 4);
        assert!(conv.delta > 0.0);
        assert!(state[0] == 0.0 || state[0] == 1.0);
    }

    #[test]
    fn test_harness_overflow_guard_keeps_last_finite() {
        let opts = RankerOptions::default().with_epsilon(0.0).with_max_iterations(100);
        let (state, conv) =
            run_to_fixed_point(vec![1.0], &opts, true, |s| vec![s[0] * f64::MAX]);
        assert!(conv.overflowed);
        assert!(state.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_normalize_scores_rejects_all_zero() {
        assert!(matches!(
            normalize_scores(vec![0.0, 0.0], "test"),
            Err(Error::DegenerateRanking(_))
        ));
        let scores = normalize_scores(vec![1.0, 4.0], "test").unwrap();
        assert_eq!(scores, vec![0.25, 1.0]);
    }
}
