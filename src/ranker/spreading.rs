//! Spreading activation: seed-driven score accumulation.
//!
//! Works like weighted PageRank with two differences: the caller-supplied
//! seed vector is the *initial* state only — it is not re-injected every
//! iteration — and activation accumulates onto each node's previous value
//! instead of replacing it. Accumulation can blow up on dense graphs, so
//! the iteration halts on the first non-finite value and returns the last
//! finite vector with a warning instead of propagating NaN/Inf.

use std::time::Instant;

use tracing::{debug, warn};

use crate::matrix::LinkMatrix;
use crate::{Error, Result};

use super::{
    normalize_scores, normalized_input, run_to_fixed_point, Ranker, RankerOptions,
    RankerStats,
};

#[derive(Debug, Clone)]
pub struct SpreadingActivation {
    options: RankerOptions,
    seed: Vec<f64>,
    stats: Option<RankerStats>,
    overflowed: bool,
}

impl SpreadingActivation {
    /// `seed` holds the initial activation of every node and must match the
    /// matrix size at evaluation time.
    pub fn new(options: RankerOptions, seed: Vec<f64>) -> Self {
        Self {
            options,
            seed,
            stats: None,
            overflowed: false,
        }
    }

    /// Whether the last `evaluate` halted on a numeric overflow and
    /// returned the last finite vector.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl Ranker for SpreadingActivation {
    fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<Vec<f64>> {
        debug!(size = matrix.len(), "setting up spreading activation");
        if self.options.max_iterations > 100 {
            warn!(
                max_iterations = self.options.max_iterations,
                "unusually large iteration ceiling for spreading activation"
            );
        }
        let started = Instant::now();
        let normatrix = normalized_input(matrix)?;
        let n = matrix.len();
        if self.seed.len() != n {
            return Err(Error::SeedMismatch {
                expected: n,
                got: self.seed.len(),
            });
        }

        let outgoing: Vec<usize> = (0..n).map(|j| matrix.row_nonzero(j)).collect();
        let incoming = normatrix.transpose().all_neighbors();

        let damping = self.options.damping;
        let iteration_started = Instant::now();
        let (scores, convergence) =
            run_to_fixed_point(self.seed.clone(), &self.options, true, |old| {
                (0..n)
                    .map(|i| {
                        let mut activation = 0.0;
                        for &j in &incoming[i] {
                            activation += old[j] * normatrix[(j, i)] / outgoing[j] as f64;
                        }
                        old[i] + damping * activation
                    })
                    .collect()
            });

        let stats = RankerStats::record(
            convergence.iterations,
            convergence.delta,
            started,
            iteration_started,
        );
        debug!(
            iterations = stats.iterations,
            delta = stats.final_delta,
            overflowed = convergence.overflowed,
            "spreading activation done"
        );
        self.stats = Some(stats);
        self.overflowed = convergence.overflowed;
        normalize_scores(scores, "spreading activation")
    }

    fn stats(&self) -> Option<&RankerStats> {
        self.stats.as_ref()
    }

    fn options(&self) -> &RankerOptions {
        &self.options
    }
}

// ============================================================================
// Tests
// ============================================================================
