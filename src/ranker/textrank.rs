//! TextRank as described by Mihalcea & Tarau (2004), for symmetric
//! (adirectional) graphs.
//!
//! Each node's score is a damped sum over its neighbors, with every
//! neighbor's contribution weighted by the share its edge takes of that
//! neighbor's total edge weight:
//!
//! ```text
//! new[i] = (1 - d) + d · Σ_{j ∈ nb(i)} (ŵ[j,i] / Σ_{k ∈ nb(j)} ŵ[j,k]) · old[j]
//! ```

use std::time::Instant;

use tracing::debug;

use crate::matrix::LinkMatrix;
use crate::Result;

use super::{
    normalize_scores, normalized_input, run_to_fixed_point, Ranker, RankerOptions,
    RankerStats,
};

#[derive(Debug, Clone)]
pub struct TextRanker {
    options: RankerOptions,
    stats: Option<RankerStats>,
}

impl TextRanker {
    pub fn new(options: RankerOptions) -> Self {
        Self {
            options,
            stats: None,
        }
    }
}

impl Ranker for TextRanker {
    fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<Vec<f64>> {
        debug!(size = matrix.len(), "setting up TextRank");
        let started = Instant::now();
        let normatrix = normalized_input(matrix)?;
        let n = matrix.len();

        // Precompute each node's neighborhood and its total edge weight.
        let neighborhood = matrix.all_neighbors();
        let neighborhood_weights: Vec<f64> = (0..n)
            .map(|j| neighborhood[j].iter().map(|&k| normatrix[(j, k)]).sum())
            .collect();

        let damping = self.options.damping;
        let iteration_started = Instant::now();
        let (scores, convergence) =
            run_to_fixed_point(vec![1.0; n], &self.options, false, |old| {
                (0..n)
                    .map(|i| {
                        let mut share = 0.0;
                        for &j in &neighborhood[i] {
                            share +=
                                normatrix[(j, i)] / neighborhood_weights[j] * old[j];
                        }
                        1.0 - damping + damping * share
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
            "TextRank done"
        );
        self.stats = Some(stats);
        normalize_scores(scores, "TextRank")
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
