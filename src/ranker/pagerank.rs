//! PageRank over a link matrix, in plain and weighted forms.
//!
//! Both rankers damp propagation the classic way: each node keeps a uniform
//! `1 - d` reset share and receives `d` times the contributions of the nodes
//! pointing at it, divided by their out-degree. The plain variant reads the
//! matrix as pure connectivity; the weighted variant scales every incoming
//! contribution by the normalized edge weight.

use std::time::Instant;

use tracing::debug;

use crate::matrix::LinkMatrix;
use crate::Result;

use super::{
    normalize_scores, normalized_input, run_to_fixed_point, Ranker, RankerOptions,
    RankerStats,
};

/// PageRank on connectivity: the edge weight decides only *whether* a link
/// exists, not how much score flows through it.
#[derive(Debug, Clone)]
pub struct PageRanker {
    options: RankerOptions,
    stats: Option<RankerStats>,
}

impl PageRanker {
    pub fn new(options: RankerOptions) -> Self {
        Self {
            options,
            stats: None,
        }
    }
}

impl Ranker for PageRanker {
    fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<Vec<f64>> {
        let (scores, stats) = damped_propagation(matrix, &self.options, false)?;
        self.stats = Some(stats);
        Ok(scores)
    }

    fn stats(&self) -> Option<&RankerStats> {
        self.stats.as_ref()
    }

    fn options(&self) -> &RankerOptions {
        &self.options
    }
}

/// PageRank that takes the link weights into account, using the normalized
/// matrix value at `(j, i)` as a factor in each incoming contribution.
#[derive(Debug, Clone)]
pub struct WeightedPageRanker {
    options: RankerOptions,
    stats: Option<RankerStats>,
}

impl WeightedPageRanker {
    pub fn new(options: RankerOptions) -> Self {
        Self {
            options,
            stats: None,
        }
    }
}

impl Ranker for WeightedPageRanker {
    fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<Vec<f64>> {
        let (scores, stats) = damped_propagation(matrix, &self.options, true)?;
        self.stats = Some(stats);
        Ok(scores)
    }

    fn stats(&self) -> Option<&RankerStats> {
        self.stats.as_ref()
    }

    fn options(&self) -> &RankerOptions {
        &self.options
    }
}

/// The shared PageRank loop. `weighted` switches the incoming contribution
/// between `old[j] / outdeg(j)` and `old[j] · m̂[j,i] / outdeg(j)`.
fn damped_propagation(
    matrix: &LinkMatrix,
    options: &RankerOptions,
    weighted: bool,
) -> Result<(Vec<f64>, RankerStats)> {
    debug!(size = matrix.len(), weighted, "setting up PageRank");
    let started = Instant::now();
    let normatrix = normalized_input(matrix)?;
    let n = matrix.len();

    // Out-degree of every node, and who points at whom: for every
    // m[j, i] != 0 there is an incoming link j → i, which is exactly the
    // neighbor structure of the transpose.
    let outgoing: Vec<usize> = (0..n).map(|j| matrix.row_nonzero(j)).collect();
    let incoming = normatrix.transpose().all_neighbors();

    let damping = options.damping;
    let reset = 1.0 - damping;
    let iteration_started = Instant::now();
    let (scores, convergence) =
        run_to_fixed_point(vec![1.0; n], options, false, |old| {
            (0..n)
                .map(|i| {
                    let mut incoming_share = 0.0;
                    for &j in &incoming[i] {
                        let contribution = if weighted {
                            old[j] * normatrix[(j, i)]
                        } else {
                            old[j]
                        };
                        incoming_share += contribution / outgoing[j] as f64;
                    }
                    reset + damping * incoming_share
                })
                .collect()
        });

    let stats = RankerStats::record(
        convergence.iterations,
        convergence.delta,
        started,
        iteration_started,
    );
    debug!(iterations = stats.iterations, delta = stats.final_delta, "PageRank done");
    let scores = normalize_scores(scores, "PageRank")?;
    Ok((scores, stats))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// The canonical 5-node fixture: 0→1, 1→2, 2→3 (weight 2), 4→3, 3→0.
    /// Node 3 should rank highest, then 0, 1, 2; node 4 lowest.
    fn sample() -> LinkMatrix {
        let mut m = LinkMatrix::new(5);
        m[(0, 1)] = 1.0;
        m[(1, 2)] = 1.0;
        m[(2, 3)] = 2.0;
        m[(4, 3)] = 1.0;
        m[(3, 0)] = 1.0;
        m
    }

    #[test]
    fn test_evaluation_ordering() {
        let mut ranker = PageRanker::new(RankerOptions::default().with_epsilon(1e-12));
        let pr = ranker.evaluate(&sample()).unwrap();
        assert!(pr[3] > pr[0]);
        assert!(pr[0] > pr[1]);
        assert!(pr[1] > pr[2]);
        assert!(pr[2] > pr[4]);
        let stats = ranker.stats().unwrap();
        assert!(stats.iterations >= 1);
        assert!(stats.converged(1e-12));
    }

    #[test]
    fn test_connectivity_only_ignores_weight() {
        // Dropping 2→3 to weight 1 must not change the plain ranking.
        let mut single = sample();
        single[(2, 3)] = 1.0;
        let opts = RankerOptions::default().with_epsilon(1e-12);
        let double = PageRanker::new(opts).evaluate(&sample()).unwrap();
        let dropped = PageRanker::new(opts).evaluate(&single).unwrap();
        for (a, b) in double.iter().zip(&dropped) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_weighted_variant_feels_the_weight() {
        let opts = RankerOptions::default().with_epsilon(1e-12);
        let plain = WeightedPageRanker::new(opts).evaluate(&sample()).unwrap();
        let mut single = sample();
        single[(2, 3)] = 1.0;
        let dropped = WeightedPageRanker::new(opts).evaluate(&single).unwrap();
        assert!(plain != dropped);
    }

    #[test]
    fn test_result_is_max_normalized() {
        let mut ranker = PageRanker::new(RankerOptions::default());
        let pr = ranker.evaluate(&sample()).unwrap();
        let max = pr.iter().copied().fold(0.0, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_matrix_is_an_input_error() {
        let mut ranker = PageRanker::new(RankerOptions::default());
        assert!(matches!(
            ranker.evaluate(&LinkMatrix::new(0)),
            Err(Error::EmptyMatrix(_))
        ));
    }

    #[test]
    fn test_zero_edge_matrix_is_degenerate() {
        let mut ranker = PageRanker::new(RankerOptions::default());
        assert!(matches!(
            ranker.evaluate(&LinkMatrix::new(5)),
            Err(Error::NoLinks(_))
        ));
    }
}
