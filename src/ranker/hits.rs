//! HITS as described in Kleinberg's seminal paper.
//! See Kleinberg, JM. "Authoritative Sources in a Hyperlinked Environment".
//!
//! Each iteration alternates the I operation (a node's authority is the sum
//! of the hub scores pointing at it) and the O operation (a node's hub score
//! is the sum of the authority scores it points at), re-normalizing both
//! vectors to [0, 1] by their maximum. Convergence is measured on the
//! deltas of both vectors together.

use std::time::Instant;

use tracing::debug;

use crate::matrix::LinkMatrix;
use crate::Result;

use super::{
    normalize_scores, normalized_input, run_to_fixed_point, Ranker, RankerOptions,
    RankerStats,
};

/// The two score vectors HITS produces, each max-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct HitsScores {
    pub authority: Vec<f64>,
    pub hub: Vec<f64>,
}

/// Kleinberg's HITS. Returns a pair of vectors, so it stands outside the
/// single-vector [`Ranker`] trait and defines its own `evaluate`; see
/// [`CombinedHitsRanker`] for the single-score form.
#[derive(Debug, Clone)]
pub struct HitsRanker {
    options: RankerOptions,
    stats: Option<RankerStats>,
}

impl HitsRanker {
    pub fn new(options: RankerOptions) -> Self {
        Self {
            options,
            stats: None,
        }
    }

    pub fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<HitsScores> {
        debug!(size = matrix.len(), "setting up HITS");
        let started = Instant::now();
        let normatrix = normalized_input(matrix)?;
        let n = matrix.len();

        let incoming = normatrix.transpose().all_neighbors();
        let outgoing = normatrix.all_neighbors();

        // Both vectors ride in one state so the shared harness measures
        // convergence across their concatenation: [authority ‖ hub].
        let iteration_started = Instant::now();
        let (state, convergence) =
            run_to_fixed_point(vec![1.0; 2 * n], &self.options, false, |state| {
                let hub = &state[n..];
                let mut authority: Vec<f64> = (0..n)
                    .map(|i| incoming[i].iter().map(|&j| hub[j]).sum())
                    .collect();
                normalize_in_place(&mut authority);
                let mut hub: Vec<f64> = (0..n)
                    .map(|j| outgoing[j].iter().map(|&i| authority[i]).sum())
                    .collect();
                normalize_in_place(&mut hub);
                authority.extend_from_slice(&hub);
                authority
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
            "HITS done"
        );
        self.stats = Some(stats);

        let (authority, hub) = state.split_at(n);
        Ok(HitsScores {
            authority: authority.to_vec(),
            hub: hub.to_vec(),
        })
    }

    pub fn stats(&self) -> Option<&RankerStats> {
        self.stats.as_ref()
    }

    pub fn options(&self) -> &RankerOptions {
        &self.options
    }
}

/// HITS folded into a single score per node, which puts it back inside the
/// [`Ranker`] trait (and therefore [`MappedRanker`](super::MappedRanker)).
///
/// The combination function receives each node's (authority, hub) pair; the
/// default keeps the authority score. The combined vector is max-normalized.
#[derive(Debug, Clone)]
pub struct CombinedHitsRanker {
    inner: HitsRanker,
    combine: fn(f64, f64) -> f64,
}

impl CombinedHitsRanker {
    pub fn new(options: RankerOptions) -> Self {
        Self::with_combination(options, |authority, _hub| authority)
    }

    pub fn with_combination(
        options: RankerOptions,
        combine: fn(f64, f64) -> f64,
    ) -> Self {
        Self {
            inner: HitsRanker::new(options),
            combine,
        }
    }
}

impl Ranker for CombinedHitsRanker {
    fn evaluate(&mut self, matrix: &LinkMatrix) -> Result<Vec<f64>> {
        let scores = self.inner.evaluate(matrix)?;
        let combined = scores
            .authority
            .iter()
            .zip(&scores.hub)
            .map(|(&authority, &hub)| (self.combine)(authority, hub))
            .collect();
        normalize_scores(combined, "combined HITS")
    }

    fn stats(&self) -> Option<&RankerStats> {
        self.inner.stats()
    }

    fn options(&self) -> &RankerOptions {
        self.inner.options()
    }
}

/// Normalize a weight vector by its maximum, leaving an all-zero vector
/// untouched rather than dividing by zero.
fn normalize_in_place(weights: &mut [f64]) {
    let max = weights.iter().copied().fold(0.0, f64::max);
    if max == 0.0 {
        return;
    }
    for w in weights {
        *w /= max;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// The canonical 5-node fixture: 0→1, 1→2, 2→3 (weight 2), 4→3, 3→0.
    /// Node 3 is the biggest authority; node 4 the biggest hub.
    fn sample() -> LinkMatrix {
        let mut m = LinkMatrix::new(5);
        m[(0, 1)] = 1.0;
        m[(1, 2)] = 1.0;
        m[(2, 3)] = 2.0;
        m[(4, 3)] = 1.0;
        m[(3, 0)] = 1.0;
        m
    }

    fn extremes(scores: &[f64]) -> (usize, usize) {
        let mut lo = 0;
        let mut hi = 0;
        for (i, &s) in scores.iter().enumerate() {
            if s > scores[hi] {
                hi = i;
            }
            if s < scores[lo] {
                lo = i;
            }
        }
        (lo, hi)
    }

    #[test]
    fn test_authority_extremes() {
        let mut ranker = HitsRanker::new(RankerOptions::default().with_epsilon(1e-12));
        let scores = ranker.evaluate(&sample()).unwrap();
        let (lo, hi) = extremes(&scores.authority);
        assert_eq!(hi, 3);
        assert_eq!(lo, 4);
    }

    #[test]
    fn test_hub_maximum() {
        let mut ranker = HitsRanker::new(RankerOptions::default().with_epsilon(1e-12));
        let scores = ranker.evaluate(&sample()).unwrap();
        // Nodes 2 and 4 both point only at the top authority, so they tie
        // for the hub maximum; 4 must attain it.
        let max = scores.hub.iter().copied().fold(0.0, f64::max);
        assert!((scores.hub[4] - max).abs() < 1e-9);
        assert!(scores.hub[4] > scores.hub[0]);
    }

    #[test]
    fn test_both_vectors_max_normalized() {
        let mut ranker = HitsRanker::new(RankerOptions::default());
        let scores = ranker.evaluate(&sample()).unwrap();
        for v in [&scores.authority, &scores.hub] {
            let max = v.iter().copied().fold(0.0, f64::max);
            assert!((max - 1.0).abs() < 1e-12);
        }
        assert!(ranker.stats().is_some());
    }

    #[test]
    fn test_combined_defaults_to_authority() {
        let opts = RankerOptions::default().with_epsilon(1e-12);
        let pair = HitsRanker::new(opts).evaluate(&sample()).unwrap();
        let combined = CombinedHitsRanker::new(opts).evaluate(&sample()).unwrap();
        for (a, c) in pair.authority.iter().zip(&combined) {
            assert!((a - c).abs() < 1e-12);
        }
    }

    #[test]
    fn test_combined_custom_function() {
        let opts = RankerOptions::default().with_epsilon(1e-12);
        let mut ranker =
            CombinedHitsRanker::with_combination(opts, |authority, hub| authority + hub);
        let combined = ranker.evaluate(&sample()).unwrap();
        let authority_only = CombinedHitsRanker::new(opts).evaluate(&sample()).unwrap();
        assert!(combined != authority_only);
        let max = combined.iter().copied().fold(0.0, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
        assert!(ranker.stats().is_some());
    }

    #[test]
    fn test_failure_modes() {
        let mut ranker = HitsRanker::new(RankerOptions::default());
        assert!(matches!(
            ranker.evaluate(&LinkMatrix::new(0)),
            Err(Error::EmptyMatrix(_))
        ));
        assert!(matches!(
            ranker.evaluate(&LinkMatrix::new(4)),
            Err(Error::NoLinks(_))
        ));
    }
}
