//! Adapts a raw score vector back into (term, score) pairs.
//!
//! [`MappedRanker`] is explicit composition, not a passthrough proxy: it
//! exposes exactly `evaluate` and `stats` of the wrapped ranker, plus the
//! term pairing.

use crate::matrix::MappedLinkMatrix;
use crate::model::{Node, NodeId};
use crate::Result;

use super::{Ranker, RankerStats};

/// Ranking results as (term, score) pairs, ordered by descending score.
/// Ties keep the terms' original matrix order.
#[derive(Debug, Clone)]
pub struct RankedTerms {
    scored_terms: Vec<(Node, f64)>,
}

impl RankedTerms {
    pub(crate) fn new(terms: &[Node], scores: Vec<f64>) -> Self {
        debug_assert_eq!(
            terms.len(),
            scores.len(),
            "the mapped matrix and the score vector must agree on size"
        );
        let mut scored_terms: Vec<(Node, f64)> =
            terms.iter().cloned().zip(scores).collect();
        // Stable sort: equal scores stay in term-insertion order.
        scored_terms.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { scored_terms }
    }

    pub fn len(&self) -> usize {
        self.scored_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scored_terms.is_empty()
    }

    /// The score of a specific term, if it was ranked.
    pub fn score(&self, term: &NodeId) -> Option<f64> {
        self.scored_terms
            .iter()
            .find(|(node, _)| &node.id == term)
            .map(|&(_, score)| score)
    }

    /// Iterate best-first.
    pub fn iter(&self) -> impl Iterator<Item = (&Node, f64)> {
        self.scored_terms.iter().map(|(node, score)| (node, *score))
    }

    pub fn into_vec(self) -> Vec<(Node, f64)> {
        self.scored_terms
    }
}

/// Wraps a [`Ranker`] so that it returns [`RankedTerms`], always pairing
/// terms with their scores through the matrix's term mapping.
#[derive(Debug, Clone)]
pub struct MappedRanker<R: Ranker> {
    ranker: R,
}

impl<R: Ranker> MappedRanker<R> {
    pub fn new(ranker: R) -> Self {
        Self { ranker }
    }

    /// Run the wrapped ranker on the mapped matrix and pair the scores with
    /// its terms.
    pub fn evaluate(&mut self, matrix: &MappedLinkMatrix) -> Result<RankedTerms> {
        let scores = self.ranker.evaluate(matrix.link_matrix())?;
        Ok(RankedTerms::new(matrix.terms(), scores))
    }

    pub fn stats(&self) -> Option<&RankerStats> {
        self.ranker.stats()
    }

    pub fn into_inner(self) -> R {
        self.ranker
    }
}

// ============================================================================
// Tests
// ============================================================================
