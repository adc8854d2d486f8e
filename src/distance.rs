//! All-pairs shortest-path distances and the centrality metrics derived
//! from them.
//!
//! Distance is hop count over link *presence* — weights play no part. See
//! Dhyani D., Ng W.K., and Bhowmick S.S., "A Survey of Web Metrics" for the
//! centrality, compactness, and stratum definitions.

use std::cell::OnceCell;
use std::collections::VecDeque;

use tracing::trace;

use crate::matrix::{LinkMatrix, Matrix};
use crate::{Error, Result};

/// An immutable matrix of shortest-path hop counts: `d[(i, j)]` is the
/// length of the shortest path from i to j, or the unreachable sentinel when
/// no path exists. Self-distance is always 0, self-loops notwithstanding.
///
/// Built once by BFS from every source node; meant to compute stats on, so
/// it is immutable by design.
#[derive(Debug)]
pub struct DistanceMatrix {
    matrix: Matrix,
    unreachable: f64,
    /// Total of all out-distances, memoized on first use. The matrix never
    /// changes after construction, so compute-once-cache is safe.
    converted_distance: OnceCell<f64>,
}

impl DistanceMatrix {
    /// Compute the distance matrix for a link matrix. `unreachable` is the
    /// distance recorded for pairs with no path; it defaults to the node
    /// count, which is reasonable in most cases (one more than the longest
    /// possible path).
    pub fn from_link_matrix(links: &LinkMatrix, unreachable: Option<f64>) -> Self {
        let n = links.len();
        let unreachable = unreachable.unwrap_or(n as f64);
        trace!(size = n, "computing all-pairs shortest paths");

        let neighbors = links.all_neighbors();
        let mut matrix = Matrix::new(n);
        let mut queue = VecDeque::new();
        for source in 0..n {
            // BFS from `source`; hop counts land directly in the row.
            let mut hops = vec![f64::NEG_INFINITY; n];
            hops[source] = 0.0;
            queue.clear();
            queue.push_back(source);
            while let Some(at) = queue.pop_front() {
                for &next in &neighbors[at] {
                    if hops[next] == f64::NEG_INFINITY {
                        hops[next] = hops[at] + 1.0;
                        queue.push_back(next);
                    }
                }
            }
            for (j, hop) in hops.into_iter().enumerate() {
                matrix[(source, j)] = if hop == f64::NEG_INFINITY {
                    unreachable
                } else {
                    hop
                };
            }
        }

        Self {
            matrix,
            unreachable,
            converted_distance: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// The sentinel distance recorded for unreachable pairs.
    pub fn unreachable(&self) -> f64 {
        self.unreachable
    }

    /// The out-distance of node i: the sum of its row.
    pub fn out_distance(&self, i: usize) -> f64 {
        self.matrix.rowsum(i)
    }

    /// The in-distance of node j: the sum of its column.
    pub fn in_distance(&self, j: usize) -> f64 {
        self.matrix.colsum(j)
    }

    /// The graph-wide total distance ("converted distance"), cached after
    /// the first call.
    pub fn converted_distance(&self) -> f64 {
        *self
            .converted_distance
            .get_or_init(|| (0..self.len()).map(|i| self.out_distance(i)).sum())
    }

    /// The graph-wide total distance relative to node i's out-distance.
    /// A zero out-distance (possible on one-node graphs) fails rather than
    /// yielding a silent NaN.
    pub fn relative_out_centrality(&self, i: usize) -> Result<f64> {
        let out = self.out_distance(i);
        if out == 0.0 {
            return Err(Error::ZeroDistance { node: i });
        }
        Ok(self.converted_distance() / out)
    }

    /// The graph-wide total distance relative to node j's in-distance.
    /// Fails on a zero in-distance, like the out variant.
    pub fn relative_in_centrality(&self, j: usize) -> Result<f64> {
        let incoming = self.in_distance(j);
        if incoming == 0.0 {
            return Err(Error::ZeroDistance { node: j });
        }
        Ok(self.converted_distance() / incoming)
    }

    /// Normalization factor for maximal centrality: every ordered pair at
    /// the unreachable sentinel.
    pub fn max_centrality_norm_factor(&self) -> f64 {
        let n = self.len() as f64;
        (n * n - n) * self.unreachable
    }

    /// Normalization factor for minimal centrality: every ordered pair at
    /// distance 1.
    pub fn min_centrality_norm_factor(&self) -> f64 {
        let n = self.len() as f64;
        n * n - n
    }

    /// How connected the graph is, on a 0..1 scale between the
    /// everything-unreachable and everything-adjacent extremes.
    pub fn compactness(&self) -> f64 {
        (self.max_centrality_norm_factor() - self.converted_distance())
            / (self.max_centrality_norm_factor() - self.min_centrality_norm_factor())
    }

    /// Directional imbalance of the graph ("linearity"). For each node the
    /// reachable-only row and column sums are compared; sentinel cells
    /// contribute 0 to both sides. The divisor is `n³/4` for even n and
    /// `(n³-n)/4` for odd n.
    pub fn stratum(&self) -> f64 {
        let n = self.len();
        let nf = n as f64;
        let lap = if n % 2 == 0 {
            nf.powi(3) / 4.0
        } else {
            (nf.powi(3) - nf) / 4.0
        };
        let mut total = 0.0;
        for i in 0..n {
            let mut status = 0.0;
            let mut contrastatus = 0.0;
            for j in 0..n {
                let rowval = self.matrix[(i, j)];
                let colval = self.matrix[(j, i)];
                if rowval != self.unreachable {
                    status += rowval;
                }
                if colval != self.unreachable {
                    contrastatus += colval;
                }
            }
            total += (status - contrastatus).abs();
        }
        total / lap
    }
}

impl std::ops::Index<(usize, usize)> for DistanceMatrix {
    type Output = f64;

    fn index(&self, idx: (usize, usize)) -> &f64 {
        &self.matrix[idx]
    }
}

// ============================================================================
// Tests
// ============================================================================
