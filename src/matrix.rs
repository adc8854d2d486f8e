//! Dense square matrices: the generic numeric [`Matrix`], the
//! adjacency-oriented [`LinkMatrix`], and the term-addressed
//! [`MappedLinkMatrix`].
//!
//! `m[(i, j)]` holds the weight of the link i→j; 0 means no link. All three
//! types are row-major `Vec<f64>` under the hood — co-occurrence graphs are
//! small and dense enough that a flat grid beats sparse bookkeeping.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::{Node, NodeId};
use crate::{Error, Result};

/// Non-zero column indices of one row. Most rows in a co-occurrence graph
/// touch only a handful of neighbors, so the list stays inline.
pub type Neighbors = SmallVec<[usize; 8]>;

// ============================================================================
// Matrix
// ============================================================================

/// A square numeric matrix with the row/column aggregates the rankers and
/// distance metrics need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    size: usize,
    cells: Vec<f64>,
}

impl Matrix {
    /// A zero-filled `size` × `size` matrix.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0.0; size * size],
        }
    }

    /// Number of rows (== number of columns).
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The largest cell value in the whole matrix; 0.0 for an empty matrix.
    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(0.0, f64::max)
    }

    /// Sum of row `i`.
    pub fn rowsum(&self, i: usize) -> f64 {
        self.row(i).iter().sum()
    }

    /// Sum of column `j`.
    pub fn colsum(&self, j: usize) -> f64 {
        (0..self.size).map(|i| self[(i, j)]).sum()
    }

    /// Count of non-zero entries in row `i` — the out-degree proxy.
    pub fn row_nonzero(&self, i: usize) -> usize {
        self.row(i).iter().filter(|&&v| v != 0.0).count()
    }

    /// Count of non-zero entries in column `j` — the in-degree proxy.
    pub fn col_nonzero(&self, j: usize) -> usize {
        (0..self.size).filter(|&i| self[(i, j)] != 0.0).count()
    }

    /// A new matrix with every cell divided by the single largest cell.
    ///
    /// Fails with [`Error::NoLinks`] when the matrix is all-zero: callers
    /// must treat "no links" as its own error case rather than receiving a
    /// silently zeroed matrix.
    pub fn normalize(&self) -> Result<Self> {
        let max = self.max();
        if max == 0.0 {
            return Err(Error::NoLinks(
                "cannot normalize a matrix with no nonzero cells".into(),
            ));
        }
        Ok(Self {
            size: self.size,
            cells: self.cells.iter().map(|v| v / max).collect(),
        })
    }

    /// A new matrix with rows and columns swapped.
    pub fn transpose(&self) -> Self {
        let mut out = Self::new(self.size);
        for i in 0..self.size {
            for j in 0..self.size {
                out[(j, i)] = self[(i, j)];
            }
        }
        out
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.cells[i * self.size..(i + 1) * self.size]
    }
}

impl std::ops::Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(i < self.size && j < self.size, "matrix index out of bounds");
        &self.cells[i * self.size + j]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(i < self.size && j < self.size, "matrix index out of bounds");
        &mut self.cells[i * self.size + j]
    }
}

// ============================================================================
// LinkMatrix
// ============================================================================

/// A [`Matrix`] read as an adjacency structure: `m[(i, j)] != 0` means there
/// is a link from i to j, and `neighbors(i)` lists where i points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMatrix {
    inner: Matrix,
}

impl LinkMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            inner: Matrix::new(size),
        }
    }

    pub fn from_matrix(inner: Matrix) -> Self {
        Self { inner }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn max(&self) -> f64 {
        self.inner.max()
    }

    pub fn rowsum(&self, i: usize) -> f64 {
        self.inner.rowsum(i)
    }

    pub fn colsum(&self, j: usize) -> f64 {
        self.inner.colsum(j)
    }

    pub fn row_nonzero(&self, i: usize) -> usize {
        self.inner.row_nonzero(i)
    }

    pub fn col_nonzero(&self, j: usize) -> usize {
        self.inner.col_nonzero(j)
    }

    /// The ordered column indices `j` with `m[(i, j)] != 0`.
    pub fn neighbors(&self, i: usize) -> Neighbors {
        (0..self.len()).filter(|&j| self[(i, j)] != 0.0).collect()
    }

    /// `neighbors(i)` for every row.
    pub fn all_neighbors(&self) -> Vec<Neighbors> {
        (0..self.len()).map(|i| self.neighbors(i)).collect()
    }

    /// Transposing a link matrix yields another link matrix: the neighbor
    /// query now answers "who points at i".
    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose(),
        }
    }

    /// See [`Matrix::normalize`].
    pub fn normalize(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.normalize()?,
        })
    }

    pub fn as_matrix(&self) -> &Matrix {
        &self.inner
    }
}

impl std::ops::Index<(usize, usize)> for LinkMatrix {
    type Output = f64;

    fn index(&self, idx: (usize, usize)) -> &f64 {
        &self.inner[idx]
    }
}

impl std::ops::IndexMut<(usize, usize)> for LinkMatrix {
    fn index_mut(&mut self, idx: (usize, usize)) -> &mut f64 {
        &mut self.inner[idx]
    }
}

// ============================================================================
// MappedLinkMatrix
// ============================================================================

/// A [`LinkMatrix`] plus a total bijection between matrix indices and terms:
/// index `i` corresponds to `terms()[i]`, fixed at construction.
///
/// Only the matrix and the term list are serialized; the term→index map is
/// rebuilt on deserialization so lookups keep working.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "MappedLinkMatrixData")]
pub struct MappedLinkMatrix {
    matrix: LinkMatrix,
    terms: Vec<Node>,
    #[serde(skip)]
    positions: HashMap<NodeId, usize>,
}

/// Wire form of [`MappedLinkMatrix`]: the derived fields stay out.
#[derive(Deserialize)]
struct MappedLinkMatrixData {
    matrix: LinkMatrix,
    terms: Vec<Node>,
}

impl From<MappedLinkMatrixData> for MappedLinkMatrix {
    fn from(data: MappedLinkMatrixData) -> Self {
        Self::with_matrix(data.matrix, data.terms)
    }
}

impl MappedLinkMatrix {
    /// A zero-filled matrix sized to the given terms, in the given order.
    pub fn new(terms: Vec<Node>) -> Self {
        let positions = Self::index_terms(&terms);
        Self {
            matrix: LinkMatrix::new(terms.len()),
            terms,
            positions,
        }
    }

    /// Pair an existing matrix with a term list. The lengths must agree.
    pub fn with_matrix(matrix: LinkMatrix, terms: Vec<Node>) -> Self {
        assert_eq!(
            matrix.len(),
            terms.len(),
            "term list must match matrix size"
        );
        let positions = Self::index_terms(&terms);
        Self {
            matrix,
            terms,
            positions,
        }
    }

    fn index_terms(terms: &[Node]) -> HashMap<NodeId, usize> {
        terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// The index that corresponds to a term; [`Error::UnknownTerm`] when the
    /// term is not part of the mapping.
    pub fn get_term_position(&self, term: &NodeId) -> Result<usize> {
        self.positions
            .get(term)
            .copied()
            .ok_or_else(|| Error::UnknownTerm(term.to_string()))
    }

    /// The ordered term list; `terms()[i]` labels row/column `i`.
    pub fn terms(&self) -> &[Node] {
        &self.terms
    }

    pub fn link_matrix(&self) -> &LinkMatrix {
        &self.matrix
    }

    pub fn link_matrix_mut(&mut self) -> &mut LinkMatrix {
        &mut self.matrix
    }
}

impl std::ops::Index<(usize, usize)> for MappedLinkMatrix {
    type Output = f64;

    fn index(&self, idx: (usize, usize)) -> &f64 {
        &self.matrix[idx]
    }
}

impl std::ops::IndexMut<(usize, usize)> for MappedLinkMatrix {
    fn index_mut(&mut self, idx: (usize, usize)) -> &mut f64 {
        &mut self.matrix[idx]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> LinkMatrix {
        // The canonical 5-node fixture: 0→1, 1→2, 2→3 (weight 2), 4→3, 3→0.
        let mut m = LinkMatrix::new(5);
        m[(0, 1)] = 1.0;
        m[(1, 2)] = 1.0;
        m[(2, 3)] = 2.0;
        m[(4, 3)] = 1.0;
        m[(3, 0)] = 1.0;
        m
    }

    #[test]
    fn test_sums_and_counts() {
        let m = sample();
        assert_eq!(m.rowsum(2), 2.0);
        assert_eq!(m.colsum(3), 3.0);
        assert_eq!(m.row_nonzero(2), 1);
        assert_eq!(m.col_nonzero(3), 2);
        assert_eq!(m.max(), 2.0);
    }

    #[test]
    fn test_normalize_divides_by_global_max() {
        let m = sample().normalize().unwrap();
        assert_eq!(m.max(), 1.0);
        assert_eq!(m[(2, 3)], 1.0);
        assert_eq!(m[(0, 1)], 0.5);
        assert_eq!(m[(2, 2)], 0.0);
    }

    #[test]
    fn test_normalize_all_zero_fails_distinctly() {
        let m = LinkMatrix::new(3);
        assert!(matches!(m.normalize(), Err(Error::NoLinks(_))));
    }

    #[test]
    fn test_neighbors() {
        let m = sample();
        assert_eq!(m.neighbors(2).as_slice(), &[3]);
        assert_eq!(m.neighbors(3).as_slice(), &[0]);
        assert!(m.neighbors(3).len() == 1);
        let all = m.all_neighbors();
        assert_eq!(all.len(), 5);
        assert!(all[1].as_slice() == &[2]);
    }

    #[test]
    fn test_transpose_keeps_neighbor_query() {
        let t = sample().transpose();
        // In the transpose, "neighbors of 3" are the nodes that point at 3.
        let mut incoming: Vec<usize> = t.neighbors(3).into_vec();
        incoming.sort_unstable();
        assert_eq!(incoming, vec![2, 4]);
        assert_eq!(t[(3, 2)], 2.0);
    }

    #[test]
    fn test_mapped_term_lookup() {
        let terms = vec![
            Node::new("a", "a", 1.0),
            Node::new("b", "b", 1.0),
            Node::new("c", "c", 1.0),
        ];
        let m = MappedLinkMatrix::new(terms);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get_term_position(&NodeId::from("b")).unwrap(), 1);
        assert!(matches!(
            m.get_term_position(&NodeId::from("zz")),
            Err(Error::UnknownTerm(_))
        ));
    }

    #[test]
    fn test_mapped_round_trip_rebuilds_lookup() {
        let terms = vec![Node::new("a", "a", 1.0), Node::new("b", "b", 1.0)];
        let mut m = MappedLinkMatrix::new(terms);
        m[(0, 1)] = 2.0;

        let json = serde_json::to_string(&m).unwrap();
        let decoded: MappedLinkMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded[(0, 1)], 2.0);
        // The term→index map must survive the round trip.
        assert_eq!(decoded.get_term_position(&NodeId::from("a")).unwrap(), 0);
        assert_eq!(decoded.get_term_position(&NodeId::from("b")).unwrap(), 1);
    }

    #[test]
    fn test_empty_matrix() {
        let m = Matrix::new(0);
        assert!(m.is_empty());
        assert_eq!(m.max(), 0.0);
    }
}
