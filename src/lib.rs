//! # linkrank — Importance Ranking for Weighted Concept Graphs
//!
//! Computes importance scores for concepts in a weighted graph built from
//! co-occurrence data, using iterative link-analysis algorithms and
//! graph-distance metrics.
//!
//! ## Design Principles
//!
//! 1. **One consolidated link per node pair**: the graph forces explicit
//!    resolution of duplicate edges through a [`CollisionPolicy`]
//! 2. **Clean DTOs**: `Node`, `Link`, `EdgeRecord` cross all boundaries
//! 3. **Shared convergence harness**: every ranker is a step rule plugged
//!    into the same fixed-point driver
//! 4. **Rankers own nothing**: they read a matrix and return a score vector
//!
//! ## Quick Start
//!
//! ```rust
//! use linkrank::{Graph, Link, Node, PageRanker, MappedRanker, RankerOptions};
//!
//! # fn example() -> linkrank::Result<()> {
//! let mut graph = Graph::new();
//! let heart = Node::new("C0018787", "Heart", 1.0);
//! let aorta = Node::new("C0003483", "Aorta", 1.0);
//! graph.add_relationship(Link::directed(heart, aorta, 1.0));
//!
//! let matrix = graph.as_mapped_link_matrix();
//! let mut ranker = MappedRanker::new(PageRanker::new(RankerOptions::default()));
//! for (term, score) in ranker.evaluate(&matrix)?.iter() {
//!     println!("{}\t{score:1.7}", term.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Rankers
//!
//! | Ranker | Update rule | Returns |
//! |--------|-------------|---------|
//! | [`PageRanker`] | damped propagation over connectivity | score vector |
//! | [`WeightedPageRanker`] | damped propagation scaled by edge weight | score vector |
//! | [`TextRanker`] | Mihalcea's TextRank on symmetric graphs | score vector |
//! | [`HitsRanker`] | Kleinberg's authority/hub iteration | authority + hub vectors |
//! | [`CombinedHitsRanker`] | HITS folded by a combination function | score vector |
//! | [`SpreadingActivation`] | seed-driven accumulation with overflow guard | score vector |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod matrix;
pub mod graph;
pub mod distance;
pub mod search;
pub mod ranker;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Link, LinkKey, LinkKind, Node, NodeId};

// ============================================================================
// Re-exports: Matrices
// ============================================================================

pub use matrix::{LinkMatrix, MappedLinkMatrix, Matrix};

// ============================================================================
// Re-exports: Graph
// ============================================================================

pub use graph::{CollisionPolicy, EdgeRecord, Graph, GraphMeasures, KeepStrongest};

// ============================================================================
// Re-exports: Distance & search
// ============================================================================

pub use distance::DistanceMatrix;
pub use search::bidirectional_search;

// ============================================================================
// Re-exports: Rankers
// ============================================================================

pub use ranker::{
    CombinedHitsRanker, HitsRanker, HitsScores, MappedRanker, PageRanker,
    RankedTerms, Ranker, RankerOptions, RankerStats, SpreadingActivation,
    TextRanker, WeightedPageRanker,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A ranker or distance computation was handed a zero-size matrix.
    #[error("empty matrix: {0}")]
    EmptyMatrix(String),

    /// A graph-level aggregate was requested on a graph with no nodes or
    /// no links.
    #[error("empty graph: {0}")]
    EmptyGraph(String),

    /// The matrix has no nonzero cells, so normalization (and therefore
    /// every ranker) is undefined. Distinct from [`Error::EmptyMatrix`]:
    /// the matrix has rows, just no links.
    #[error("no links: {0}")]
    NoLinks(String),

    /// Iteration produced an all-zero score vector; the ranking collapsed
    /// and cannot be normalized.
    #[error("degenerate ranking: {0}")]
    DegenerateRanking(String),

    /// A term was requested that the mapped matrix does not contain.
    #[error("unknown term: {0}")]
    UnknownTerm(String),

    /// A node index fell outside the matrix.
    #[error("node index {index} out of bounds for matrix of size {size}")]
    NodeOutOfBounds { index: usize, size: usize },

    /// A relative centrality divides by a node's total distance, which was
    /// zero (a node with no pairs to relate to).
    #[error("node {node} has zero total distance; relative centrality is undefined")]
    ZeroDistance { node: usize },

    /// The spreading-activation seed vector does not match the matrix size.
    #[error("seed vector has {got} entries but the matrix has {expected} terms")]
    SeedMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
