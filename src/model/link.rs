//! Link (weighted edge) in the concept graph.
//!
//! Direction is encoded in the sign of the strength handed to the
//! constructor: a negative strength means the link really points the other
//! way, so the endpoints are swapped and the absolute value is kept. An
//! adirectional link has no preferred direction and always stores the
//! absolute value without swapping.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Node, NodeId};

/// Whether a link's endpoint order carries meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    Directed,
    Adirectional,
}

/// Deduplication identity of a link.
///
/// Two directed links match only when their endpoints match in order; two
/// adirectional links match in either order. Kind is part of the key, so a
/// directed and an adirectional link between the same nodes never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkKey {
    kind: LinkKind,
    first: NodeId,
    second: NodeId,
}

/// A weighted edge between two nodes.
///
/// Endpoints are shared [`Arc`]s so that a consolidated graph can point every
/// link at one canonical `Node` per id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    node1: Arc<Node>,
    node2: Arc<Node>,
    weight: f64,
    name: Option<String>,
    kind: LinkKind,
}

impl Link {
    /// Build a directed link. A negative strength flips the direction:
    /// `Link::directed(a, b, -w)` is the same link as `Link::directed(b, a, w)`.
    pub fn directed(node1: Node, node2: Node, strength: f64) -> Self {
        Self::directed_named(node1, node2, strength, None)
    }

    pub fn directed_named(
        node1: Node,
        node2: Node,
        strength: f64,
        name: Option<String>,
    ) -> Self {
        let (node1, node2, weight) = if strength >= 0.0 {
            (node1, node2, strength)
        } else {
            (node2, node1, -strength)
        };
        Self {
            node1: Arc::new(node1),
            node2: Arc::new(node2),
            weight,
            name,
            kind: LinkKind::Directed,
        }
    }

    /// Build an adirectional link. The sign of the strength is ignored and
    /// the endpoints keep the order they were given in.
    pub fn adirectional(node1: Node, node2: Node, strength: f64) -> Self {
        Self::adirectional_named(node1, node2, strength, None)
    }

    pub fn adirectional_named(
        node1: Node,
        node2: Node,
        strength: f64,
        name: Option<String>,
    ) -> Self {
        Self {
            node1: Arc::new(node1),
            node2: Arc::new(node2),
            weight: strength.abs(),
            name,
            kind: LinkKind::Adirectional,
        }
    }

    pub fn node1(&self) -> &Arc<Node> {
        &self.node1
    }

    pub fn node2(&self) -> &Arc<Node> {
        &self.node2
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Re-assign the weight. On a directed link a negative value flips the
    /// endpoints and stores the absolute value; on an adirectional link the
    /// absolute value is stored and the endpoints stay put.
    pub fn set_weight(&mut self, value: f64) {
        match self.kind {
            LinkKind::Directed => {
                if value < 0.0 {
                    std::mem::swap(&mut self.node1, &mut self.node2);
                    self.weight = -value;
                } else {
                    self.weight = value;
                }
            }
            LinkKind::Adirectional => {
                self.weight = value.abs();
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn is_adirectional(&self) -> bool {
        self.kind == LinkKind::Adirectional
    }

    /// The deduplication key: ordered endpoints for directed links, sorted
    /// endpoints for adirectional ones.
    pub fn key(&self) -> LinkKey {
        let (a, b) = (self.node1.id.clone(), self.node2.id.clone());
        let (first, second) = match self.kind {
            LinkKind::Directed => (a, b),
            LinkKind::Adirectional => {
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            }
        };
        LinkKey {
            kind: self.kind,
            first,
            second,
        }
    }

    /// Rewrite the endpoints to canonical shared instances. Used by graph
    /// consolidation; the ids must match the current endpoints.
    pub(crate) fn rebind(&mut self, node1: Arc<Node>, node2: Arc<Node>) {
        debug_assert_eq!(node1.id, self.node1.id);
        debug_assert_eq!(node2.id, self.node2.id);
        self.node1 = node1;
        self.node2 = node2;
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Link {}

impl std::hash::Hash for Link {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arrow = match self.kind {
            LinkKind::Directed => format!("--{:1.7}-->", self.weight),
            LinkKind::Adirectional => format!("=={:1.7}==", self.weight),
        };
        match &self.name {
            Some(name) => write!(f, "<Link {name}: {} {arrow} {}>", self.node1, self.node2),
            None => write!(f, "<Link: {} {arrow} {}>", self.node1, self.node2),
        }
    }
}
