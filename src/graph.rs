//! Mutable link-node graph with deferred deduplication.
//!
//! There can be only one consolidated link per node pair (per unordered pair
//! for adirectional links). Duplicates accumulate in a temporary multimap and
//! are collapsed by [`Graph::consolidate`] through a pluggable
//! [`CollisionPolicy`] — the restriction forces explicit resolution of
//! multiple links instead of making assumptions.
//!
//! Consolidation also rebuilds the canonical node table so that every link in
//! the graph shares one `Arc<Node>` per node id, no matter how many
//! independently built `Node` values went in.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::distance::DistanceMatrix;
use crate::matrix::MappedLinkMatrix;
use crate::model::{Link, LinkKey, Node, NodeId};
use crate::{Error, Result};

// ============================================================================
// Collision policy
// ============================================================================

/// Strategy for collapsing several links with the same identity into one.
///
/// Reasonable policies include keeping the strongest link or summing the
/// weights. `candidates` is never empty and preserves insertion order.
pub trait CollisionPolicy {
    fn resolve(&self, candidates: Vec<Link>) -> Link;
}

/// Default policy: the highest-weight link wins. Exact-weight ties keep the
/// earliest-seen link, so resolution is deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepStrongest;

impl CollisionPolicy for KeepStrongest {
    fn resolve(&self, candidates: Vec<Link>) -> Link {
        candidates
            .into_iter()
            .max_by(|a, b| {
                a.weight()
                    .total_cmp(&b.weight())
                    // max_by keeps the last maximum; prefer the first-seen.
                    .then(std::cmp::Ordering::Greater)
            })
            .expect("collision candidates are never empty")
    }
}

// ============================================================================
// Edge interchange record
// ============================================================================

/// The flat edge form produced by external graph builders and consumed by
/// [`Graph::from_edges`]. Round-trips node id/name/weight and edge
/// weight/name through serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub node1_id: String,
    pub node1_name: String,
    pub node1_weight: f64,
    pub node2_id: String,
    pub node2_name: String,
    pub node2_weight: f64,
    pub weight: f64,
    pub name: Option<String>,
    pub directed: bool,
}

// ============================================================================
// Graph measures
// ============================================================================

/// Aggregate metrics over a consolidated graph, including the
/// distance-derived centrality family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMeasures {
    pub nodes: usize,
    pub links: usize,
    pub average_node_weight: f64,
    pub average_link_weight: f64,
    /// Links per node.
    pub link_degree: f64,
    pub relative_out_centrality: f64,
    pub relative_in_centrality: f64,
    pub stratum: f64,
    pub compactness: f64,
}

// ============================================================================
// Graph
// ============================================================================

/// A link-node weighted graph. See the module docs for the consolidation
/// contract.
pub struct Graph {
    /// Consolidated links, in first-appearance order of their identity key.
    links: Vec<Link>,
    link_index: HashMap<LinkKey, usize>,
    /// Pre-consolidation multimap: identity key → colliding links.
    pending: HashMap<LinkKey, Vec<Link>>,
    pending_order: Vec<LinkKey>,
    /// Canonical node instances, one per id, rebuilt on consolidation.
    nodes: HashMap<NodeId, Arc<Node>>,
    policy: Box<dyn CollisionPolicy + Send + Sync>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_policy(Box::new(KeepStrongest))
    }

    pub fn with_policy(policy: Box<dyn CollisionPolicy + Send + Sync>) -> Self {
        Self {
            links: Vec::new(),
            link_index: HashMap::new(),
            pending: HashMap::new(),
            pending_order: Vec::new(),
            nodes: HashMap::new(),
            policy,
        }
    }

    /// Build a graph from builder output. The graph is left unconsolidated;
    /// any read operation consolidates it on demand.
    pub fn from_edges(edges: impl IntoIterator<Item = EdgeRecord>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            let node1 = Node::new(edge.node1_id, edge.node1_name, edge.node1_weight);
            let node2 = Node::new(edge.node2_id, edge.node2_name, edge.node2_weight);
            let link = if edge.directed {
                Link::directed_named(node1, node2, edge.weight, edge.name)
            } else {
                Link::adirectional_named(node1, node2, edge.weight, edge.name)
            };
            graph.add_relationship(link);
        }
        graph
    }

    /// Stage a link for inclusion. Deduplication is deferred to
    /// [`Graph::consolidate`].
    pub fn add_relationship(&mut self, link: Link) {
        let key = link.key();
        let bucket = self.pending.entry(key.clone()).or_default();
        if bucket.is_empty() {
            self.pending_order.push(key);
        }
        bucket.push(link);
    }

    /// Whether links are still waiting in temporary storage.
    pub fn needs_consolidation(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush the temporary store into the consolidated link set, resolving
    /// collisions through the policy, then rebuild the canonical node table
    /// and point every link at the canonical instances.
    ///
    /// Calling this twice in a row is the same as calling it once.
    pub fn consolidate(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        debug!(
            pending = self.pending_order.len(),
            consolidated = self.links.len(),
            "consolidating graph"
        );
        for key in std::mem::take(&mut self.pending_order) {
            let mut candidates = self
                .pending
                .remove(&key)
                .expect("pending order and pending map stay in sync");
            match self.link_index.get(&key) {
                Some(&at) => {
                    // A link with this identity survived an earlier pass;
                    // it competes with the newcomers.
                    candidates.insert(0, self.links[at].clone());
                    self.links[at] = self.policy.resolve(candidates);
                }
                None => {
                    let resolved = self.policy.resolve(candidates);
                    self.link_index.insert(key, self.links.len());
                    self.links.push(resolved);
                }
            }
        }
        self.rebuild_node_table();
    }

    /// Re-derive the id → canonical-node table from the consolidated links
    /// and rewrite every link endpoint to the canonical `Arc`.
    fn rebuild_node_table(&mut self) {
        self.nodes.clear();
        for link in &self.links {
            for node in [link.node1(), link.node2()] {
                self.nodes
                    .entry(node.id.clone())
                    .or_insert_with(|| Arc::clone(node));
            }
        }
        for link in &mut self.links {
            let n1 = Arc::clone(&self.nodes[&link.node1().id]);
            let n2 = Arc::clone(&self.nodes[&link.node2().id]);
            link.rebind(n1, n2);
        }
        trace!(nodes = self.nodes.len(), "canonical node table rebuilt");
    }

    fn consolidate_if_needed(&mut self) {
        if self.needs_consolidation() {
            debug!("graph has pending relationships; consolidating now");
            self.consolidate();
        }
    }

    /// The consolidated links. Consolidates first if needed.
    pub fn relationships(&mut self) -> &[Link] {
        self.consolidate_if_needed();
        &self.links
    }

    /// Number of consolidated links. Consolidates first if needed.
    pub fn link_count(&mut self) -> usize {
        self.relationships().len()
    }

    /// Number of distinct nodes. Consolidates first if needed.
    pub fn node_count(&mut self) -> usize {
        self.consolidate_if_needed();
        self.nodes.len()
    }

    // ========================================================================
    // Matrix conversion
    // ========================================================================

    /// Turn the graph into a [`MappedLinkMatrix`]: terms are the distinct
    /// nodes in first-appearance order, `m[(i, j)]` the weight of the link
    /// terms\[i\] → terms\[j\]. Adirectional links are written into both
    /// mirrored cells. An empty graph yields a zero-size matrix.
    pub fn as_mapped_link_matrix(&mut self) -> MappedLinkMatrix {
        self.consolidate_if_needed();
        trace!(links = self.links.len(), "building mapped link matrix");

        let mut terms: Vec<Node> = Vec::new();
        let mut seen: HashMap<NodeId, usize> = HashMap::new();
        for link in &self.links {
            for node in [link.node1(), link.node2()] {
                if !seen.contains_key(&node.id) {
                    seen.insert(node.id.clone(), terms.len());
                    terms.push(Node::clone(node));
                }
            }
        }

        let mut matrix = MappedLinkMatrix::new(terms);
        for link in &self.links {
            let from = seen[&link.node1().id];
            let to = seen[&link.node2().id];
            matrix[(from, to)] = link.weight();
            if link.is_adirectional() {
                matrix[(to, from)] = link.weight();
            }
        }
        matrix
    }

    // ========================================================================
    // Aggregate measures
    // ========================================================================

    /// Compute the graph-level metrics.
    ///
    /// Fails with [`Error::EmptyGraph`] when the graph has no nodes or no
    /// links — every metric here divides by one count or the other.
    pub fn compute_measures(&mut self) -> Result<GraphMeasures> {
        self.consolidate_if_needed();
        debug!("computing graph measures");
        let links = self.links.len();
        let nodes = self.nodes.len();
        if links == 0 || nodes == 0 {
            return Err(Error::EmptyGraph(
                "graph measures are undefined without nodes and links".into(),
            ));
        }

        let node_weight_total: f64 = self.nodes.values().map(|n| n.weight).sum();
        let link_weight_total: f64 = self.links.iter().map(Link::weight).sum();

        let distances = DistanceMatrix::from_link_matrix(
            self.as_mapped_link_matrix().link_matrix(),
            None,
        );
        let n = distances.len();
        let mut avg_out = 0.0;
        let mut avg_in = 0.0;
        for i in 0..n {
            avg_out += distances.relative_out_centrality(i)?;
            avg_in += distances.relative_in_centrality(i)?;
        }
        avg_out /= n as f64;
        avg_in /= n as f64;

        Ok(GraphMeasures {
            nodes,
            links,
            average_node_weight: node_weight_total / nodes as f64,
            average_link_weight: link_weight_total / links as f64,
            link_degree: links as f64 / nodes as f64,
            relative_out_centrality: avg_out,
            relative_in_centrality: avg_in,
            stratum: distances.stratum(),
            compactness: distances.compactness(),
        })
    }

    // ========================================================================
    // Interchange exports
    // ========================================================================

    /// The consolidated links as flat [`EdgeRecord`]s. Together with
    /// [`Graph::from_edges`] this round-trips node id/name/weight and link
    /// weight/name.
    pub fn edge_records(&mut self) -> Vec<EdgeRecord> {
        self.consolidate_if_needed();
        self.links
            .iter()
            .map(|link| EdgeRecord {
                node1_id: link.node1().id.0.clone(),
                node1_name: link.node1().name.clone(),
                node1_weight: link.node1().weight,
                node2_id: link.node2().id.0.clone(),
                node2_name: link.node2().name.clone(),
                node2_weight: link.node2().weight,
                weight: link.weight(),
                name: link.name().map(str::to_owned),
                directed: !link.is_adirectional(),
            })
            .collect()
    }

    /// Edge-list export for LGL (the Large Graph Layout tool). Node names
    /// are sanitized (LGL is picky) and self-edges are skipped (LGL can't
    /// handle them).
    pub fn to_ncol(&mut self) -> String {
        const UNWANTED: &str = " -[]{}()*&^%$#@/?!\\|=+\"';:,.<>";
        fn clean(name: &str) -> String {
            name.chars()
                .map(|c| if UNWANTED.contains(c) { '_' } else { c })
                .collect()
        }

        self.consolidate_if_needed();
        let mut lines = Vec::new();
        for link in &self.links {
            let node1 = clean(&link.node1().name);
            let node2 = clean(&link.node2().name);
            if node1 == node2 {
                continue;
            }
            lines.push(format!("{node1} {node2} {:1.7}", link.weight()));
        }
        lines.join("\n")
    }

    /// Graphviz export. Directed links render as `->`; adirectional links
    /// keep the digraph arrow syntax but drop the arrowhead.
    pub fn to_dot(&mut self) -> String {
        fn quote(name: &str) -> String {
            format!("\"{}\"", name.replace('"', "\\\""))
        }

        self.consolidate_if_needed();
        let mut out = String::from("digraph g {\n");
        for link in &self.links {
            let mut attrs = vec![format!("weight={:1.7}", link.weight())];
            if let Some(name) = link.name() {
                attrs.push(format!("label={}", quote(name)));
            }
            if link.is_adirectional() {
                attrs.push("dir=none".into());
            }
            out.push_str(&format!(
                "  {} -> {} [{}];\n",
                quote(&link.node1().name),
                quote(&link.node2().name),
                attrs.join(", "),
            ));
        }
        out.push_str("}\n");
        out
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("links", &self.links)
            .field("pending", &self.pending.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, weight: f64) -> Node {
        Node::new(id, id, weight)
    }

    #[test]
    fn test_consolidation_keeps_strongest() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 1.0));
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 3.0));
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 2.0));
        g.consolidate();
        let rels = g.relationships();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].weight(), 3.0);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 1.0));
        g.add_relationship(Link::directed(node("b", 1.0), node("c", 1.0), 2.0));
        g.consolidate();
        let first: Vec<_> = g.relationships().to_vec();
        g.consolidate();
        assert_eq!(g.relationships(), first.as_slice());
    }

    #[test]
    fn test_late_adds_merge_with_consolidated_set() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 1.0));
        g.consolidate();
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 5.0));
        g.consolidate();
        let rels = g.relationships();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].weight(), 5.0);
    }

    #[test]
    fn test_canonical_node_sharing() {
        let mut g = Graph::new();
        // Two independently built "b" nodes with different weights.
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 1.0));
        g.add_relationship(Link::directed(Node::new("b", "b", 7.0), node("c", 1.0), 1.0));
        g.consolidate();
        let rels = g.relationships();
        let b_in_first = rels[0].node2();
        let b_in_second = rels[1].node1();
        assert!(Arc::ptr_eq(b_in_first, b_in_second));
    }

    #[test]
    fn test_directed_opposites_stay_separate() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 1.0));
        g.add_relationship(Link::directed(node("b", 1.0), node("a", 1.0), 2.0));
        assert_eq!(g.link_count(), 2);
    }

    #[test]
    fn test_adirectional_opposites_collapse() {
        let mut g = Graph::new();
        g.add_relationship(Link::adirectional(node("a", 1.0), node("b", 1.0), 1.0));
        g.add_relationship(Link::adirectional(node("b", 1.0), node("a", 1.0), 2.0));
        assert_eq!(g.link_count(), 1);
    }

    #[test]
    fn test_matrix_conversion_counts_and_weights() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 1.0), node("b", 1.0), 1.0));
        g.add_relationship(Link::adirectional(node("b", 1.0), node("c", 1.0), 2.0));
        let m = g.as_mapped_link_matrix();
        assert_eq!(m.len(), g.node_count());

        // Weight sum doubles the adirectional link.
        let mut total = 0.0;
        for i in 0..m.len() {
            for j in 0..m.len() {
                total += m[(i, j)];
            }
        }
        assert_eq!(total, 1.0 + 2.0 * 2.0);

        let b = m.get_term_position(&NodeId::from("b")).unwrap();
        let c = m.get_term_position(&NodeId::from("c")).unwrap();
        assert_eq!(m[(b, c)], 2.0);
        assert_eq!(m[(c, b)], 2.0);
    }

    #[test]
    fn test_empty_graph_yields_zero_size_matrix() {
        let mut g = Graph::new();
        let m = g.as_mapped_link_matrix();
        assert!(m.is_empty());
        assert!(m.terms().is_empty());
    }

    #[test]
    fn test_measures_fail_on_empty_graph() {
        let mut g = Graph::new();
        assert!(matches!(g.compute_measures(), Err(Error::EmptyGraph(_))));
    }

    #[test]
    fn test_measures_reject_lone_self_loop() {
        // One node, one self-loop: the centrality divides by a zero total
        // distance and must fail loudly instead of returning NaN.
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 1.0), node("a", 1.0), 1.0));
        assert!(matches!(
            g.compute_measures(),
            Err(Error::ZeroDistance { node: 0 })
        ));
    }

    #[test]
    fn test_measures_basic_aggregates() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(node("a", 2.0), node("b", 4.0), 1.0));
        g.add_relationship(Link::directed(node("b", 4.0), node("c", 6.0), 3.0));
        let m = g.compute_measures().unwrap();
        assert_eq!(m.nodes, 3);
        assert_eq!(m.links, 2);
        assert_eq!(m.average_node_weight, 4.0);
        assert_eq!(m.average_link_weight, 2.0);
        assert_eq!(m.link_degree, 2.0 / 3.0);
    }

    #[test]
    fn test_ncol_skips_self_edges_and_sanitizes() {
        let mut g = Graph::new();
        g.add_relationship(Link::directed(
            Node::new("a", "Heart, left", 1.0),
            Node::new("b", "Aorta", 1.0),
            1.5,
        ));
        g.add_relationship(Link::directed(
            Node::new("c", "Self", 1.0),
            Node::new("c2", "Self", 1.0),
            1.0,
        ));
        let ncol = g.to_ncol();
        assert_eq!(ncol, "Heart__left Aorta 1.5000000");
    }

    #[test]
    fn test_dot_export_marks_adirectional() {
        let mut g = Graph::new();
        g.add_relationship(Link::adirectional(node("a", 1.0), node("b", 1.0), 1.0));
        let dot = g.to_dot();
        assert!(dot.starts_with("digraph g {"));
        assert!(dot.contains("dir=none"));
        assert!(dot.contains("weight=1.0000000"));
    }

    #[test]
    fn test_edge_record_round_trip() {
        let records = vec![
            EdgeRecord {
                node1_id: "a".into(),
                node1_name: "Alpha".into(),
                node1_weight: 0.25,
                node2_id: "b".into(),
                node2_name: "Beta".into(),
                node2_weight: 0.5,
                weight: 1.5,
                name: Some("co-occurs".into()),
                directed: true,
            },
            EdgeRecord {
                node1_id: "b".into(),
                node1_name: "Beta".into(),
                node1_weight: 0.5,
                node2_id: "c".into(),
                node2_name: "Gamma".into(),
                node2_weight: 0.75,
                weight: 2.0,
                name: None,
                directed: false,
            },
        ];
        let mut g = Graph::from_edges(records.clone());
        assert_eq!(g.edge_records(), records);
    }
}
