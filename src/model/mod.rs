//! # Concept Graph Model
//!
//! Clean DTOs for the link-node graph: a [`Node`] is a concept with an
//! opaque identity, a [`Link`] is a weighted edge between two nodes.
//! These types cross every boundary: builders → graph → matrices → rankers.
//!
//! Design rule: no matrix types, no ranker types here. This module is pure
//! data — no I/O, no iteration state.

pub mod node;
pub mod link;

pub use node::{Node, NodeId};
pub use link::{Link, LinkKey, LinkKind};
