//! GeoKG Graph - Knowledge graph store
//!
//! A directed multi-edge graph keyed by `type:canonical_name` node
//! identifiers. Nodes carry their mentions; edges carry a relation kind and
//! a weight. Several edges of different kinds may join the same pair.
//!
//! The store is append-only within a build: nodes and edges are never
//! removed or rewritten, only created, extended with mentions, or weighted up.

use geokg_core::{EntityRef, Mention, RelationKind};

pub mod catalog;
pub mod snapshot;
pub mod store;
pub mod summary;

pub use catalog::{CatalogBucket, EntityCatalog};
pub use snapshot::{GraphSnapshot, SnapshotEdge, SnapshotNode};
pub use store::{EntityNode, KnowledgeGraph, Neighbor, NodeId, RelationEdge};
pub use summary::render_summary;

/// Trait for knowledge graph stores
pub trait GraphStore {
    /// Create the node on first sight, then append the mention; idempotent on identity
    fn add_or_update_node(
        &mut self,
        entity: &EntityRef,
        surface_form: Option<&str>,
        mention: Mention,
    ) -> NodeId;

    /// Create the `(source, target, kind)` edge with weight 1 or increment it.
    ///
    /// A no-op returning `false` when either endpoint is absent.
    fn add_or_increment_edge(&mut self, source: NodeId, target: NodeId, kind: RelationKind) -> bool;

    /// All incident edges, heaviest first, ties in insertion order
    fn neighbors(&self, node: NodeId) -> Vec<Neighbor>;

    /// Number of distinct edges touching a node
    fn degree(&self, node: NodeId) -> usize;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
