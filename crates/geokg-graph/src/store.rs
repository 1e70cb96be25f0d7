//! Arena-backed graph store
//!
//! Nodes live in a dense vector indexed by [`NodeId`]. Edges live in an
//! insertion-ordered vector with a hash index on `(source, target, kind)`,
//! and every node keeps the indices of its incident edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::GraphStore;
use geokg_core::{node_key, BuildInfo, EntityRef, EntityType, GeoKgError, Mention, RelationKind, Result};

// ============================================================================
// Graph elements
// ============================================================================

/// Dense node identifier, assigned in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity and every place it was mentioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    pub entity_type: EntityType,

    /// Stable (English) name
    pub canonical_name: String,

    /// First surface form seen; absent for entities supplied by ingestion
    pub source_surface_form: Option<String>,

    /// Mentions in the order they were recorded
    pub mentions: Vec<Mention>,
}

impl EntityNode {
    /// `type:canonical_name`
    pub fn key(&self) -> String {
        node_key(self.entity_type, &self.canonical_name)
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.canonical_name.clone())
    }

    pub fn mention_count(&self) -> usize {
        self.mentions.len()
    }

    pub fn has_mention(&self, mention: &Mention) -> bool {
        self.mentions.contains(mention)
    }
}

/// A weighted, typed edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: RelationKind,
    pub weight: u32,
}

/// An edge seen from one of its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    /// The other endpoint
    pub node: NodeId,
    pub kind: RelationKind,
    pub weight: u32,
    /// Whether the edge points away from the node it was queried for
    pub outgoing: bool,
}

// ============================================================================
// Knowledge graph
// ============================================================================

/// All nodes and edges of one build
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    info: BuildInfo,
    nodes: Vec<EntityNode>,
    node_index: HashMap<EntityRef, NodeId>,
    edges: Vec<RelationEdge>,
    edge_index: HashMap<(NodeId, NodeId, RelationKind), usize>,
    /// Incident edge indices per node, ascending
    incident: Vec<Vec<usize>>,
}

impl KnowledgeGraph {
    /// Create an empty graph stamped with a fresh build id
    pub fn new() -> Self {
        Self::with_info(BuildInfo::new())
    }

    /// Create an empty graph for a given build
    pub fn with_info(info: BuildInfo) -> Self {
        Self {
            info,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            incident: Vec::new(),
        }
    }

    pub fn info(&self) -> &BuildInfo {
        &self.info
    }

    pub fn node(&self, id: NodeId) -> Option<&EntityNode> {
        self.nodes.get(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Look up a node by identity
    pub fn find(&self, entity: &EntityRef) -> Option<NodeId> {
        self.node_index.get(entity).copied()
    }

    /// Look up a node by its `type:canonical_name` key
    pub fn find_key(&self, key: &str) -> Option<NodeId> {
        let (entity_type, name) = key.split_once(':')?;
        let entity_type: EntityType = entity_type.parse().ok()?;
        self.find(&EntityRef::new(entity_type, name))
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &EntityNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx as u32), node))
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[RelationEdge] {
        &self.edges
    }

    /// Highest-degree nodes, ties in creation order
    pub fn most_connected(&self, limit: usize) -> Vec<(NodeId, usize)> {
        let mut ranked: Vec<(NodeId, usize)> = self
            .nodes()
            .map(|(id, _)| (id, self.degree(id)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }

    fn push_node(&mut self, node: EntityNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.node_index.insert(node.entity(), id);
        self.nodes.push(node);
        self.incident.push(Vec::new());
        id
    }

    fn push_edge(&mut self, edge: RelationEdge) {
        let idx = self.edges.len();
        self.edge_index
            .insert((edge.source, edge.target, edge.kind), idx);
        self.incident[edge.source.index()].push(idx);
        self.incident[edge.target.index()].push(idx);
        self.edges.push(edge);
    }

    /// Re-insert a persisted node, keeping its mentions as recorded
    pub(crate) fn restore_node(&mut self, node: EntityNode) -> Result<NodeId> {
        if self.node_index.contains_key(&node.entity()) {
            return Err(GeoKgError::InvalidSnapshot(format!(
                "duplicate node '{}'",
                node.key()
            )));
        }
        Ok(self.push_node(node))
    }

    /// Re-insert a persisted edge, keeping its weight
    pub(crate) fn restore_edge(&mut self, edge: RelationEdge) -> Result<()> {
        if edge.weight == 0 {
            return Err(GeoKgError::InvalidSnapshot(format!(
                "edge {} -> {} has zero weight",
                edge.source, edge.target
            )));
        }
        if !self.contains(edge.source) || !self.contains(edge.target) || edge.source == edge.target {
            return Err(GeoKgError::InvalidSnapshot(format!(
                "edge {} -> {} has an invalid endpoint",
                edge.source, edge.target
            )));
        }
        if self
            .edge_index
            .contains_key(&(edge.source, edge.target, edge.kind))
        {
            return Err(GeoKgError::InvalidSnapshot(format!(
                "duplicate {} edge {} -> {}",
                edge.kind, edge.source, edge.target
            )));
        }
        self.push_edge(edge);
        Ok(())
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for KnowledgeGraph {
    fn add_or_update_node(
        &mut self,
        entity: &EntityRef,
        surface_form: Option<&str>,
        mention: Mention,
    ) -> NodeId {
        let id = match self.find(entity) {
            Some(id) => id,
            None => self.push_node(EntityNode {
                entity_type: entity.entity_type,
                canonical_name: entity.canonical_name.clone(),
                source_surface_form: surface_form.map(str::to_string),
                mentions: Vec::new(),
            }),
        };
        self.nodes[id.index()].mentions.push(mention);
        id
    }

    fn add_or_increment_edge(&mut self, source: NodeId, target: NodeId, kind: RelationKind) -> bool {
        if !self.contains(source) || !self.contains(target) {
            trace!(%source, %target, %kind, "Skipping edge with a missing endpoint");
            return false;
        }
        if source == target {
            trace!(%source, %kind, "Skipping self-loop");
            return false;
        }

        match self.edge_index.get(&(source, target, kind)) {
            Some(&idx) => self.edges[idx].weight += 1,
            None => self.push_edge(RelationEdge {
                source,
                target,
                kind,
                weight: 1,
            }),
        }
        true
    }

    fn neighbors(&self, node: NodeId) -> Vec<Neighbor> {
        let Some(incident) = self.incident.get(node.index()) else {
            return Vec::new();
        };

        let mut neighbors: Vec<Neighbor> = incident
            .iter()
            .map(|&idx| {
                let edge = &self.edges[idx];
                let outgoing = edge.source == node;
                Neighbor {
                    node: if outgoing { edge.target } else { edge.source },
                    kind: edge.kind,
                    weight: edge.weight,
                    outgoing,
                }
            })
            .collect();

        // Stable: equal weights keep insertion order
        neighbors.sort_by(|a, b| b.weight.cmp(&a.weight));
        neighbors
    }

    fn degree(&self, node: NodeId) -> usize {
        self.incident.get(node.index()).map_or(0, Vec::len)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
