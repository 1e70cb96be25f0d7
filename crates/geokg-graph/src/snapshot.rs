//! JSON snapshot of a completed build
//!
//! Edges refer to their endpoints by node key, so a snapshot stays readable
//! on its own. Loading re-checks the store invariants.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{EntityNode, KnowledgeGraph, NodeId, RelationEdge};
use crate::GraphStore;
use geokg_core::{BuildInfo, GeoKgError, RelationKind, Result};

/// A node together with its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(flatten)]
    pub node: EntityNode,
}

/// An edge with key endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub weight: u32,
}

/// Serializable form of a [`KnowledgeGraph`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub info: BuildInfo,
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

impl GraphSnapshot {
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GeoKgError::InvalidSnapshot(e.to_string()))
    }
}

impl KnowledgeGraph {
    /// Capture nodes in creation order and edges in insertion order
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let key_of = |id: NodeId| self.node(id).map(EntityNode::key).unwrap_or_default();

        GraphSnapshot {
            info: self.info().clone(),
            nodes: self
                .nodes()
                .map(|(_, node)| SnapshotNode {
                    id: node.key(),
                    node: node.clone(),
                })
                .collect(),
            edges: self
                .edges()
                .iter()
                .map(|edge| SnapshotEdge {
                    source: key_of(edge.source),
                    target: key_of(edge.target),
                    kind: edge.kind,
                    weight: edge.weight,
                })
                .collect(),
        }
    }

    /// Rebuild a graph, rejecting anything the store could not have produced
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut graph = KnowledgeGraph::with_info(snapshot.info);
        let mut ids: HashMap<String, NodeId> = HashMap::with_capacity(snapshot.nodes.len());

        for SnapshotNode { id, node } in snapshot.nodes {
            if id != node.key() {
                return Err(GeoKgError::InvalidSnapshot(format!(
                    "node id '{id}' does not match '{}'",
                    node.key()
                )));
            }
            let node_id = graph.restore_node(node)?;
            ids.insert(id, node_id);
        }

        for edge in snapshot.edges {
            let endpoint = |key: &str| {
                ids.get(key).copied().ok_or_else(|| {
                    GeoKgError::InvalidSnapshot(format!("edge refers to unknown node '{key}'"))
                })
            };
            graph.restore_edge(RelationEdge {
                source: endpoint(&edge.source)?,
                target: endpoint(&edge.target)?,
                kind: edge.kind,
                weight: edge.weight,
            })?;
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            build_id = %graph.info().build_id,
            "Loaded graph snapshot"
        );
        Ok(graph)
    }

    pub fn to_json_string(&self) -> Result<String> {
        self.to_snapshot().to_json_string()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_snapshot(GraphSnapshot::from_json_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geokg_core::{EntityRef, EntityType, Mention};

    fn sample() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let platform = graph.add_or_update_node(
            &EntityRef::new(EntityType::Platform, "Moesian Platform"),
            Some("platformă moesică"),
            Mention::new("doc1", 1),
        );
        graph.add_or_update_node(
            &EntityRef::new(EntityType::Platform, "Moesian Platform"),
            Some("platformă moesică"),
            Mention::new("doc1", 4),
        );
        let zone = graph.add_or_update_node(
            &EntityRef::new(EntityType::Zone, "Eastern Zone"),
            None,
            Mention::new("doc2", 7),
        );
        graph.add_or_increment_edge(platform, zone, RelationKind::Contains);
        graph.add_or_increment_edge(platform, zone, RelationKind::CoMentioned);
        graph.add_or_increment_edge(platform, zone, RelationKind::CoMentioned);
        graph
    }

    #[test]
    fn test_snapshot_round_trip() {
        let graph = sample();
        let json = graph.to_json_string().unwrap();
        let loaded = KnowledgeGraph::from_json_str(&json).unwrap();

        assert_eq!(loaded.info(), graph.info());
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edges(), graph.edges());

        let platform = loaded.find_key("platform:Moesian Platform").unwrap();
        let node = loaded.node(platform).unwrap();
        assert_eq!(node.mention_count(), 2);
        assert_eq!(node.source_surface_form.as_deref(), Some("platformă moesică"));
        assert_eq!(loaded.neighbors(platform)[0].weight, 2);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = sample().to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["nodes"][0]["id"], "platform:Moesian Platform");
        assert_eq!(value["nodes"][0]["entity_type"], "platform");
        assert_eq!(value["nodes"][1]["source_surface_form"], serde_json::Value::Null);
        assert_eq!(value["edges"][0]["source"], "platform:Moesian Platform");
        assert_eq!(value["edges"][0]["kind"], "contains");
        assert!(value["info"]["build_id"].is_string());
    }

    #[test]
    fn test_rejects_unknown_endpoint() {
        let mut snapshot = sample().to_snapshot();
        snapshot.edges[0].target = "zone:Nowhere".to_string();

        let err = KnowledgeGraph::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, GeoKgError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_rejects_zero_weight() {
        let mut snapshot = sample().to_snapshot();
        snapshot.edges[1].weight = 0;
        assert!(KnowledgeGraph::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_duplicate_node() {
        let mut snapshot = sample().to_snapshot();
        let first = snapshot.nodes[0].clone();
        snapshot.nodes.push(first);
        assert!(KnowledgeGraph::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_rejects_mismatched_id() {
        let mut snapshot = sample().to_snapshot();
        snapshot.nodes[1].id = "rock:Eastern Zone".to_string();
        assert!(KnowledgeGraph::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = KnowledgeGraph::from_json_str("{\"nodes\": 3}").unwrap_err();
        assert!(matches!(err, GeoKgError::InvalidSnapshot(_)));
    }
}
