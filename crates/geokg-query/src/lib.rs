//! GeoKG Query - Question answering over a finished knowledge graph
//!
//! The engine is read-only: it never mutates the graph, so one engine can
//! serve any number of lookups. Misses are answered with fixed text rather
//! than errors.

use serde::Serialize;
use tracing::debug;

use geokg_core::{BuildInfo, EntityType, QueryConfig, RelationKind};
use geokg_graph::{CatalogBucket, EntityCatalog, EntityNode, GraphStore, KnowledgeGraph, NodeId};

pub mod intent;

pub use intent::{analyze_question, QueryIntent};

// ============================================================================
// Canned responses
// ============================================================================

pub const UNIDENTIFIED_ENTITY: &str =
    "I couldn't identify the entity you're asking about. Try asking about platforms, zones, or rock types.";

pub const LOCATION_UNSUPPORTED: &str =
    "Location queries require more detailed field data. This feature will be enhanced when the 1979 field catalog is processed.";

pub const HELP: &str =
    "I can answer questions about platforms, zones, rocks, and their relationships. Try asking 'What is the Moesian Platform?' or 'List all platforms'.";

/// Sample questions for interactive help
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "List all platforms",
    "What is the Moesian Platform?",
    "Show me all rock types",
    "Tell me about sandstones",
];

// ============================================================================
// Results
// ============================================================================

/// An entity matching a search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMatch {
    pub key: String,
    pub name: String,
    pub source_name: Option<String>,
    pub entity_type: EntityType,
    pub mention_count: usize,
}

/// A neighbor of an entity, resolved to its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub key: String,
    pub name: String,
    pub entity_type: EntityType,
    pub kind: RelationKind,
    pub weight: u32,
    /// Whether the edge points from the queried entity to this one
    pub outgoing: bool,
}

/// Size and identity of the graph being queried
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    #[serde(flatten)]
    pub info: BuildInfo,
}

// ============================================================================
// Query engine
// ============================================================================

/// Read-only question answering over one build
#[derive(Debug, Clone)]
pub struct QueryEngine {
    graph: KnowledgeGraph,
    catalog: EntityCatalog,
    config: QueryConfig,
}

impl QueryEngine {
    /// Create an engine, deriving the catalog from the graph
    pub fn new(graph: KnowledgeGraph) -> Self {
        let catalog = EntityCatalog::from_graph(&graph);
        Self {
            graph,
            catalog,
            config: QueryConfig::default(),
        }
    }

    /// Use a previously saved catalog instead of the derived one
    pub fn with_catalog(mut self, catalog: EntityCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    /// Entities whose canonical or source-language name contains `term`, case-insensitively
    pub fn find_entities(&self, term: &str) -> Vec<EntityMatch> {
        let needle = term.to_lowercase();
        self.graph
            .nodes()
            .filter(|(_, node)| {
                node.canonical_name.to_lowercase().contains(&needle)
                    || node
                        .source_surface_form
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .map(|(_, node)| EntityMatch {
                key: node.key(),
                name: node.canonical_name.clone(),
                source_name: node.source_surface_form.clone(),
                entity_type: node.entity_type,
                mention_count: node.mention_count(),
            })
            .collect()
    }

    /// All neighbors of a node key, heaviest first; empty for an unknown key
    pub fn connections(&self, key: &str) -> Vec<Connection> {
        self.graph
            .find_key(key)
            .map(|id| self.connections_of(id))
            .unwrap_or_default()
    }

    fn connections_of(&self, id: NodeId) -> Vec<Connection> {
        self.graph
            .neighbors(id)
            .into_iter()
            .filter_map(|n| {
                let node = self.graph.node(n.node)?;
                Some(Connection {
                    key: node.key(),
                    name: node.canonical_name.clone(),
                    entity_type: node.entity_type,
                    kind: n.kind,
                    weight: n.weight,
                    outgoing: n.outgoing,
                })
            })
            .collect()
    }

    /// Text block for the first node (creation order) whose canonical name equals `name`
    pub fn describe_entity(&self, name: &str) -> String {
        let wanted = name.to_lowercase();
        let found = self
            .graph
            .nodes()
            .find(|(_, node)| node.canonical_name.to_lowercase() == wanted);

        match found {
            Some((id, node)) => self.render_description(id, node),
            None => format!("I don't have detailed information about {name} yet."),
        }
    }

    fn render_description(&self, id: NodeId, node: &EntityNode) -> String {
        let mut out = format!("**{}**\n\n", node.canonical_name);
        out.push_str(&format!("Type: {}\n", node.entity_type));
        if let Some(source) = &node.source_surface_form {
            out.push_str(&format!("Romanian: {source}\n"));
        }
        out.push_str(&format!(
            "Mentioned {} times in documents\n\n",
            node.mention_count()
        ));

        let connections = self.connections_of(id);
        if !connections.is_empty() {
            out.push_str("Related entities:\n");
            for group in group_by_neighbor(&connections)
                .iter()
                .take(self.config.max_neighbors)
            {
                let details: Vec<String> = group
                    .iter()
                    .map(|c| match c.kind {
                        RelationKind::CoMentioned => format!("{} co-mentions", c.weight),
                        kind => format!(
                            "{} {} (weight {})",
                            if c.outgoing { "->" } else { "<-" },
                            kind,
                            c.weight
                        ),
                    })
                    .collect();
                out.push_str(&format!(
                    "  - {} ({}) - {}\n",
                    group[0].name,
                    group[0].entity_type,
                    details.join("; ")
                ));
            }
        }

        out
    }

    /// Answer a free-form question from the rule table
    pub fn answer_question(&self, question: &str) -> String {
        let lowered = question.to_lowercase();
        let intent = analyze_question(&lowered);
        debug!(?intent, question, "Answering question");

        match intent {
            QueryIntent::Describe => self
                .catalog
                .iter()
                .find(|(_, name)| lowered.contains(&name.to_lowercase()))
                .map(|(_, name)| self.describe_entity(name))
                .unwrap_or_else(|| UNIDENTIFIED_ENTITY.to_string()),
            QueryIntent::Locate => LOCATION_UNSUPPORTED.to_string(),
            QueryIntent::List(bucket) => self.list(bucket),
            QueryIntent::Help => HELP.to_string(),
        }
    }

    /// Answers to every sample question, in order
    pub fn sample_answers(&self) -> Vec<(&'static str, String)> {
        SAMPLE_QUESTIONS
            .iter()
            .map(|question| (*question, self.answer_question(question)))
            .collect()
    }

    fn list(&self, bucket: CatalogBucket) -> String {
        let prefix = match bucket {
            CatalogBucket::Platforms => "Major platforms",
            CatalogBucket::Zones => "Known zones",
            CatalogBucket::Rocks => "Rock types",
            CatalogBucket::Other => "Other entities",
        };
        format!("{prefix}: {}", self.catalog.bucket(bucket).join(", "))
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            info: self.graph.info().clone(),
        }
    }
}

/// Connections grouped per neighbor node; heaviest-first input keeps each
/// group ranked by its heaviest edge
fn group_by_neighbor(connections: &[Connection]) -> Vec<Vec<&Connection>> {
    let mut groups: Vec<Vec<&Connection>> = Vec::new();
    for connection in connections {
        match groups.iter_mut().find(|g| g[0].key == connection.key) {
            Some(group) => group.push(connection),
            None => groups.push(vec![connection]),
        }
    }
    groups
}

// ============================================================================
// Tests
// ============================================================================
