//! GeoKG Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout GeoKG:
//! - Entity identity (types, references, mentions)
//! - Relation kinds for the multi-edge graph
//! - The ingestion contract (page-tagged document text)
//! - Common error types
//! - Configuration management

pub mod config;
pub mod input;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, OutputConfig, QueryConfig,
};
pub use input::{DocumentData, DocumentInput, KnowledgeBase, NamedPages, PageText, PreIdentified};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for GeoKG operations
#[derive(Error, Debug)]
pub enum GeoKgError {
    /// Ingestion data absent or malformed; the build aborts before any mutation
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid terminology: {0}")]
    InvalidTerminology(String),

    #[error("Invalid graph snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GeoKgError>;

// ============================================================================
// Entity Identity
// ============================================================================

/// Classes of geological entities known to the terminology catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Platform,
    Basin,
    Zone,
    Rock,
    Age,
    Substance,
    Feature,
}

impl EntityType {
    /// Get the string representation used in node keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Basin => "basin",
            Self::Zone => "zone",
            Self::Rock => "rock",
            Self::Age => "age",
            Self::Substance => "substance",
            Self::Feature => "feature",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = GeoKgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "platform" => Ok(Self::Platform),
            "basin" => Ok(Self::Basin),
            "zone" => Ok(Self::Zone),
            "rock" => Ok(Self::Rock),
            "age" => Ok(Self::Age),
            "substance" => Ok(Self::Substance),
            "feature" => Ok(Self::Feature),
            other => Err(GeoKgError::InvalidTerminology(format!(
                "unknown entity type '{other}'"
            ))),
        }
    }
}

/// Identity of an entity node: `(entity_type, canonical_name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub canonical_name: String,
}

impl EntityRef {
    /// Create a new entity reference
    pub fn new(entity_type: EntityType, canonical_name: impl Into<String>) -> Self {
        Self {
            entity_type,
            canonical_name: canonical_name.into(),
        }
    }

    /// Node key in the `type:canonical_name` form
    pub fn key(&self) -> String {
        node_key(self.entity_type, &self.canonical_name)
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.canonical_name)
    }
}

/// Build a node key from its parts
pub fn node_key(entity_type: EntityType, canonical_name: &str) -> String {
    format!("{}:{}", entity_type.as_str(), canonical_name)
}

/// One recorded occurrence of an entity at a document/page location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    /// Document identifier supplied by ingestion
    pub document_id: String,

    /// Page number within the document
    pub page: u32,
}

impl Mention {
    /// Create a new mention
    pub fn new(document_id: impl Into<String>, page: u32) -> Self {
        Self {
            document_id: document_id.into(),
            page,
        }
    }
}

// ============================================================================
// Relations
// ============================================================================

/// Kind of an edge in the knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Both entities appeared in the same sentence
    CoMentioned,
    /// "X din Y"
    PartOf,
    /// "X cuprinde Y"
    Contains,
    /// "X se găsește în Y"
    LocatedIn,
}

impl RelationKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoMentioned => "co_mentioned",
            Self::PartOf => "part_of",
            Self::Contains => "contains",
            Self::LocatedIn => "located_in",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Build Metadata
// ============================================================================

/// Identity and timestamp of one graph build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Unique identifier of the build run
    pub build_id: Uuid,

    /// When the build started
    pub built_at: DateTime<Utc>,
}

impl BuildInfo {
    /// Stamp a new build
    pub fn new() -> Self {
        Self {
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_key_format() {
        let entity = EntityRef::new(EntityType::Rock, "sandstones");
        assert_eq!(entity.key(), "rock:sandstones");
        assert_eq!(entity.to_string(), "rock:sandstones");
        assert_eq!(
            node_key(EntityType::Platform, "Moesian Platform"),
            "platform:Moesian Platform"
        );
    }

    #[test]
    fn test_entity_type_parse() {
        assert_eq!("Zone".parse::<EntityType>().unwrap(), EntityType::Zone);
        assert_eq!(" basin ".parse::<EntityType>().unwrap(), EntityType::Basin);
        assert!("volcano".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_relation_kind_serde() {
        let json = serde_json::to_string(&RelationKind::LocatedIn).unwrap();
        assert_eq!(json, "\"located_in\"");

        let kind: RelationKind = serde_json::from_str("\"co_mentioned\"").unwrap();
        assert_eq!(kind, RelationKind::CoMentioned);
        assert_eq!(RelationKind::PartOf.to_string(), "part_of");
    }

    #[test]
    fn test_build_info_is_unique() {
        let a = BuildInfo::new();
        let b = BuildInfo::new();
        assert_ne!(a.build_id, b.build_id);
    }
}
