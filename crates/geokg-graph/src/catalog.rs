//! Entity catalog: a denormalized, label-keyed view of the graph

use serde::{Deserialize, Serialize};

use crate::store::KnowledgeGraph;
use geokg_core::EntityType;

/// One of the four catalog lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBucket {
    Platforms,
    Zones,
    Rocks,
    Other,
}

impl CatalogBucket {
    /// Buckets in scan order
    pub const ALL: [CatalogBucket; 4] = [Self::Platforms, Self::Zones, Self::Rocks, Self::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Platforms => "platforms",
            Self::Zones => "zones",
            Self::Rocks => "rocks",
            Self::Other => "other",
        }
    }

    /// Bucket an entity type is filed under
    pub fn for_type(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Platform | EntityType::Basin => Self::Platforms,
            EntityType::Zone => Self::Zones,
            EntityType::Rock => Self::Rocks,
            EntityType::Age | EntityType::Substance | EntityType::Feature => Self::Other,
        }
    }
}

impl std::fmt::Display for CatalogBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Canonical names per bucket, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCatalog {
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub rocks: Vec<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the catalog from the graph's node creation order
    pub fn from_graph(graph: &KnowledgeGraph) -> Self {
        let mut catalog = Self::new();
        for (_, node) in graph.nodes() {
            catalog.insert(node.entity_type, &node.canonical_name);
        }
        catalog
    }

    /// File a name under its type's bucket; returns `false` if already present
    pub fn insert(&mut self, entity_type: EntityType, name: &str) -> bool {
        let bucket = self.bucket_mut(CatalogBucket::for_type(entity_type));
        if bucket.iter().any(|n| n == name) {
            return false;
        }
        bucket.push(name.to_string());
        true
    }

    pub fn bucket(&self, bucket: CatalogBucket) -> &[String] {
        match bucket {
            CatalogBucket::Platforms => &self.platforms,
            CatalogBucket::Zones => &self.zones,
            CatalogBucket::Rocks => &self.rocks,
            CatalogBucket::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, bucket: CatalogBucket) -> &mut Vec<String> {
        match bucket {
            CatalogBucket::Platforms => &mut self.platforms,
            CatalogBucket::Zones => &mut self.zones,
            CatalogBucket::Rocks => &mut self.rocks,
            CatalogBucket::Other => &mut self.other,
        }
    }

    /// Every `(bucket, name)` in scan order
    pub fn iter(&self) -> impl Iterator<Item = (CatalogBucket, &str)> {
        CatalogBucket::ALL
            .into_iter()
            .flat_map(move |b| self.bucket(b).iter().map(move |n| (b, n.as_str())))
    }

    pub fn len(&self) -> usize {
        CatalogBucket::ALL.iter().map(|b| self.bucket(*b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json_string(&self) -> geokg_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
