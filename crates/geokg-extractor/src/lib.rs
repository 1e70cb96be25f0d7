//! GeoKG Extractor - Knowledge extraction pipeline
//!
//! Implements dictionary-based entity recognition and sentence-level
//! relationship extraction for building the geological knowledge graph.
//!
//! Both extractors share one [`terminology::TermIndex`]: a single
//! multi-pattern matcher run at sentence granularity, whose hits are rolled
//! up to page-level mentions for the entity pass and paired up for the
//! relationship pass.

use geokg_core::{EntityRef, Mention, RelationKind};

pub mod builder;
pub mod entity;
pub mod normalize;
pub mod relation;
pub mod stats;
pub mod terminology;

pub use builder::{BuildOutput, GraphBuilder};
pub use entity::DictionaryNer;
pub use normalize::TextNormalizer;
pub use relation::{CoMentionExtractor, RelationPattern};
pub use stats::BuildStats;
pub use terminology::{PageScan, SentenceHits, TermIndex, TerminologyCatalog, TerminologyEntry};

/// An entity found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOccurrence {
    /// Node identity the matched surface form maps to
    pub entity: EntityRef,
    /// Catalog surface form that matched
    pub surface_form: String,
    /// Where it was found
    pub mention: Mention,
}

/// A relation derived from one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRelation {
    pub source: EntityRef,
    pub kind: RelationKind,
    pub target: EntityRef,
}

/// Trait for page-scope entity extractors
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, document_id: &str, page: u32, text: &str) -> Vec<EntityOccurrence>;
}

/// Trait for sentence-scope relation extractors
pub trait RelationExtractor: Send + Sync {
    fn extract(&self, sentence: &str) -> Vec<ExtractedRelation>;
}
