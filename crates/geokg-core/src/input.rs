//! Ingestion contract
//!
//! The extractor only sees page-tagged text produced by an external
//! ingestion step (PDF text extraction, OCR, post-OCR correction). The JSON
//! shape is a map from document id to its pages plus optional entities
//! already identified upstream:
//!
//! ```json
//! {
//!   "doc1.pdf": {
//!     "document_data": { "full_text": [ { "page": 3, "text": "Aceste gresii sunt..." } ] },
//!     "entities": { "zones": [ { "name": "Tazlau", "pages": [3, 4] } ] }
//!   }
//! }
//! ```
//!
//! Unknown fields are ignored so that richer ingestion output can be fed in
//! unchanged.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{GeoKgError, Result};

/// One page of extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// Page text of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentData {
    /// Pages in ingestion order
    pub full_text: Vec<PageText>,
}

/// A named entity identified upstream, with the pages it appears on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPages {
    pub name: String,
    #[serde(default)]
    pub pages: Vec<u32>,
}

/// Entities identified by ingestion, unioned into the graph unvalidated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreIdentified {
    #[serde(default)]
    pub zones: Vec<NamedPages>,
}

/// Ingestion output for a single document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    pub document_data: DocumentData,

    #[serde(default)]
    pub entities: Option<PreIdentified>,
}

impl DocumentInput {
    /// Create a document from `(page, text)` pairs
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            document_data: DocumentData {
                full_text: pages
                    .into_iter()
                    .map(|(page, text)| PageText {
                        page,
                        text: text.into(),
                    })
                    .collect(),
            },
            entities: None,
        }
    }

    /// Attach a pre-identified zone
    pub fn with_zone(mut self, name: impl Into<String>, pages: Vec<u32>) -> Self {
        self.entities
            .get_or_insert_with(PreIdentified::default)
            .zones
            .push(NamedPages {
                name: name.into(),
                pages,
            });
        self
    }

    /// Pages in ingestion order
    pub fn pages(&self) -> &[PageText] {
        &self.document_data.full_text
    }

    /// Pre-identified zones (empty when ingestion supplied none)
    pub fn zones(&self) -> &[NamedPages] {
        self.entities
            .as_ref()
            .map(|e| e.zones.as_slice())
            .unwrap_or(&[])
    }
}

/// Complete ingestion output: document id -> document
///
/// Documents are kept ordered by id so that node creation order, and with it
/// every "first match" answer, is reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
    documents: BTreeMap<String, DocumentInput>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document
    pub fn with_document(mut self, document_id: impl Into<String>, document: DocumentInput) -> Self {
        self.insert(document_id, document);
        self
    }

    /// Insert or replace a document
    pub fn insert(&mut self, document_id: impl Into<String>, document: DocumentInput) {
        self.documents.insert(document_id.into(), document);
    }

    /// Parse the ingestion JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GeoKgError::MissingInput(format!("malformed ingestion data: {e}")))
    }

    /// Read and parse an ingestion JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GeoKgError::MissingInput(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Check that there is something to build from
    pub fn validate(&self) -> Result<()> {
        if self.documents.is_empty() {
            return Err(GeoKgError::MissingInput(
                "ingestion data contains no documents".to_string(),
            ));
        }
        Ok(())
    }

    /// Documents in ascending id order
    pub fn documents(&self) -> impl Iterator<Item = (&str, &DocumentInput)> {
        self.documents.iter().map(|(id, doc)| (id.as_str(), doc))
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether there are no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of pages across all documents
    pub fn page_count(&self) -> usize {
        self.documents.values().map(|d| d.pages().len()).sum()
    }
}
