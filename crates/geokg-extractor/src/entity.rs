//! Dictionary-based entity recognition
//!
//! Every catalog entry present on a page yields exactly one occurrence for
//! that page, however many times the surface form repeats. Two entries of
//! the same entity both present on a page yield two occurrences.

use std::sync::Arc;

use crate::terminology::{PageScan, TermIndex};
use crate::{EntityExtractor, EntityOccurrence};
use geokg_core::Mention;

/// Page-scope extractor backed by the shared term index
#[derive(Debug, Clone)]
pub struct DictionaryNer {
    index: Arc<TermIndex>,
}

impl DictionaryNer {
    /// Create an extractor over a compiled catalog
    pub fn new(index: Arc<TermIndex>) -> Self {
        Self { index }
    }

    /// Turn a page scan into occurrences, one per matched entry
    pub fn occurrences(&self, document_id: &str, page: u32, scan: &PageScan) -> Vec<EntityOccurrence> {
        scan.entries()
            .into_iter()
            .map(|idx| {
                let entry = self.index.entry(idx);
                EntityOccurrence {
                    entity: entry.entity(),
                    surface_form: entry.surface_form.clone(),
                    mention: Mention::new(document_id, page),
                }
            })
            .collect()
    }
}

impl EntityExtractor for DictionaryNer {
    fn extract(&self, document_id: &str, page: u32, text: &str) -> Vec<EntityOccurrence> {
        let scan = self.index.scan_page(text);
        self.occurrences(document_id, page, &scan)
    }
}
