//! Graph construction pipeline
//!
//! A build runs in two passes over the same page scans:
//! 1. Entity pass: catalog occurrences become nodes and mentions, then the
//!    document's pre-identified zones are unioned in.
//! 2. Relationship pass: sentence hits become weighted edges.
//!
//! Input is validated before the graph is touched; a build either completes
//! or fails without producing a graph.

use std::sync::Arc;

use tracing::{debug, info};

use crate::entity::DictionaryNer;
use crate::normalize::TextNormalizer;
use crate::relation::{CoMentionExtractor, RelationPattern};
use crate::stats::BuildStats;
use crate::terminology::{PageScan, TermIndex, TerminologyCatalog};
use geokg_core::{
    DocumentInput, EntityRef, EntityType, ExtractionConfig, KnowledgeBase, Mention, RelationKind,
    Result,
};
use geokg_graph::{EntityCatalog, GraphStore, KnowledgeGraph};

/// Everything a build produces
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: KnowledgeGraph,
    pub catalog: EntityCatalog,
    pub stats: BuildStats,
}

/// Page scans of one document, blank pages dropped
struct ScannedDocument<'a> {
    id: &'a str,
    document: &'a DocumentInput,
    pages: Vec<(u32, PageScan)>,
}

/// Builds knowledge graphs from ingestion output
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    index: Arc<TermIndex>,
    ner: DictionaryNer,
    re: CoMentionExtractor,
}

impl GraphBuilder {
    /// Create a builder over a catalog with the given extraction settings
    pub fn new(catalog: TerminologyCatalog, config: &ExtractionConfig) -> Result<Self> {
        let normalizer = TextNormalizer::new(config.fold_diacritics);
        let patterns = if config.relation_patterns {
            RelationPattern::romanian(&normalizer)?
        } else {
            Vec::new()
        };

        let index = Arc::new(TermIndex::new(catalog, normalizer)?);
        let ner = DictionaryNer::new(index.clone());
        let re = CoMentionExtractor::new(index.clone())
            .with_patterns(patterns)
            .with_max_entities(config.max_entities_per_sentence);

        Ok(Self { index, ner, re })
    }

    /// Create a builder from configuration, loading a custom catalog if one is set
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let catalog = match &config.terminology_file {
            Some(path) => {
                info!(path = %path.display(), "Loading terminology catalog");
                TerminologyCatalog::from_file(path)?
            }
            None => TerminologyCatalog::romanian_petroleum(),
        };
        Self::new(catalog, config)
    }

    pub fn index(&self) -> &TermIndex {
        &self.index
    }

    /// Build a graph from every document of the knowledge base
    pub fn build(&self, knowledge_base: &KnowledgeBase) -> Result<BuildOutput> {
        knowledge_base.validate()?;

        let mut stats = BuildStats {
            documents: knowledge_base.len(),
            ..Default::default()
        };

        info!(
            documents = knowledge_base.len(),
            pages = knowledge_base.page_count(),
            terms = self.index.catalog().len(),
            "Building knowledge graph"
        );

        let scanned: Vec<ScannedDocument<'_>> = knowledge_base
            .documents()
            .map(|(id, document)| {
                let mut pages = Vec::with_capacity(document.pages().len());
                for page in document.pages() {
                    if page.text.trim().is_empty() {
                        stats.pages_skipped += 1;
                        continue;
                    }
                    stats.pages_scanned += 1;
                    pages.push((page.page, self.index.scan_page(&page.text)));
                }
                ScannedDocument {
                    id,
                    document,
                    pages,
                }
            })
            .collect();

        let mut graph = KnowledgeGraph::new();

        // Pass 1: entities
        for doc in &scanned {
            let before = stats.mentions();
            for (page, scan) in &doc.pages {
                for occurrence in self.ner.occurrences(doc.id, *page, scan) {
                    graph.add_or_update_node(
                        &occurrence.entity,
                        Some(&occurrence.surface_form),
                        occurrence.mention,
                    );
                    stats.occurrences += 1;
                }
            }

            for zone in doc.document.zones() {
                let entity = EntityRef::new(EntityType::Zone, zone.name.clone());
                for &page in &zone.pages {
                    let mention = Mention::new(doc.id, page);
                    let known = graph
                        .find(&entity)
                        .and_then(|id| graph.node(id))
                        .is_some_and(|node| node.has_mention(&mention));
                    if !known {
                        graph.add_or_update_node(&entity, None, mention);
                        stats.preidentified_mentions += 1;
                    }
                }
            }

            debug!(
                document = doc.id,
                pages = doc.pages.len(),
                mentions = stats.mentions() - before,
                "Entity pass"
            );
        }

        info!(nodes = graph.node_count(), "Entity pass complete");

        // Pass 2: relationships
        for doc in &scanned {
            for (_, scan) in &doc.pages {
                for sentence in &scan.sentences {
                    stats.sentences_with_entities += 1;

                    let found = self.re.extract_hits(sentence);
                    if found.capped {
                        stats.capped_sentences += 1;
                    }

                    // Pass 1 created a node for every entity of every sentence
                    for relation in found.relations {
                        let Some((source, target)) =
                            graph.find(&relation.source).zip(graph.find(&relation.target))
                        else {
                            continue;
                        };
                        if !graph.add_or_increment_edge(source, target, relation.kind) {
                            continue;
                        }

                        if relation.kind == RelationKind::CoMentioned {
                            stats.co_mentions += 1;
                        } else {
                            stats.pattern_relations += 1;
                        }
                    }
                }
            }
            debug!(document = doc.id, edges = graph.edge_count(), "Relationship pass");
        }

        stats.nodes = graph.node_count();
        stats.edges = graph.edge_count();

        info!(
            nodes = stats.nodes,
            edges = stats.edges,
            build_id = %graph.info().build_id,
            "Knowledge graph built"
        );

        let catalog = EntityCatalog::from_graph(&graph);
        Ok(BuildOutput {
            graph,
            catalog,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geokg_core::GeoKgError;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(TerminologyCatalog::default(), &ExtractionConfig::default()).unwrap()
    }

    fn kb(docs: &[(&str, &[(u32, &str)])]) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        for (id, pages) in docs {
            kb.insert(*id, DocumentInput::from_pages(pages.iter().map(|(p, t)| (*p, *t))));
        }
        kb
    }

    #[test]
    fn test_empty_input_fails_before_building() {
        let err = builder().build(&KnowledgeBase::new()).unwrap_err();
        assert!(matches!(err, GeoKgError::MissingInput(_)));
    }

    #[test]
    fn test_sandstone_scenario() {
        let output = builder()
            .build(&kb(&[("doc1", &[(3, "Aceste gresii sunt...")])]))
            .unwrap();

        let graph = &output.graph;
        assert_eq!(graph.node_count(), 1);
        let id = graph.find_key("rock:sandstones").unwrap();
        assert_eq!(graph.node(id).unwrap().mentions, vec![Mention::new("doc1", 3)]);
        assert_eq!(output.catalog.rocks, vec!["sandstones"]);
        assert_eq!(output.stats.occurrences, 1);
    }

    #[test]
    fn test_blank_pages_are_skipped() {
        let output = builder()
            .build(&kb(&[("doc1", &[(1, "   "), (2, "marne"), (3, "")])]))
            .unwrap();

        assert_eq!(output.stats.pages_scanned, 1);
        assert_eq!(output.stats.pages_skipped, 2);
    }

    #[test]
    fn test_preidentified_zones_are_unioned() {
        let mut kb = KnowledgeBase::new();
        kb.insert(
            "doc1",
            DocumentInput::from_pages([(4, "Zona estică are gresii.")])
                .with_zone("Eastern Zone", vec![4, 9])
                .with_zone("Bordei Field", vec![2]),
        );

        let output = builder().build(&kb).unwrap();
        let graph = &output.graph;

        let eastern = graph.node(graph.find_key("zone:Eastern Zone").unwrap()).unwrap();
        assert_eq!(
            eastern.mentions,
            vec![Mention::new("doc1", 4), Mention::new("doc1", 9)]
        );
        assert_eq!(eastern.source_surface_form.as_deref(), Some("zona estică"));

        let field = graph.node(graph.find_key("zone:Bordei Field").unwrap()).unwrap();
        assert_eq!(field.source_surface_form, None);
        assert_eq!(field.mention_count(), 1);

        assert_eq!(output.stats.preidentified_mentions, 2);
        assert_eq!(output.catalog.zones, vec!["Eastern Zone", "Bordei Field"]);
    }

    #[test]
    fn test_pattern_toggle() {
        let text: &[(u32, &str)] = &[(1, "Platforma Moesica cuprinde zona estică.")];

        let on = builder().build(&kb(&[("doc1", text)])).unwrap();
        assert_eq!(on.graph.edges()[0].kind, RelationKind::Contains);
        assert_eq!(on.stats.pattern_relations, 1);

        let config = ExtractionConfig {
            relation_patterns: false,
            ..Default::default()
        };
        let off = GraphBuilder::new(TerminologyCatalog::default(), &config)
            .unwrap()
            .build(&kb(&[("doc1", text)]))
            .unwrap();
        assert_eq!(off.graph.edges()[0].kind, RelationKind::CoMentioned);
        assert_eq!(off.stats.co_mentions, 1);
    }

    #[test]
    fn test_capped_sentences_counted() {
        let config = ExtractionConfig {
            max_entities_per_sentence: Some(2),
            ..Default::default()
        };
        let output = GraphBuilder::new(TerminologyCatalog::default(), &config)
            .unwrap()
            .build(&kb(&[("doc1", &[(1, "gresii, marne, calcare si argile.")])]))
            .unwrap();

        assert_eq!(output.stats.capped_sentences, 1);
        assert_eq!(output.graph.edge_count(), 1);
        // Nodes are still recorded for every entity on the page
        assert_eq!(output.graph.node_count(), 4);
    }

    #[test]
    fn test_from_config_custom_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.toml");
        std::fs::write(
            &path,
            r#"
[[term]]
surface_form = "sare"
entity_type = "substance"
canonical_name = "salt"
"#,
        )
        .unwrap();

        let config = ExtractionConfig {
            terminology_file: Some(path),
            ..Default::default()
        };
        let builder = GraphBuilder::from_config(&config).unwrap();
        assert_eq!(builder.index().catalog().len(), 1);

        let output = builder.build(&kb(&[("doc1", &[(1, "Masivul de sare și gresii")])])).unwrap();
        assert_eq!(output.graph.node_count(), 1);
        assert_eq!(output.catalog.other, vec!["salt"]);
    }
}
