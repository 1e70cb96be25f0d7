//! Relation Extraction (RE) module
//!
//! Derives relations from sentences holding two or more distinct entities.
//! Every unordered pair of entities in a sentence yields one relation:
//! `co_mentioned` by default, or a directional kind when one of the
//! relation patterns places one entity before the keyword and the other
//! after it.
//!
//! Pair members are ordered by catalog rank, so the same two entities always
//! produce the same `(source, target)` and repeated co-mentions accumulate on
//! one edge.
//!
//! Pair generation is quadratic in the number of entities per sentence; see
//! [`CoMentionExtractor::with_max_entities`].

use std::sync::Arc;

use regex::Regex;

use crate::normalize::TextNormalizer;
use crate::terminology::{SentenceHits, TermIndex};
use crate::{ExtractedRelation, RelationExtractor};
use geokg_core::{EntityRef, GeoKgError, RelationKind, Result};

// ============================================================================
// Relation patterns
// ============================================================================

/// A `<left> keyword <right>` surface pattern tagging a relation kind
#[derive(Debug, Clone)]
pub struct RelationPattern {
    kind: RelationKind,
    regex: Regex,
}

impl RelationPattern {
    /// Build a pattern around a keyword phrase, normalized like the text it runs on
    pub fn new(kind: RelationKind, keyword: &str, normalizer: &TextNormalizer) -> Result<Self> {
        let keyword = normalizer.normalize(keyword);
        let keyword = keyword
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");

        let regex = Regex::new(&format!(r"([\w\s]+)\s+{keyword}\s+([\w\s]+)")).map_err(|e| {
            GeoKgError::InvalidTerminology(format!("invalid relation pattern '{keyword}': {e}"))
        })?;

        Ok(Self { kind, regex })
    }

    /// Romanian patterns: "X din Y", "X cuprinde Y", "X se găsește în Y"
    pub fn romanian(normalizer: &TextNormalizer) -> Result<Vec<Self>> {
        Ok(vec![
            Self::new(RelationKind::PartOf, "din", normalizer)?,
            Self::new(RelationKind::Contains, "cuprinde", normalizer)?,
            Self::new(RelationKind::LocatedIn, "se găsește în", normalizer)?,
        ])
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// `(left, right)` captures of every match in a normalized sentence
    fn spans<'s>(&self, sentence: &'s str) -> Vec<(&'s str, &'s str)> {
        self.regex
            .captures_iter(sentence)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
            .collect()
    }
}

// ============================================================================
// Co-mention extraction
// ============================================================================

/// Relations found in one sentence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceRelations {
    pub relations: Vec<ExtractedRelation>,
    /// Whether the entity cap dropped entities from this sentence
    pub capped: bool,
}

/// A distinct entity of a sentence and the entries that matched it
#[derive(Debug)]
struct SentenceEntity {
    entity: EntityRef,
    rank: usize,
    entries: Vec<usize>,
}

/// Sentence-scope relation extractor backed by the shared term index
#[derive(Debug, Clone)]
pub struct CoMentionExtractor {
    index: Arc<TermIndex>,
    patterns: Vec<RelationPattern>,
    max_entities: Option<usize>,
}

impl CoMentionExtractor {
    /// Create an extractor producing only `co_mentioned` relations
    pub fn new(index: Arc<TermIndex>) -> Self {
        Self {
            index,
            patterns: Vec::new(),
            max_entities: None,
        }
    }

    /// Tag pairs matched by these patterns with their kind
    pub fn with_patterns(mut self, patterns: Vec<RelationPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Keep at most `cap` entities (lowest catalog rank first) per sentence
    pub fn with_max_entities(mut self, cap: Option<usize>) -> Self {
        self.max_entities = cap;
        self
    }

    /// Relations for a sentence already scanned by the term index
    pub fn extract_hits(&self, hits: &SentenceHits) -> SentenceRelations {
        let mut entities = self.group(hits);

        let capped = match self.max_entities {
            Some(cap) if entities.len() > cap => {
                entities.truncate(cap);
                true
            }
            _ => false,
        };

        if entities.len() < 2 {
            return SentenceRelations {
                relations: Vec::new(),
                capped,
            };
        }

        let spans: Vec<(RelationKind, &str, &str)> = self
            .patterns
            .iter()
            .flat_map(|p| {
                p.spans(&hits.text)
                    .into_iter()
                    .map(move |(left, right)| (p.kind, left, right))
            })
            .collect();

        let mut relations = Vec::with_capacity(entities.len() * (entities.len() - 1) / 2);
        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                relations.push(self.relate(a, b, &spans));
            }
        }

        SentenceRelations { relations, capped }
    }

    /// Distinct entities of a sentence, ordered by catalog rank
    fn group(&self, hits: &SentenceHits) -> Vec<SentenceEntity> {
        let mut entities: Vec<SentenceEntity> = Vec::new();

        for &idx in &hits.entries {
            let entity = self.index.entry(idx).entity();
            match entities.iter_mut().find(|e| e.entity == entity) {
                Some(existing) => existing.entries.push(idx),
                None => {
                    let rank = self.index.rank(&entity).unwrap_or(idx);
                    entities.push(SentenceEntity {
                        entity,
                        rank,
                        entries: vec![idx],
                    });
                }
            }
        }

        entities.sort_by_key(|e| e.rank);
        entities
    }

    /// First pattern span placing one entity left and the other right decides the kind
    fn relate(
        &self,
        a: &SentenceEntity,
        b: &SentenceEntity,
        spans: &[(RelationKind, &str, &str)],
    ) -> ExtractedRelation {
        for &(kind, left, right) in spans {
            if self.occurs_in(a, left) && self.occurs_in(b, right) {
                return relation(a, kind, b);
            }
            if self.occurs_in(b, left) && self.occurs_in(a, right) {
                return relation(b, kind, a);
            }
        }
        relation(a, RelationKind::CoMentioned, b)
    }

    fn occurs_in(&self, entity: &SentenceEntity, span: &str) -> bool {
        entity
            .entries
            .iter()
            .any(|&idx| span.contains(self.index.normalized_form(idx)))
    }
}

fn relation(source: &SentenceEntity, kind: RelationKind, target: &SentenceEntity) -> ExtractedRelation {
    ExtractedRelation {
        source: source.entity.clone(),
        kind,
        target: target.entity.clone(),
    }
}

impl RelationExtractor for CoMentionExtractor {
    fn extract(&self, sentence: &str) -> Vec<ExtractedRelation> {
        let hits = self.index.scan_sentence(sentence);
        self.extract_hits(&hits).relations
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminology::{TerminologyCatalog, TerminologyEntry};
    use geokg_core::EntityType;

    fn index() -> Arc<TermIndex> {
        Arc::new(TermIndex::new(TerminologyCatalog::default(), TextNormalizer::default()).unwrap())
    }

    fn with_patterns() -> CoMentionExtractor {
        let normalizer = TextNormalizer::default();
        CoMentionExtractor::new(index()).with_patterns(RelationPattern::romanian(&normalizer).unwrap())
    }

    fn platform() -> EntityRef {
        EntityRef::new(EntityType::Platform, "Moesian Platform")
    }

    fn eastern_zone() -> EntityRef {
        EntityRef::new(EntityType::Zone, "Eastern Zone")
    }

    #[test]
    fn test_co_mention_without_patterns() {
        let re = CoMentionExtractor::new(index());
        let relations = re.extract("Platforma Moesica cuprinde zona estică");

        assert_eq!(
            relations,
            vec![ExtractedRelation {
                source: platform(),
                kind: RelationKind::CoMentioned,
                target: eastern_zone(),
            }]
        );
    }

    #[test]
    fn test_contains_pattern() {
        let relations = with_patterns().extract("Platforma Moesica cuprinde zona estică");

        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].kind, RelationKind::Contains);
        assert_eq!(relations[0].source, platform());
        assert_eq!(relations[0].target, eastern_zone());
    }

    #[test]
    fn test_pattern_direction_follows_text() {
        let relations = with_patterns().extract("Zona estică cuprinde platforma moesică");

        assert_eq!(relations[0].kind, RelationKind::Contains);
        assert_eq!(relations[0].source, eastern_zone());
        assert_eq!(relations[0].target, platform());
    }

    #[test]
    fn test_part_of_and_located_in() {
        let re = with_patterns();

        let part_of = re.extract("Gresii din zona estică");
        assert_eq!(part_of[0].kind, RelationKind::PartOf);
        assert_eq!(part_of[0].source.canonical_name, "sandstones");
        assert_eq!(part_of[0].target.canonical_name, "Eastern Zone");

        let located = re.extract("Petrolul se găsește în rezervor");
        assert_eq!(located[0].kind, RelationKind::LocatedIn);
        assert_eq!(located[0].source.canonical_name, "oil");
        assert_eq!(located[0].target.canonical_name, "reservoir");
    }

    #[test]
    fn test_co_mention_direction_is_catalog_order() {
        let re = CoMentionExtractor::new(index());
        let forward = re.extract("gresii si marne");
        let backward = re.extract("marne si gresii");

        assert_eq!(forward, backward);
        assert_eq!(forward[0].source.canonical_name, "sandstones");
    }

    #[test]
    fn test_single_entity_sentence_is_skipped() {
        let re = with_patterns();
        assert!(re.extract("Aceste gresii sunt fine").is_empty());
        assert!(re.extract("Nimic de interes").is_empty());
        assert!(re.extract("").is_empty());
    }

    #[test]
    fn test_variant_forms_are_one_entity() {
        let catalog = TerminologyCatalog::new(vec![
            TerminologyEntry::new("gresii", EntityType::Rock, "sandstones"),
            TerminologyEntry::new("gresiile", EntityType::Rock, "sandstones"),
            TerminologyEntry::new("marne", EntityType::Rock, "marls"),
        ])
        .unwrap();
        let index = Arc::new(TermIndex::new(catalog, TextNormalizer::default()).unwrap());
        let re = CoMentionExtractor::new(index);

        // "gresiile" also contains "gresii": still one entity, no self pair
        assert!(re.extract("gresiile").is_empty());
        assert_eq!(re.extract("gresiile si marne").len(), 1);
    }

    #[test]
    fn test_all_pairs_generated() {
        let re = CoMentionExtractor::new(index());
        let relations = re.extract("gresii, marne si calcare");

        assert_eq!(relations.len(), 3);
        assert!(relations.iter().all(|r| r.kind == RelationKind::CoMentioned));
    }

    #[test]
    fn test_entity_cap() {
        let index = index();
        let re = CoMentionExtractor::new(index.clone()).with_max_entities(Some(2));
        let hits = index.scan_sentence("gresii, marne si calcare");

        let result = re.extract_hits(&hits);
        assert!(result.capped);
        assert_eq!(result.relations.len(), 1);
        assert_eq!(result.relations[0].source.canonical_name, "sandstones");
        assert_eq!(result.relations[0].target.canonical_name, "marls");
    }

    #[test]
    fn test_pattern_keyword_is_normalized() {
        let normalizer = TextNormalizer::new(false);
        let pattern = RelationPattern::new(RelationKind::LocatedIn, "Se Găsește În", &normalizer).unwrap();

        assert_eq!(pattern.kind(), RelationKind::LocatedIn);
        assert_eq!(
            pattern.spans("gaz se găsește în rezervor"),
            vec![("gaz", "rezervor")]
        );
    }
}
