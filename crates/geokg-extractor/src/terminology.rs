//! Terminology catalog and the shared term matcher
//!
//! The catalog maps source-language surface forms to `(entity_type,
//! canonical_name)` pairs. Several surface forms may map to the same pair;
//! they then merge into one graph node.
//!
//! [`TermIndex`] compiles every surface form into one `RegexSet` and is the
//! only place text is matched against the catalog.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::TextNormalizer;
use geokg_core::{EntityRef, EntityType, GeoKgError, Result};

/// Sentence boundary used by every sentence-scope scan
pub const SENTENCE_DELIMITER: char = '.';

// ============================================================================
// Catalog
// ============================================================================

/// A surface form and the entity it denotes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminologyEntry {
    pub surface_form: String,
    pub entity_type: EntityType,
    pub canonical_name: String,
}

impl TerminologyEntry {
    /// Create a new entry
    pub fn new(
        surface_form: impl Into<String>,
        entity_type: EntityType,
        canonical_name: impl Into<String>,
    ) -> Self {
        Self {
            surface_form: surface_form.into(),
            entity_type,
            canonical_name: canonical_name.into(),
        }
    }

    /// Identity of the node this entry maps to
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.canonical_name.clone())
    }
}

/// Romanian petroleum geology terms with their English canonical names
const ROMANIAN_PETROLEUM: &[(&str, EntityType, &str)] = &[
    // Geological structures
    ("platformă moesică", EntityType::Platform, "Moesian Platform"),
    ("platforma moldovenească", EntityType::Platform, "Moldavian Platform"),
    ("depresiunea precarpatică", EntityType::Basin, "Pre-Carpathian Depression"),
    ("depresiunea transilvaniei", EntityType::Basin, "Transylvanian Basin"),
    ("depresiunea getică", EntityType::Basin, "Getic Depression"),
    // Rock types
    ("gresii", EntityType::Rock, "sandstones"),
    ("marne", EntityType::Rock, "marls"),
    ("calcare", EntityType::Rock, "limestones"),
    ("nisipuri", EntityType::Rock, "sands"),
    ("argile", EntityType::Rock, "shales"),
    ("dolomite", EntityType::Rock, "dolomites"),
    // Zones
    ("zona estică", EntityType::Zone, "Eastern Zone"),
    ("zona centrală", EntityType::Zone, "Central Zone"),
    ("zona vestică", EntityType::Zone, "Western Zone"),
    ("zona flișului", EntityType::Zone, "Flysch Zone"),
    // Geological ages
    ("neogen", EntityType::Age, "Neogene"),
    ("paleogen", EntityType::Age, "Paleogene"),
    ("cretacic", EntityType::Age, "Cretaceous"),
    ("jurasic", EntityType::Age, "Jurassic"),
    ("triasic", EntityType::Age, "Triassic"),
    // Hydrocarbons
    ("hidrocarburi", EntityType::Substance, "hydrocarbons"),
    ("petrol", EntityType::Substance, "oil"),
    ("gaz", EntityType::Substance, "gas"),
    ("rezervor", EntityType::Feature, "reservoir"),
    ("zăcământ", EntityType::Feature, "deposit"),
];

/// Ordered, immutable set of terminology entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminologyCatalog {
    entries: Vec<TerminologyEntry>,
}

/// On-disk catalog layout: a list of `[[term]]` tables
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "term")]
    terms: Vec<TerminologyEntry>,
}

impl TerminologyCatalog {
    /// Create a catalog, rejecting blank, duplicate or unmatchable surface forms
    pub fn new(entries: Vec<TerminologyEntry>) -> Result<Self> {
        let mut seen = HashSet::new();

        for entry in &entries {
            if entry.surface_form.trim().is_empty() {
                return Err(GeoKgError::InvalidTerminology(format!(
                    "empty surface form for '{}'",
                    entry.canonical_name
                )));
            }
            if entry.canonical_name.trim().is_empty() {
                return Err(GeoKgError::InvalidTerminology(format!(
                    "empty canonical name for '{}'",
                    entry.surface_form
                )));
            }
            // Matching happens per sentence, so a delimiter inside a term never matches
            if entry.surface_form.contains(SENTENCE_DELIMITER) {
                return Err(GeoKgError::InvalidTerminology(format!(
                    "surface form '{}' contains the sentence delimiter",
                    entry.surface_form
                )));
            }
            if !seen.insert(entry.surface_form.to_lowercase()) {
                return Err(GeoKgError::InvalidTerminology(format!(
                    "duplicate surface form '{}'",
                    entry.surface_form
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The built-in Romanian petroleum geology catalog
    pub fn romanian_petroleum() -> Self {
        Self {
            entries: ROMANIAN_PETROLEUM
                .iter()
                .map(|(form, entity_type, canonical)| {
                    TerminologyEntry::new(*form, *entity_type, *canonical)
                })
                .collect(),
        }
    }

    /// Parse a TOML catalog
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| GeoKgError::InvalidTerminology(format!("malformed catalog: {e}")))?;
        Self::new(file.terms)
    }

    /// Read a TOML catalog from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Entries in catalog order
    pub fn entries(&self) -> &[TerminologyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-insensitive lookup of a surface form
    pub fn lookup(&self, surface_form: &str) -> Option<&TerminologyEntry> {
        let needle = surface_form.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.surface_form.to_lowercase() == needle)
    }
}

impl Default for TerminologyCatalog {
    fn default() -> Self {
        Self::romanian_petroleum()
    }
}

// ============================================================================
// Scan results
// ============================================================================

/// Catalog entries found in one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceHits {
    /// Normalized sentence text
    pub text: String,
    /// Matching entry indices, ascending (catalog order)
    pub entries: Vec<usize>,
}

/// Sentences of one page that matched at least one entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageScan {
    pub sentences: Vec<SentenceHits>,
}

impl PageScan {
    /// Entries present anywhere on the page, ascending
    pub fn entries(&self) -> Vec<usize> {
        self.sentences
            .iter()
            .flat_map(|s| s.entries.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

// ============================================================================
// Term index
// ============================================================================

/// Compiled catalog: one `RegexSet` over all normalized surface forms
#[derive(Debug)]
pub struct TermIndex {
    catalog: TerminologyCatalog,
    normalizer: TextNormalizer,
    /// Normalized surface forms, parallel to the catalog entries
    forms: Vec<String>,
    /// Catalog entry behind each pattern of `set`, ascending
    slots: Vec<usize>,
    set: RegexSet,
    /// Index of the first catalog entry of each entity
    ranks: HashMap<EntityRef, usize>,
}

impl TermIndex {
    /// Compile a catalog
    ///
    /// Surface forms that normalize to the same text are compiled once, under
    /// the first entry carrying them. Such forms must name the same entity.
    pub fn new(catalog: TerminologyCatalog, normalizer: TextNormalizer) -> Result<Self> {
        let mut forms = Vec::with_capacity(catalog.len());
        let mut slots = Vec::with_capacity(catalog.len());
        let mut owners: HashMap<String, usize> = HashMap::new();

        for (idx, entry) in catalog.entries().iter().enumerate() {
            let form = normalizer.normalize(&entry.surface_form);
            match owners.get(&form) {
                Some(&first) => {
                    let owner = &catalog.entries()[first];
                    if owner.entity() != entry.entity() {
                        return Err(GeoKgError::InvalidTerminology(format!(
                            "surface forms '{}' and '{}' both match '{form}' but name different entities",
                            owner.surface_form, entry.surface_form
                        )));
                    }
                    debug!(
                        surface_form = %entry.surface_form,
                        merged_into = %owner.surface_form,
                        "Merging equivalent surface form"
                    );
                }
                None => {
                    owners.insert(form.clone(), idx);
                    slots.push(idx);
                }
            }
            forms.push(form);
        }

        let set = RegexSet::new(slots.iter().map(|&idx| regex::escape(&forms[idx])))
            .map_err(|e| GeoKgError::InvalidTerminology(format!("cannot compile catalog: {e}")))?;

        let mut ranks = HashMap::new();
        for (idx, entry) in catalog.entries().iter().enumerate() {
            ranks.entry(entry.entity()).or_insert(idx);
        }

        Ok(Self {
            catalog,
            normalizer,
            forms,
            slots,
            set,
            ranks,
        })
    }

    pub fn catalog(&self) -> &TerminologyCatalog {
        &self.catalog
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Entry by index; indices come from this index's own scans
    pub fn entry(&self, idx: usize) -> &TerminologyEntry {
        &self.catalog.entries()[idx]
    }

    /// Normalized surface form of an entry
    pub fn normalized_form(&self, idx: usize) -> &str {
        &self.forms[idx]
    }

    /// Catalog rank of an entity (index of its first entry)
    pub fn rank(&self, entity: &EntityRef) -> Option<usize> {
        self.ranks.get(entity).copied()
    }

    /// Entries occurring anywhere in already-normalized text, ascending
    pub fn find(&self, normalized: &str) -> Vec<usize> {
        self.set
            .matches(normalized)
            .into_iter()
            .map(|slot| self.slots[slot])
            .collect()
    }

    /// Normalize a single sentence and find its entries
    pub fn scan_sentence(&self, sentence: &str) -> SentenceHits {
        let text = self.normalizer.normalize(sentence);
        let entries = self.find(&text);
        SentenceHits { text, entries }
    }

    /// Normalize a page, split it into sentences and keep those with hits
    pub fn scan_page(&self, text: &str) -> PageScan {
        let normalized = self.normalizer.normalize(text);
        let sentences = split_sentences(&normalized)
            .filter_map(|sentence| {
                let entries = self.find(sentence);
                (!entries.is_empty()).then(|| SentenceHits {
                    text: sentence.to_string(),
                    entries,
                })
            })
            .collect();

        PageScan { sentences }
    }
}

/// Period-delimited spans, trimmed, blanks dropped
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(SENTENCE_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> TermIndex {
        TermIndex::new(TerminologyCatalog::romanian_petroleum(), TextNormalizer::default()).unwrap()
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = TerminologyCatalog::romanian_petroleum();
        assert_eq!(catalog.len(), 25);
        assert!(TerminologyCatalog::new(catalog.entries().to_vec()).is_ok());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = TerminologyCatalog::default();
        let entry = catalog.lookup("GRESII").unwrap();
        assert_eq!(entry.canonical_name, "sandstones");
        assert_eq!(entry.entity_type, EntityType::Rock);
        assert!(catalog.lookup("gresi").is_none());
    }

    #[test]
    fn test_rejects_duplicate_surface_forms() {
        let result = TerminologyCatalog::new(vec![
            TerminologyEntry::new("gresii", EntityType::Rock, "sandstones"),
            TerminologyEntry::new("Gresii", EntityType::Rock, "sandstone"),
        ]);
        assert!(matches!(result, Err(GeoKgError::InvalidTerminology(_))));
    }

    #[test]
    fn test_rejects_blank_and_delimited_forms() {
        let blank = TerminologyCatalog::new(vec![TerminologyEntry::new(
            "  ",
            EntityType::Rock,
            "nothing",
        )]);
        assert!(blank.is_err());

        let dotted = TerminologyCatalog::new(vec![TerminologyEntry::new(
            "st. petru",
            EntityType::Zone,
            "St Peter",
        )]);
        assert!(dotted.is_err());
    }

    #[test]
    fn test_from_toml() {
        let catalog = TerminologyCatalog::from_toml_str(
            r#"
            [[term]]
            surface_form = "gresii"
            entity_type = "rock"
            canonical_name = "sandstones"

            [[term]]
            surface_form = "gresiile"
            entity_type = "rock"
            canonical_name = "sandstones"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[1].surface_form, "gresiile");
    }

    #[test]
    fn test_from_toml_rejects_unknown_type() {
        let result = TerminologyCatalog::from_toml_str(
            r#"
            [[term]]
            surface_form = "vulcan"
            entity_type = "volcano"
            canonical_name = "volcano"
            "#,
        );
        assert!(matches!(result, Err(GeoKgError::InvalidTerminology(_))));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[term]]\nsurface_form = \"sare\"\nentity_type = \"rock\"\ncanonical_name = \"salt\""
        )
        .unwrap();

        let catalog = TerminologyCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.lookup("sare").unwrap().canonical_name, "salt");
    }

    #[test]
    fn test_scan_matches_without_diacritics() {
        let index = index();
        let scan = index.scan_page("Platforma Moesica cuprinde zona estică.");

        assert_eq!(scan.sentences.len(), 1);
        let names: Vec<&str> = scan
            .entries()
            .into_iter()
            .map(|idx| index.entry(idx).canonical_name.as_str())
            .collect();
        assert_eq!(names, vec!["Moesian Platform", "Eastern Zone"]);
    }

    #[test]
    fn test_scan_without_folding_requires_diacritics() {
        let index =
            TermIndex::new(TerminologyCatalog::default(), TextNormalizer::new(false)).unwrap();
        let scan = index.scan_page("Platforma Moesica. Platformă Moesică.");

        assert_eq!(scan.sentences.len(), 1);
        assert_eq!(scan.sentences[0].text, "platformă moesică");
    }

    #[test]
    fn test_overlapping_forms_match_independently() {
        let catalog = TerminologyCatalog::new(vec![
            TerminologyEntry::new("petrol", EntityType::Substance, "oil"),
            TerminologyEntry::new("petrolifer", EntityType::Feature, "oil-bearing"),
        ])
        .unwrap();
        let index = TermIndex::new(catalog, TextNormalizer::default()).unwrap();

        assert_eq!(index.find("strat petrolifer"), vec![0, 1]);
    }

    #[test]
    fn test_forms_equal_after_folding_match_once() {
        let catalog = TerminologyCatalog::new(vec![
            TerminologyEntry::new("platformă moesică", EntityType::Platform, "Moesian Platform"),
            TerminologyEntry::new("platforma moesica", EntityType::Platform, "Moesian Platform"),
        ])
        .unwrap();
        let index = TermIndex::new(catalog, TextNormalizer::default()).unwrap();

        assert_eq!(index.find("platforma moesica"), vec![0]);
        assert_eq!(index.scan_page("Platforma moesica.").entries(), vec![0]);
    }

    #[test]
    fn test_forms_equal_after_folding_kept_apart_without_folding() {
        let catalog = TerminologyCatalog::new(vec![
            TerminologyEntry::new("platformă moesică", EntityType::Platform, "Moesian Platform"),
            TerminologyEntry::new("platforma moesica", EntityType::Platform, "Moesian Platform"),
        ])
        .unwrap();
        let index = TermIndex::new(catalog, TextNormalizer::new(false)).unwrap();

        assert_eq!(index.find("platforma moesica"), vec![1]);
        assert_eq!(index.find("platformă moesică"), vec![0]);
    }

    #[test]
    fn test_rejects_folded_collision_across_entities() {
        let catalog = TerminologyCatalog::new(vec![
            TerminologyEntry::new("zona estică", EntityType::Zone, "Eastern Zone"),
            TerminologyEntry::new("zona estica", EntityType::Zone, "East Zone"),
        ])
        .unwrap();

        let result = TermIndex::new(catalog, TextNormalizer::default());
        assert!(matches!(result, Err(GeoKgError::InvalidTerminology(_))));
    }

    #[test]
    fn test_page_entries_union_sentences() {
        let index = index();
        let scan = index.scan_page("Gresii si marne. Apoi gresii.  . Nimic aici");

        assert_eq!(scan.sentences.len(), 2);
        let names: Vec<&str> = scan
            .entries()
            .into_iter()
            .map(|idx| index.entry(idx).canonical_name.as_str())
            .collect();
        assert_eq!(names, vec!["sandstones", "marls"]);
    }

    #[test]
    fn test_empty_text_scans_to_nothing() {
        let index = index();
        assert!(index.scan_page("").is_empty());
        assert!(index.scan_page("   ...  ").is_empty());
    }

    #[test]
    fn test_rank_is_first_entry() {
        let catalog = TerminologyCatalog::new(vec![
            TerminologyEntry::new("gresii", EntityType::Rock, "sandstones"),
            TerminologyEntry::new("marne", EntityType::Rock, "marls"),
            TerminologyEntry::new("gresie", EntityType::Rock, "sandstones"),
        ])
        .unwrap();
        let index = TermIndex::new(catalog, TextNormalizer::default()).unwrap();

        assert_eq!(index.rank(&EntityRef::new(EntityType::Rock, "sandstones")), Some(0));
        assert_eq!(index.rank(&EntityRef::new(EntityType::Rock, "marls")), Some(1));
        assert_eq!(index.rank(&EntityRef::new(EntityType::Rock, "salt")), None);
    }

    #[test]
    fn test_split_sentences() {
        let parts: Vec<&str> = split_sentences(" a b. c .. d").collect();
        assert_eq!(parts, vec!["a b", "c", "d"]);
    }
}
