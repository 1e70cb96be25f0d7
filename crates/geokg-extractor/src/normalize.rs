//! Text normalization shared by every matcher
//!
//! Terms, page text, sentences and relation keywords all pass through the
//! same normalizer so that a surface form and the text it is searched in are
//! always compared in the same form.

/// Lowercases text and optionally strips diacritics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextNormalizer {
    fold_diacritics: bool,
}

impl TextNormalizer {
    /// Create a normalizer
    pub fn new(fold_diacritics: bool) -> Self {
        Self { fold_diacritics }
    }

    /// Whether diacritics are folded
    pub fn folds_diacritics(&self) -> bool {
        self.fold_diacritics
    }

    /// Normalize text for matching
    pub fn normalize(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        if !self.fold_diacritics {
            return lower;
        }
        lower.chars().map(fold_char).collect()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Map a lowercase character to its unaccented base letter
fn fold_char(c: char) -> char {
    match c {
        // Romanian, both the comma-below and the legacy cedilla forms
        'ă' | 'â' => 'a',
        'î' => 'i',
        'ș' | 'ş' => 's',
        'ț' | 'ţ' => 't',
        // Other Latin accents common in multilingual geological literature
        'á' | 'à' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
