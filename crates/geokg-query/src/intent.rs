//! Question analysis
//!
//! A fixed rule table over the lowercased question; the first matching rule
//! wins.

use geokg_graph::CatalogBucket;

/// What a question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// "what is", "what are", "tell me about"
    Describe,
    /// "where", "location", "found in"
    Locate,
    /// "list" or "show me" with a bucket keyword
    List(CatalogBucket),
    /// Anything else
    Help,
}

const DESCRIBE_CUES: &[&str] = &["what is", "what are", "tell me about"];
const LOCATE_CUES: &[&str] = &["where", "location", "found in"];
const LIST_CUES: &[&str] = &["list", "show me"];

/// Bucket keywords, checked in this order
const LIST_TARGETS: &[(&str, CatalogBucket)] = &[
    ("platform", CatalogBucket::Platforms),
    ("zone", CatalogBucket::Zones),
    ("rock", CatalogBucket::Rocks),
];

/// Classify an already-lowercased question
pub fn analyze_question(question: &str) -> QueryIntent {
    let has_any = |cues: &[&str]| cues.iter().any(|cue| question.contains(cue));

    if has_any(DESCRIBE_CUES) {
        return QueryIntent::Describe;
    }
    if has_any(LOCATE_CUES) {
        return QueryIntent::Locate;
    }
    if has_any(LIST_CUES) {
        if let Some((_, bucket)) = LIST_TARGETS.iter().find(|(kw, _)| question.contains(kw)) {
            return QueryIntent::List(*bucket);
        }
    }
    QueryIntent::Help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order() {
        assert_eq!(analyze_question("what is the moesian platform?"), QueryIntent::Describe);
        assert_eq!(analyze_question("tell me about sandstones"), QueryIntent::Describe);
        // Describe wins over locate
        assert_eq!(analyze_question("what is found in the eastern zone"), QueryIntent::Describe);
        assert_eq!(analyze_question("where is oil?"), QueryIntent::Locate);
        // Locate wins over list
        assert_eq!(analyze_question("list the location of zones"), QueryIntent::Locate);
    }

    #[test]
    fn test_list_targets() {
        assert_eq!(
            analyze_question("list all platforms"),
            QueryIntent::List(CatalogBucket::Platforms)
        );
        assert_eq!(
            analyze_question("show me all rock types"),
            QueryIntent::List(CatalogBucket::Rocks)
        );
        // Keyword order decides between buckets
        assert_eq!(
            analyze_question("list zones and platforms"),
            QueryIntent::List(CatalogBucket::Platforms)
        );
        assert_eq!(analyze_question("list all ages"), QueryIntent::Help);
    }

    #[test]
    fn test_help_fallback() {
        assert_eq!(analyze_question("hello"), QueryIntent::Help);
        assert_eq!(analyze_question(""), QueryIntent::Help);
    }
}
