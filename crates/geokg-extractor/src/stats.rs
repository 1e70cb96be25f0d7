//! Build statistics
//!
//! Counters gathered while building a graph, plus a plain-text report.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Counters for one graph build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Documents processed
    pub documents: usize,
    /// Pages with non-blank text
    pub pages_scanned: usize,
    /// Blank pages
    pub pages_skipped: usize,
    /// Sentences holding at least one catalog match
    pub sentences_with_entities: usize,
    /// Mentions recorded from catalog matches
    pub occurrences: usize,
    /// Mentions added from pre-identified zones
    pub preidentified_mentions: usize,
    /// `co_mentioned` relations applied to the graph
    pub co_mentions: usize,
    /// Pattern-tagged relations applied to the graph
    pub pattern_relations: usize,
    /// Sentences whose entity set was truncated
    pub capped_sentences: usize,
    /// Nodes in the finished graph
    pub nodes: usize,
    /// Edges in the finished graph
    pub edges: usize,
}

impl BuildStats {
    /// Total mentions recorded
    pub fn mentions(&self) -> usize {
        self.occurrences + self.preidentified_mentions
    }

    /// Total relations applied
    pub fn relations(&self) -> usize {
        self.co_mentions + self.pattern_relations
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_report(&mut out);
        out
    }

    fn write_report(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "=== Graph Build Report ===")?;
        writeln!(out)?;
        writeln!(out, "Documents: {}", self.documents)?;
        writeln!(
            out,
            "Pages:     {} scanned | {} skipped",
            self.pages_scanned, self.pages_skipped
        )?;
        writeln!(out)?;
        writeln!(out, "Entities:")?;
        writeln!(out, "  Sentences with entities: {}", self.sentences_with_entities)?;
        writeln!(out, "  Catalog mentions:        {}", self.occurrences)?;
        writeln!(out, "  Pre-identified mentions: {}", self.preidentified_mentions)?;
        writeln!(out)?;
        writeln!(out, "Relations:")?;
        writeln!(out, "  Co-mentions:      {}", self.co_mentions)?;
        writeln!(out, "  Pattern matches:  {}", self.pattern_relations)?;
        writeln!(out, "  Capped sentences: {}", self.capped_sentences)?;
        writeln!(out)?;
        writeln!(out, "Graph: {} nodes | {} edges", self.nodes, self.edges)
    }
}
