//! Markdown summary of a build

use crate::catalog::{CatalogBucket, EntityCatalog};
use crate::store::KnowledgeGraph;
use crate::GraphStore;

/// Render statistics, per-bucket names (sorted) and the `top_n` most connected entities
pub fn render_summary(graph: &KnowledgeGraph, catalog: &EntityCatalog, top_n: usize) -> String {
    let mut out = String::from("# Geological Knowledge Graph Summary\n\n");

    out.push_str("## Graph Statistics\n\n");
    out.push_str(&format!("- **Build:** {}\n", graph.info().build_id));
    out.push_str(&format!(
        "- **Built at:** {}\n",
        graph.info().built_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- **Total Nodes:** {}\n", graph.node_count()));
    out.push_str(&format!("- **Total Relationships:** {}\n\n", graph.edge_count()));

    out.push_str("## Entity Types\n\n");
    for bucket in CatalogBucket::ALL {
        let mut names: Vec<&String> = catalog.bucket(bucket).iter().collect();
        names.sort();

        out.push_str(&format!("### {} ({})\n\n", title(bucket.label()), names.len()));
        for name in names {
            out.push_str(&format!("- {name}\n"));
        }
        out.push('\n');
    }

    out.push_str("## Most Connected Entities\n\n");
    for (id, degree) in graph.most_connected(top_n) {
        if let Some(node) = graph.node(id) {
            out.push_str(&format!(
                "- **{}** ({} connections)\n",
                node.canonical_name, degree
            ));
        }
    }

    out
}

fn title(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
