//! GeoKG CLI - Command-line interface
//!
//! Usage:
//!   geokg build <input.json> [--output DIR] [--terms FILE]
//!   geokg ask <question>
//!   geokg find <term>
//!   geokg describe <name>
//!   geokg stats
//!   geokg interactive
//!   geokg demo

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use geokg_core::{AppConfig, KnowledgeBase, LoggingConfig};
use geokg_extractor::{BuildOutput, GraphBuilder};
use geokg_graph::{render_summary, EntityCatalog, KnowledgeGraph};
use geokg_query::{QueryEngine, SAMPLE_QUESTIONS};

const GRAPH_FILE: &str = "geological_graph.json";
const CATALOG_FILE: &str = "entity_catalog.json";
const SUMMARY_FILE: &str = "graph_summary.md";

#[derive(Parser)]
#[command(name = "geokg")]
#[command(about = "Geological knowledge graph builder and query tool")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GraphArgs {
    /// Directory holding a built graph (default: output.dir)
    #[arg(long)]
    graph: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the knowledge graph from ingestion JSON
    Build {
        /// Ingestion output (document id -> pages)
        input: PathBuf,
        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,
        /// Custom terminology catalog (TOML)
        #[arg(long)]
        terms: Option<PathBuf>,
    },
    /// Ask a question
    Ask {
        question: String,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Find entities by name
    Find {
        term: String,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Describe an entity and its connections
    Describe {
        name: String,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Show graph statistics
    Stats {
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Interactive question loop
    Interactive {
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Answer the preset sample questions
    Demo {
        #[command(flatten)]
        graph: GraphArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Build {
            input,
            output,
            terms,
        } => build(&config, &input, output, terms).await?,
        Commands::Ask { question, graph } => {
            let engine = load_engine(&config, &graph).await?;
            println!("{}", engine.answer_question(&question));
        }
        Commands::Find { term, graph } => {
            let engine = load_engine(&config, &graph).await?;
            let matches = engine.find_entities(&term);
            if matches.is_empty() {
                println!("No entities match '{term}'");
            }
            for m in matches {
                match &m.source_name {
                    Some(source) => println!(
                        "{} ({}) [{}] - {} mentions",
                        m.name, source, m.entity_type, m.mention_count
                    ),
                    None => println!("{} [{}] - {} mentions", m.name, m.entity_type, m.mention_count),
                }
            }
        }
        Commands::Describe { name, graph } => {
            let engine = load_engine(&config, &graph).await?;
            println!("{}", engine.describe_entity(&name));
        }
        Commands::Stats { graph } => {
            let engine = load_engine(&config, &graph).await?;
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
        }
        Commands::Interactive { graph } => {
            let engine = load_engine(&config, &graph).await?;
            interactive(&engine).await?;
        }
        Commands::Demo { graph } => {
            let engine = load_engine(&config, &graph).await?;
            demo(&engine);
        }
    }

    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build(
    config: &AppConfig,
    input: &Path,
    output: Option<PathBuf>,
    terms: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read ingestion data from {}", input.display()))?;
    let knowledge_base = KnowledgeBase::from_json_str(&content)?;

    let mut extraction = config.extraction.clone();
    if terms.is_some() {
        extraction.terminology_file = terms;
    }

    let BuildOutput {
        graph,
        catalog,
        stats,
    } = GraphBuilder::from_config(&extraction)?.build(&knowledge_base)?;

    let dir = output.unwrap_or_else(|| config.output.dir.clone());
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let snapshot = graph.to_json_string()?;
    let catalog_json = catalog.to_json_string()?;
    let summary = render_summary(&graph, &catalog, config.output.top_connected);

    tokio::try_join!(
        tokio::fs::write(dir.join(GRAPH_FILE), snapshot),
        tokio::fs::write(dir.join(CATALOG_FILE), catalog_json),
        tokio::fs::write(dir.join(SUMMARY_FILE), summary),
    )
    .with_context(|| format!("Failed to write graph artifacts to {}", dir.display()))?;

    info!(dir = %dir.display(), build_id = %graph.info().build_id, "Saved knowledge graph");
    println!("{}", stats.report());
    Ok(())
}

async fn load_engine(config: &AppConfig, args: &GraphArgs) -> anyhow::Result<QueryEngine> {
    let dir = args.graph.clone().unwrap_or_else(|| config.output.dir.clone());

    let snapshot_path = dir.join(GRAPH_FILE);
    let snapshot = tokio::fs::read_to_string(&snapshot_path)
        .await
        .with_context(|| format!("No graph found at {}", snapshot_path.display()))?;
    let graph = KnowledgeGraph::from_json_str(&snapshot)?;

    let mut engine = QueryEngine::new(graph).with_config(config.query.clone());

    // A saved catalog is optional; without it the engine derives one
    if let Ok(content) = tokio::fs::read_to_string(dir.join(CATALOG_FILE)).await {
        let catalog: EntityCatalog = serde_json::from_str(&content)
            .with_context(|| format!("Malformed {CATALOG_FILE} in {}", dir.display()))?;
        engine = engine.with_catalog(catalog);
    }

    let stats = engine.stats();
    info!(
        nodes = stats.nodes,
        edges = stats.edges,
        build_id = %stats.info.build_id,
        "Loaded knowledge graph"
    );
    Ok(engine)
}

fn demo(engine: &QueryEngine) {
    let rule = "=".repeat(80);
    println!("{rule}\nDEMONSTRATION: GEOLOGICAL KNOWLEDGE SYSTEM\n{rule}");

    for (question, answer) in engine.sample_answers() {
        println!("\nQ: {question}");
        println!("A:\n{answer}");
        println!("{}", "-".repeat(80));
    }
}

async fn interactive(engine: &QueryEngine) -> anyhow::Result<()> {
    let stats = engine.stats();
    println!("ROMANIAN PETROLEUM GEOLOGY ASSISTANT");
    println!(
        "Knowledge base: {} entities, {} relationships",
        stats.nodes, stats.edges
    );
    println!("Type 'exit' to quit, 'help' for suggestions");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        match question.to_lowercase().as_str() {
            "exit" | "quit" | "q" => break,
            "help" => {
                println!("Try these questions:");
                for sample in SAMPLE_QUESTIONS {
                    println!("  - {sample}");
                }
            }
            _ => println!("{}", engine.answer_question(question)),
        }
    }

    println!("Goodbye!");
    Ok(())
}
