//! Ingestion binary: index the transcript and resume PDFs
//!
//! Run with: cargo run -p profile-rag --bin profile-rag-ingest

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use profile_rag::config::RagConfig;
use profile_rag::index::{LocalVectorIndex, VectorIndex};
use profile_rag::ingestion::IngestPipeline;
use profile_rag::providers::HfEmbedder;
use profile_rag::types::RetrievalFilter;

#[derive(Parser)]
#[command(name = "profile-rag-ingest")]
#[command(about = "Index the transcript and resume PDFs into the local vector store")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to PROFILE_RAG_CONFIG or ./profile-rag.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of source PDFs, overriding the configured one
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Re-index files even when their content hash is already stored
    #[arg(short, long)]
    force: bool,

    /// After indexing, run probe searches and print the retrieved chunks
    #[arg(long)]
    check_knowledge: bool,
}

/// Probe questions for the knowledge check, one per source document
const PROBE_QUESTIONS: &[&str] = &["What courses did he take?", "Where has he worked?"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => RagConfig::from_file(path)?,
        None => RagConfig::load()?,
    };
    if let Some(data_dir) = args.data_dir {
        config.ingestion.data_dir = data_dir;
    }

    tracing::info!("Data directory: {}", config.ingestion.data_dir.display());
    tracing::info!("Index: {}", config.index.storage_path.display());
    tracing::info!("Embedding model: {}", config.huggingface.embedding_model);

    let embedder = Arc::new(HfEmbedder::from_config(&config.huggingface)?);
    let index = LocalVectorIndex::open(&config.index, embedder)?;
    let pipeline = IngestPipeline::new(&config.chunking, &config.ingestion);

    // Parse and chunk every PDF, then index what changed
    let mut indexed = 0usize;
    let mut skipped = 0usize;

    for (doc, chunks) in pipeline.ingest_dir(&config.ingestion.data_dir)? {
        if !args.force && index.contains_hash(&doc.content_hash) {
            tracing::info!("{} is unchanged, skipping", doc.filename);
            skipped += 1;
            continue;
        }

        let filename = doc.filename.clone();
        let stored = index.replace_document(doc, chunks).await?;
        tracing::info!("Indexed {} ({} chunks)", filename, stored);
        indexed += 1;
    }

    let stats = index.stats();
    println!("\nIngestion finished");
    println!("  Documents indexed:  {} ({} unchanged)", indexed, skipped);
    println!("  Documents stored:   {}", stats.documents);
    println!("  Chunks stored:      {}", stats.chunks);
    println!("    transcript:       {}", stats.transcript_chunks);
    println!("    resume:           {}", stats.resume_chunks);

    if args.check_knowledge {
        check_knowledge(&index, config.pipeline.top_k).await?;
    }

    Ok(())
}

/// Run probe searches against the freshly built index and print what
/// comes back
async fn check_knowledge(index: &LocalVectorIndex, top_k: usize) -> anyhow::Result<()> {
    println!("\nKnowledge check");

    for question in PROBE_QUESTIONS {
        println!("  Probe: {}", question);
        let results = index
            .search(question, top_k, RetrievalFilter::Unfiltered)
            .await?;

        if results.is_empty() {
            println!("    (no chunks retrieved)");
            continue;
        }

        for result in results {
            let preview: String = result.chunk.content.chars().take(70).collect();
            println!(
                "    [{:.3}] {} | {}",
                result.similarity, result.chunk.source, preview
            );
        }
    }

    Ok(())
}
