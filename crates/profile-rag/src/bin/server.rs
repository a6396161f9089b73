//! Chat server binary
//!
//! Run with: cargo run -p profile-rag --bin profile-rag-server

use profile_rag::{config::RagConfig, server::ChatServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_rag=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Subject: {}", config.pipeline.subject);
    tracing::info!("  - Chat model: {}", config.groq.model);
    tracing::info!("  - Text2text model: {}", config.huggingface.text2text_model);
    tracing::info!("  - Embedding model: {}", config.huggingface.embedding_model);
    tracing::info!("  - Index: {}", config.index.storage_path.display());

    let address = format!("{}:{}", config.server.host, config.server.port);

    // Create and start server
    let server = ChatServer::new(config).await?;

    println!("\nServer starting...");
    println!("  Chat:   POST http://{}/api/chat/", address);
    println!("  Health: GET  http://{}/health", address);
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
