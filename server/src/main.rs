use anyhow::Result;
use axum::Router;
use clap::Parser;
use policy_core::persist::{load_meta, ArtifactPaths};
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Artifact directory written by the indexer
    #[arg(long, default_value = "./index")]
    index: String,
    /// Model artifact path (default: <index>/policy_vectorizer.bin)
    #[arg(long)]
    model: Option<PathBuf>,
    /// Corpus matrix artifact path (default: <index>/policy_tfidf_matrix.bin)
    #[arg(long)]
    matrix: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Cached queries per generation (0 disables the cache)
    #[arg(long, default_value_t = 1024)]
    cache_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let paths = ArtifactPaths::new(&args.index);
    match load_meta(&paths) {
        Ok(meta) => tracing::info!(num_docs = meta.num_docs, created_at = %meta.created_at, "index metadata"),
        Err(e) => tracing::debug!(error = %e, "no index metadata"),
    }
    let config = ServerConfig {
        model_path: args.model.unwrap_or_else(|| paths.model()),
        matrix_path: args.matrix.unwrap_or_else(|| paths.corpus()),
        cache_capacity: args.cache_capacity,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
