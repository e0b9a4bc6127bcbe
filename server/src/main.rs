use anyhow::Result;
use axum::Router;
use cinematch_core::RecommenderConfig;
use cinematch_server::{build_app, ServerSettings};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Catalog file (.json array/object or .jsonl)
    #[arg(long, default_value = "./movies.json")]
    catalog: PathBuf,
    /// Directory for the memoized index snapshot
    #[arg(long)]
    index: Option<PathBuf>,
    /// Optional JSON config overriding columns, weights, tokenizer and resolver
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RecommenderConfig::from_json_file(path)?,
        None => RecommenderConfig::default(),
    };
    let settings = ServerSettings {
        catalog: args.catalog.clone(),
        cache_dir: args.index.clone(),
        config,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(settings)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
