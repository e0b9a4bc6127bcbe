use anyhow::{Context, Result};
use cinematch_core::catalog::{read_records, Attribute, Catalog};
use cinematch_core::persist::{load_or_build, load_snapshot, save_snapshot, IndexPaths};
use cinematch_core::{RecommendError, Recommender, RecommenderConfig};
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a movie similarity index and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index snapshot from a JSON/JSONL catalog
    Build {
        /// Catalog file (.json array/object or .jsonl)
        #[arg(long)]
        catalog: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
        /// Optional JSON config overriding columns, weights, tokenizer and resolver
        #[arg(long)]
        config: Option<String>,
        /// Rebuild even when the existing snapshot matches the catalog
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Recommend titles similar to the given one from a built snapshot
    Recommend {
        /// Snapshot directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Title to look up; misspellings are resolved approximately
        #[arg(long)]
        title: String,
        /// Number of recommendations
        #[arg(short, long, default_value_t = 10)]
        k: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { catalog, output, config, force } => build_index(&catalog, &output, config.as_deref(), force),
        Commands::Recommend { index, title, k } => recommend(&index, &title, k),
    }
}

fn load_config(path: Option<&str>) -> Result<RecommenderConfig> {
    match path {
        Some(p) => Ok(RecommenderConfig::from_json_file(p)?),
        None => Ok(RecommenderConfig::default()),
    }
}

fn build_index(catalog_path: &str, output: &str, config_path: Option<&str>, force: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let records = read_records(Path::new(catalog_path))?;
    let catalog = Catalog::load(records, &config.schema);
    let paths = IndexPaths::new(output);

    let recommender = if force {
        let built = Recommender::build(catalog, config).context("building index")?;
        save_snapshot(&paths, &built)?;
        built
    } else {
        let (recommender, reused) = load_or_build(&paths, catalog, config)?;
        if reused {
            tracing::info!(output, "catalog unchanged; index snapshot reused");
        }
        recommender
    };

    let index = recommender.index();
    tracing::info!(
        output,
        items = index.len(),
        terms = index.vocabulary().len(),
        fingerprint = index.fingerprint(),
        "index build complete"
    );
    Ok(())
}

fn recommend(index_dir: &str, title: &str, k: usize) -> Result<()> {
    let recommender = load_snapshot(&IndexPaths::new(index_dir))?;
    match recommender.recommend(title, k) {
        Ok(recs) => {
            if recs.resolved.exact {
                println!("Movies similar to '{}':", recs.resolved.title);
            } else {
                println!(
                    "Showing results for '{}' (matched '{}' at {:.2}):",
                    recs.resolved.title, title.trim(), recs.resolved.ratio
                );
            }
            if recs.items.is_empty() {
                println!("  no other titles in the catalog");
            }
            for (rank, rec) in recs.items.iter().enumerate() {
                let item = &rec.item;
                println!(
                    "{:>3}. {:<40} {:.4}  {} | {} | {}",
                    rank + 1,
                    item.title,
                    rec.score,
                    item.attribute(Attribute::Genre),
                    item.attribute(Attribute::Director),
                    item.attribute(Attribute::LeadStar),
                );
            }
            Ok(())
        }
        Err(err @ RecommendError::EmptyQuery) => Err(anyhow::anyhow!("{err}; pass a title with --title")),
        Err(err @ RecommendError::NotFound { .. }) => Err(err.into()),
    }
}
