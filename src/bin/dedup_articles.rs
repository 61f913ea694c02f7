use anyhow::{Context, Result};
use clap::Parser;
use newsdedup::vector::{E5Config, E5Embedder, EmbeddingProvider};
use newsdedup::{deduplicate_with_report, final_pass, Article, DedupConfig, FinalPassConfig};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Remove duplicate stories from a JSON array of articles.
///
/// Example:
///    cargo run --bin dedup_articles -- --input articles.json --output unique.json
///    cargo run --bin dedup_articles -- --input selected.json --final-pass 12 --pool unique.json
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with an array of articles (title, description, url/link, publishedAt)
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the surviving articles; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Word-overlap threshold for the title stage (defaults to DEDUP_TITLE_THRESHOLD or 0.85)
    #[arg(long)]
    title_threshold: Option<f32>,

    /// Cosine threshold for the semantic stage (defaults to DEDUP_SEMANTIC_THRESHOLD or 0.60)
    #[arg(long)]
    semantic_threshold: Option<f32>,

    /// Skip loading the embedding model; only URL and title matching run
    #[arg(long)]
    no_embeddings: bool,

    /// Treat the input as a selection and run the final pass, keeping this many stories
    #[arg(long)]
    final_pass: Option<usize>,

    /// Articles to backfill from after the final pass
    #[arg(long, requires = "final_pass")]
    pool: Option<PathBuf>,
}

fn read_articles(path: &PathBuf) -> Result<Vec<Article>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read articles from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse articles in {}", path.display()))
}

/// Load the E5 model, downloading it on first use. A failure only disables the
/// semantic stage.
async fn load_embedder() -> Option<E5Embedder> {
    let config = E5Config::from_env();
    if let Err(e) = config.ensure_models_exist().await {
        warn!("Could not fetch embedding model, continuing without it: {:?}", e);
        return None;
    }
    match tokio::task::spawn_blocking(move || E5Embedder::load(config)).await {
        Ok(Ok(embedder)) => Some(embedder),
        Ok(Err(e)) => {
            warn!("Could not load embedding model, continuing without it: {:?}", e);
            None
        }
        Err(e) => {
            warn!("Embedding model loader panicked: {:?}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    newsdedup::logging::configure_logging();

    let cli = Cli::parse();
    let articles = read_articles(&cli.input)?;
    info!("Loaded {} articles from {}", articles.len(), cli.input.display());

    let embedder = if cli.no_embeddings {
        None
    } else {
        load_embedder().await
    };
    let provider = embedder.as_ref().map(|e| e as &dyn EmbeddingProvider);

    let survivors = match cli.final_pass {
        Some(select_count) => {
            let pool = match &cli.pool {
                Some(path) => read_articles(path)?,
                None => Vec::new(),
            };
            let mut config = FinalPassConfig::from_env();
            if let Some(t) = cli.title_threshold {
                config = config.with_title_threshold(t);
            }
            if let Some(t) = cli.semantic_threshold {
                config = config.with_semantic_threshold(t);
            }
            let input = articles.len();
            let result = final_pass(articles, &pool, select_count, provider, &config);
            eprintln!("Final pass: {} selected -> {} stories", input, result.len());
            result
        }
        None => {
            let mut config = DedupConfig::from_env();
            if let Some(t) = cli.title_threshold {
                config = config.with_title_threshold(t);
            }
            if let Some(t) = cli.semantic_threshold {
                config = config.with_semantic_threshold(t);
            }
            let (survivors, report) = deduplicate_with_report(articles, provider, &config);
            eprintln!("Articles in:          {}", report.input);
            eprintln!("Removed by URL:       {}", report.url_removed);
            eprintln!("Removed by title:     {}", report.title_removed);
            eprintln!("Removed by semantics: {} ({:?})", report.semantic_removed, report.semantic);
            eprintln!("Articles out:         {}", report.output());
            survivors
        }
    };

    let json = serde_json::to_string_pretty(&survivors)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} articles to {}", survivors.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
