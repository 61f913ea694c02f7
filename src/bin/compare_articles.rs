use anyhow::{bail, Context, Result};
use clap::Parser;
use newsdedup::dedup::{canonical_url, explain_pair, pair_survivor, DedupConfig};
use newsdedup::text::{normalize, titles_similar};
use newsdedup::vector::{embed_batch, E5Config, E5Embedder, EmbeddingProvider};
use newsdedup::Article;
use std::fs;
use std::path::PathBuf;

/// Explain why two articles are or are not treated as duplicates.
///
/// Example:
///    cargo run --bin compare_articles -- --input articles.json 3 7
///
/// Output format:
/// ```
/// Article Pair Analysis: #3 and #7
/// --------------------------------
/// Canonical URLs: https://news.com/a | https://news.com/b (different)
/// Titles similar at 0.85: no
///
/// URLs similar: no
/// Cosine similarity: 0.74
/// Key word overlap: 0.38
/// Titles similar at 0.75: no
///
/// RESULT: DUPLICATE (SUPPORTED_SIMILARITY)
/// Kept: #7 (longer text)
/// ```
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with an array of articles
    #[arg(short, long)]
    input: PathBuf,

    /// Index of the first article (0-based)
    first: usize,

    /// Index of the second article (0-based)
    second: usize,

    /// Cosine threshold to judge the pair with (defaults to DEDUP_SEMANTIC_THRESHOLD or 0.60)
    #[arg(long)]
    semantic_threshold: Option<f32>,

    /// Skip the embedding model; only URL and title signals are shown
    #[arg(long)]
    no_embeddings: bool,
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    newsdedup::logging::configure_logging();

    let cli = Cli::parse();
    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let articles: Vec<Article> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cli.input.display()))?;

    if cli.first == cli.second {
        bail!("Pick two different articles");
    }
    // The stage always judges the earlier article against the later one
    let (first, second) = (cli.first.min(cli.second), cli.first.max(cli.second));
    let (a, b) = match (articles.get(first), articles.get(second)) {
        (Some(a), Some(b)) => (a, b),
        _ => bail!(
            "Indices out of range: file holds {} articles",
            articles.len()
        ),
    };

    let mut config = DedupConfig::from_env();
    if let Some(t) = cli.semantic_threshold {
        config = config.with_semantic_threshold(t);
    }

    let header = format!("Article Pair Analysis: #{} and #{}", first, second);
    println!("{}", header);
    println!("{}", "-".repeat(header.len()));
    println!("A: {}", a.title);
    println!("B: {}", b.title);
    println!("Normalized: \"{}\" | \"{}\"", normalize(&a.title), normalize(&b.title));

    let canon_a = canonical_url(&a.url);
    let canon_b = canonical_url(&b.url);
    println!(
        "Canonical URLs: {} | {} ({})",
        canon_a.as_deref().unwrap_or("<none>"),
        canon_b.as_deref().unwrap_or("<none>"),
        if canon_a.is_some() && canon_a == canon_b {
            "same"
        } else {
            "different"
        }
    );
    println!(
        "Titles similar at {:.2}: {}",
        config.title_threshold,
        yes_no(titles_similar(&a.title, &b.title, config.title_threshold))
    );
    println!();

    if cli.no_embeddings {
        println!("Embeddings disabled; semantic signals not computed.");
        return Ok(());
    }
    if !a.has_text() || !b.has_text() {
        println!("RESULT: NOT COMPARED (no text to embed)");
        return Ok(());
    }

    let model_config = E5Config::from_env();
    model_config.ensure_models_exist().await?;
    let embedder = tokio::task::spawn_blocking(move || E5Embedder::load(model_config)).await??;

    let texts = vec![a.combined_text(), b.combined_text()];
    let vectors = embed_batch(Some(&embedder as &dyn EmbeddingProvider), &texts)?;
    let verdict = explain_pair(
        a,
        b,
        &vectors[0],
        &vectors[1],
        config.semantic_threshold,
        &config.rules,
    );

    println!("URLs similar: {}", yes_no(verdict.urls_similar));
    if let Some(cosine) = verdict.cosine {
        println!(
            "Cosine similarity: {:.2} (threshold is {:.2})",
            cosine, config.semantic_threshold
        );
    }
    if let Some(overlap) = verdict.key_overlap {
        println!("Key word overlap: {:.2}", overlap);
    }
    if let Some(similar) = verdict.title_similar {
        println!(
            "Titles similar at {:.2}: {}",
            config.rules.pair_title_threshold,
            yes_no(similar)
        );
    }
    println!();

    match verdict.rule {
        Some(rule) => {
            println!("RESULT: DUPLICATE ({})", rule);
            let kept = pair_survivor((first, a), (second, b));
            println!("Kept: #{} (longer text, earlier article on ties)", kept);
        }
        None => println!("RESULT: NOT A DUPLICATE"),
    }

    Ok(())
}
