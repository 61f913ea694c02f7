//! Multi-stage near-duplicate detection for batches of news articles.
//!
//! Stages run cheapest first, each on the previous stage's survivors:
//! canonical URL identity, title word overlap, then embedding similarity with
//! lexical tie-breaking. Every stage keeps its "seen" state local to one run.

pub mod canonical;
pub mod config;
pub mod merge;
pub mod semantic;
pub mod title;
pub mod url_stage;

#[cfg(test)]
mod tests;

pub use canonical::{canonical_url, urls_similar};
pub use config::{DedupConfig, FinalPassConfig, SemanticRules};
pub use merge::{prefer, Keep};
pub use semantic::{
    classify, dedupe_by_semantics, explain_pair, pair_survivor, run_semantic_stage,
    DuplicateRule, PairVerdict, SemanticOutcome,
};
pub use title::dedupe_by_title;
pub use url_stage::dedupe_by_url;

use tracing::info;

use crate::article::Article;
use crate::text::titles_similar;
use crate::vector::EmbeddingProvider;
use crate::TARGET_DEDUP;

/// Counts of what each stage removed in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupReport {
    pub input: usize,
    pub url_removed: usize,
    pub title_removed: usize,
    pub semantic_removed: usize,
    pub semantic: SemanticOutcome,
}

impl DedupReport {
    pub fn total_removed(&self) -> usize {
        self.url_removed + self.title_removed + self.semantic_removed
    }

    pub fn output(&self) -> usize {
        self.input - self.total_removed()
    }
}

/// Restore input order after a stage moved survivors between slots.
pub(crate) fn into_input_order(mut kept: Vec<(usize, Article)>) -> Vec<Article> {
    kept.sort_by_key(|(index, _)| *index);
    kept.into_iter().map(|(_, article)| article).collect()
}

/// Run URL, title and semantic deduplication in order and report per-stage counts.
///
/// Never fails: without a working embedding provider the title stage's
/// survivors are returned.
pub fn deduplicate_with_report(
    articles: Vec<Article>,
    provider: Option<&dyn EmbeddingProvider>,
    config: &DedupConfig,
) -> (Vec<Article>, DedupReport) {
    let input = articles.len();
    if articles.is_empty() {
        return (
            articles,
            DedupReport {
                input,
                url_removed: 0,
                title_removed: 0,
                semantic_removed: 0,
                semantic: SemanticOutcome::NotNeeded,
            },
        );
    }

    let by_url = dedupe_by_url(articles);
    let url_removed = input - by_url.len();

    let after_url = by_url.len();
    let by_title = dedupe_by_title(by_url, config.title_threshold);
    let title_removed = after_url - by_title.len();

    let pass = run_semantic_stage(by_title, provider, config.semantic_threshold, &config.rules);

    let report = DedupReport {
        input,
        url_removed,
        title_removed,
        semantic_removed: pass.removed,
        semantic: pass.outcome,
    };
    if report.total_removed() > 0 {
        info!(target: TARGET_DEDUP,
            "Total duplicates removed: {} (kept {} unique articles)",
            report.total_removed(),
            pass.articles.len()
        );
    }

    (pass.articles, report)
}

/// Deduplicate a batch of articles. The output is a subsequence of the input.
pub fn deduplicate(
    articles: Vec<Article>,
    provider: Option<&dyn EmbeddingProvider>,
    config: &DedupConfig,
) -> Vec<Article> {
    deduplicate_with_report(articles, provider, config).0
}

/// Re-check an already selected set with more aggressive thresholds, then top
/// it back up to `select_count` from `pool`.
///
/// Selections no larger than `config.min_articles` are trusted and skip the
/// deduplication. Backfilled articles come from `pool` in order; articles of the
/// selection itself are never re-added, nor anything title-similar to the result.
pub fn final_pass(
    selected: Vec<Article>,
    pool: &[Article],
    select_count: usize,
    provider: Option<&dyn EmbeddingProvider>,
    config: &FinalPassConfig,
) -> Vec<Article> {
    let judged = selected.clone();
    let mut result = if selected.len() <= config.min_articles {
        info!(target: TARGET_DEDUP,
            "Using {} selected stories as-is (skipping final deduplication)",
            selected.len()
        );
        selected
    } else {
        info!(target: TARGET_DEDUP,
            "Performing final deduplication check on {} selected stories",
            selected.len()
        );
        deduplicate(selected, provider, &config.dedup_config())
    };

    if result.len() < select_count && result.len() < pool.len() {
        let before = result.len();
        for article in pool {
            if result.len() >= select_count {
                break;
            }
            let already_covered = judged.contains(article)
                || result.contains(article)
                || result.iter().any(|kept| {
                    titles_similar(&kept.title, &article.title, config.title_threshold)
                });
            if !already_covered {
                result.push(article.clone());
            }
        }
        if result.len() > before {
            info!(target: TARGET_DEDUP,
                "Backfilled {} stories after final deduplication",
                result.len() - before
            );
        }
    }

    result.truncate(select_count);
    result
}
