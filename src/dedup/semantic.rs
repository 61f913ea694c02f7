use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use super::canonical::urls_similar;
use super::config::SemanticRules;
use super::into_input_order;
use super::merge::{prefer, Keep};
use crate::article::Article;
use crate::text::{key_words, overlap_ratio, titles_similar};
use crate::vector::{calculate_direct_similarity, embed_batch, EmbeddingProvider, EmbeddingUnavailable};
use crate::TARGET_DEDUP;

/// The rule that judged a pair to be duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateRule {
    /// Same host and path; the vectors were never compared.
    UrlMatch,
    /// Cosine above the stage threshold, backed by the titles, the key words or a high cosine.
    SupportedSimilarity,
    /// High cosine, or strong key-word overlap with a good cosine.
    StrongSimilarity,
}

impl fmt::Display for DuplicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateRule::UrlMatch => write!(f, "URL_MATCH"),
            DuplicateRule::SupportedSimilarity => write!(f, "SUPPORTED_SIMILARITY"),
            DuplicateRule::StrongSimilarity => write!(f, "STRONG_SIMILARITY"),
        }
    }
}

/// Every signal computed for one pair, and the rule that fired (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct PairVerdict {
    pub urls_similar: bool,
    // Lexical and vector signals are skipped once the URLs match
    pub cosine: Option<f32>,
    pub key_overlap: Option<f32>,
    pub title_similar: Option<bool>,
    pub rule: Option<DuplicateRule>,
}

impl PairVerdict {
    pub fn is_duplicate(&self) -> bool {
        self.rule.is_some()
    }
}

/// How the semantic stage ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Applied,
    /// Fewer than two articles had text to compare.
    NotNeeded,
    Skipped(EmbeddingUnavailable),
}

/// Survivors of the semantic stage plus how it went.
#[derive(Debug, Clone)]
pub struct SemanticPass {
    pub articles: Vec<Article>,
    pub removed: usize,
    pub outcome: SemanticOutcome,
}

struct Candidate {
    index: usize,
    article: Article,
    text: String,
    text_len: usize,
    key_words: HashSet<String>,
}

impl Candidate {
    fn new(index: usize, article: Article) -> Self {
        let text = article.combined_text();
        Self {
            index,
            text_len: text.chars().count(),
            key_words: key_words(&text),
            text,
            article,
        }
    }
}

/// Apply the layered rules to one pair's signals.
pub fn classify(
    cosine: f32,
    key_overlap: f32,
    title_similar: bool,
    threshold: f32,
    rules: &SemanticRules,
) -> Option<DuplicateRule> {
    let high = cosine >= rules.high_similarity;

    if cosine >= threshold
        && (title_similar
            || high
            || (key_overlap >= rules.key_overlap_corroborating
                && cosine >= rules.corroborated_floor))
    {
        return Some(DuplicateRule::SupportedSimilarity);
    }

    if high || (key_overlap >= rules.key_overlap_strong && cosine >= rules.strong_overlap_floor) {
        return Some(DuplicateRule::StrongSimilarity);
    }

    None
}

fn judge_pair(
    a: &Candidate,
    b: &Candidate,
    vec_a: &[f32],
    vec_b: &[f32],
    threshold: f32,
    rules: &SemanticRules,
) -> PairVerdict {
    if urls_similar(&a.article.url, &b.article.url, rules.min_url_path_len) {
        return PairVerdict {
            urls_similar: true,
            cosine: None,
            key_overlap: None,
            title_similar: None,
            rule: Some(DuplicateRule::UrlMatch),
        };
    }

    let cosine = calculate_direct_similarity(vec_a, vec_b).unwrap_or_else(|e| {
        debug!(target: TARGET_DEDUP, "Scoring pair as dissimilar: {}", e);
        0.0
    });
    let key_overlap = overlap_ratio(&a.key_words, &b.key_words);
    let title_similar = titles_similar(
        &a.article.title,
        &b.article.title,
        rules.pair_title_threshold,
    );

    PairVerdict {
        urls_similar: false,
        cosine: Some(cosine),
        key_overlap: Some(key_overlap),
        title_similar: Some(title_similar),
        rule: classify(cosine, key_overlap, title_similar, threshold, rules),
    }
}

/// Explain how the semantic stage judges two articles given their vectors.
pub fn explain_pair(
    a: &Article,
    b: &Article,
    vec_a: &[f32],
    vec_b: &[f32],
    threshold: f32,
    rules: &SemanticRules,
) -> PairVerdict {
    let a = Candidate::new(0, a.clone());
    let b = Candidate::new(1, b.clone());
    judge_pair(&a, &b, vec_a, vec_b, threshold, rules)
}

/// Input position the semantic stage keeps when the articles at two positions
/// are judged duplicates. The earlier position is compared first and wins ties.
pub fn pair_survivor(x: (usize, &Article), y: (usize, &Article)) -> usize {
    let (first, second) = if x.0 <= y.0 { (x, y) } else { (y, x) };
    let text_len = |article: &Article| article.combined_text().chars().count();
    match prefer(text_len(first.1), text_len(second.1)) {
        Keep::First => first.0,
        Keep::Second => second.0,
    }
}

/// Run the semantic stage with explicit rules and report the outcome.
///
/// Articles whose title and description are both empty take no part and pass
/// through. Any embedding problem leaves the input unchanged.
pub fn run_semantic_stage(
    articles: Vec<Article>,
    provider: Option<&dyn EmbeddingProvider>,
    threshold: f32,
    rules: &SemanticRules,
) -> SemanticPass {
    if provider.is_none() {
        info!(target: TARGET_DEDUP, "No embedding provider, skipping semantic duplicate detection");
        return SemanticPass {
            articles,
            removed: 0,
            outcome: SemanticOutcome::Skipped(EmbeddingUnavailable::NotConfigured),
        };
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut passthrough: Vec<(usize, Article)> = Vec::new();
    for (index, article) in articles.into_iter().enumerate() {
        if !article.has_text() {
            passthrough.push((index, article));
        } else {
            candidates.push(Candidate::new(index, article));
        }
    }

    if candidates.len() <= 1 {
        return SemanticPass {
            articles: reassemble(candidates, passthrough, &HashSet::new()),
            removed: 0,
            outcome: SemanticOutcome::NotNeeded,
        };
    }

    let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let vectors = match embed_batch(provider, &texts) {
        Ok(vectors) => vectors,
        Err(reason) => {
            warn!(target: TARGET_DEDUP,
                "Semantic duplicate detection unavailable ({}), using title-filtered results",
                reason
            );
            return SemanticPass {
                articles: reassemble(candidates, passthrough, &HashSet::new()),
                removed: 0,
                outcome: SemanticOutcome::Skipped(reason),
            };
        }
    };

    let mut removed: HashSet<usize> = HashSet::new();
    for i in 0..candidates.len() {
        if removed.contains(&i) {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if removed.contains(&j) {
                continue;
            }

            let (a, b) = (&candidates[i], &candidates[j]);
            let verdict = judge_pair(a, b, &vectors[i], &vectors[j], threshold, rules);
            let Some(rule) = verdict.rule else {
                continue;
            };

            let (kept, dropped) = match prefer(a.text_len, b.text_len) {
                Keep::First => (i, j),
                Keep::Second => (j, i),
            };
            debug!(target: TARGET_DEDUP,
                "Semantic duplicate ({}; cosine {:?}; key overlap {:?}): dropping {:?}, keeping {:?}",
                rule,
                verdict.cosine,
                verdict.key_overlap,
                candidates[dropped].article.title,
                candidates[kept].article.title
            );
            removed.insert(dropped);

            if dropped == i {
                break;
            }
        }
    }

    let count = removed.len();
    if count > 0 {
        info!(target: TARGET_DEDUP, "Removed {} duplicates using semantic similarity", count);
    }

    SemanticPass {
        articles: reassemble(candidates, passthrough, &removed),
        removed: count,
        outcome: SemanticOutcome::Applied,
    }
}

/// Semantic stage with the default layered rules.
pub fn dedupe_by_semantics(
    articles: Vec<Article>,
    provider: Option<&dyn EmbeddingProvider>,
    threshold: f32,
) -> Vec<Article> {
    run_semantic_stage(articles, provider, threshold, &SemanticRules::default()).articles
}

fn reassemble(
    candidates: Vec<Candidate>,
    passthrough: Vec<(usize, Article)>,
    removed: &HashSet<usize>,
) -> Vec<Article> {
    let kept = candidates
        .into_iter()
        .enumerate()
        .filter(|(position, _)| !removed.contains(position))
        .map(|(_, c)| (c.index, c.article))
        .chain(passthrough)
        .collect();
    into_input_order(kept)
}
