use tracing::{debug, info};

use super::into_input_order;
use super::merge::{prefer, Keep};
use crate::article::Article;
use crate::text::{normalize, normalized_titles_similar};
use crate::TARGET_DEDUP;

struct KeptTitle {
    index: usize,
    normalized: String,
    article: Article,
}

/// Collapse articles whose normalized titles are identical or overlap by at
/// least `threshold` of the larger word set.
///
/// Each title is checked against the kept titles in the order they were kept and
/// merges into the first match. A more complete newcomer only takes over the
/// match's slot when its own title collides with no other kept title, so the
/// surviving titles stay pairwise dissimilar.
///
/// This means a longer duplicate can lose: when its title bridges two kept
/// titles that are dissimilar to each other, the newcomer is dropped and both
/// kept articles stay.
pub fn dedupe_by_title(articles: Vec<Article>, threshold: f32) -> Vec<Article> {
    let total = articles.len();
    let mut titled: Vec<KeptTitle> = Vec::new();
    let mut untitled: Vec<(usize, Article)> = Vec::new();

    for (index, article) in articles.into_iter().enumerate() {
        if !article.has_title() {
            untitled.push((index, article));
            continue;
        }
        let normalized = normalize(&article.title);

        let matched = titled
            .iter()
            .position(|kept| normalized_titles_similar(&normalized, &kept.normalized, threshold));
        let Some(slot) = matched else {
            titled.push(KeptTitle {
                index,
                normalized,
                article,
            });
            continue;
        };

        let existing = &titled[slot];
        let more_complete =
            prefer(existing.article.description_len(), article.description_len()) == Keep::Second;
        let collides_elsewhere = titled.iter().enumerate().any(|(other, kept)| {
            other != slot && normalized_titles_similar(&normalized, &kept.normalized, threshold)
        });

        if more_complete && !collides_elsewhere {
            debug!(target: TARGET_DEDUP,
                "Similar title: replacing {:?} with more complete {:?}",
                existing.article.title, article.title
            );
            titled[slot] = KeptTitle {
                index,
                normalized,
                article,
            };
        } else {
            debug!(target: TARGET_DEDUP,
                "Similar title: dropping {:?}, keeping {:?}",
                article.title, existing.article.title
            );
        }
    }

    let kept = titled
        .into_iter()
        .map(|kept| (kept.index, kept.article))
        .chain(untitled)
        .collect();
    let survivors = into_input_order(kept);

    let removed = total - survivors.len();
    if removed > 0 {
        info!(target: TARGET_DEDUP, "Removed {} duplicates by title similarity", removed);
    }
    survivors
}
