use std::collections::HashMap;
use tracing::{debug, info};

use super::canonical::canonical_url;
use super::into_input_order;
use super::merge::{prefer, Keep};
use crate::article::Article;
use crate::TARGET_DEDUP;

/// Collapse articles sharing a canonical URL, keeping the more complete one.
///
/// Articles with an empty or malformed URL pass through untouched.
pub fn dedupe_by_url(articles: Vec<Article>) -> Vec<Article> {
    let total = articles.len();
    let mut seen_urls: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<(usize, Article)> = Vec::with_capacity(total);

    for (index, article) in articles.into_iter().enumerate() {
        let Some(key) = canonical_url(&article.url) else {
            kept.push((index, article));
            continue;
        };

        match seen_urls.get(&key) {
            Some(&slot) => {
                let existing = &kept[slot].1;
                if prefer(existing.description_len(), article.description_len()) == Keep::Second {
                    debug!(target: TARGET_DEDUP,
                        "URL duplicate {}: replacing {:?} with more complete {:?}",
                        key, existing.title, article.title
                    );
                    kept[slot] = (index, article);
                } else {
                    debug!(target: TARGET_DEDUP,
                        "URL duplicate {}: dropping {:?}, keeping {:?}",
                        key, article.title, existing.title
                    );
                }
            }
            None => {
                seen_urls.insert(key, kept.len());
                kept.push((index, article));
            }
        }
    }

    let survivors = into_input_order(kept);
    let removed = total - survivors.len();
    if removed > 0 {
        info!(target: TARGET_DEDUP, "Removed {} duplicates by URL matching", removed);
    }
    survivors
}
