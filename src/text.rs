//! Lexical helpers shared by the title and semantic stages.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Number of leading tokens of an article's text considered for key words.
pub const KEY_WORD_WINDOW: usize = 30;

/// Tokens this short (in characters) or shorter never count as key words.
pub const MAX_IGNORED_TOKEN_LEN: usize = 3;

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
        "did", "will", "would", "could", "should", "may", "might", "must", "can", "this",
        "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which",
        "who", "when", "where", "why", "how", "not", "no", "yes", "so", "if", "then", "than",
        "as", "up", "down", "out", "off", "over", "under", "again", "further", "once", "here",
        "there", "all", "each", "both", "few", "more", "most", "other", "some", "such", "only",
        "own", "same", "too", "very", "just", "now",
    ]
    .into_iter()
    .collect();
}

/// Lowercase, drop everything but alphanumerics and whitespace, collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word set of an already normalized string.
pub fn word_set(normalized: &str) -> HashSet<&str> {
    normalized.split_whitespace().collect()
}

/// Intersection over the larger set; 0.0 when either side is empty.
pub fn overlap_ratio<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f32 / a.len().max(b.len()) as f32
}

/// Title similarity over two already normalized titles.
pub fn normalized_titles_similar(norm1: &str, norm2: &str, threshold: f32) -> bool {
    if norm1 == norm2 {
        return true;
    }
    overlap_ratio(&word_set(norm1), &word_set(norm2)) >= threshold
}

/// Whether two raw titles are the same headline: identical once normalized, or
/// sharing at least `threshold` of the larger word set.
pub fn titles_similar(title1: &str, title2: &str, threshold: f32) -> bool {
    if title1.trim().is_empty() || title2.trim().is_empty() {
        return false;
    }
    normalized_titles_similar(&normalize(title1), &normalize(title2), threshold)
}

/// Topic-bearing words among the first tokens of `text`.
pub fn key_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .take(KEY_WORD_WINDOW)
        .filter(|w| !STOP_WORDS.contains(w) && w.chars().count() > MAX_IGNORED_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Key-word overlap between two combined article texts.
pub fn key_word_overlap(text1: &str, text2: &str) -> f32 {
    overlap_ratio(&key_words(text1), &key_words(text2))
}
