//! The article record flowing through the deduplication pipeline.

use serde::{Deserialize, Serialize};

/// A news article as received from a fetcher. Never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "link")]
    pub url: String,
    #[serde(default, rename = "publishedAt", alias = "published_at", alias = "published")]
    pub published_at: String,
}

impl Article {
    pub fn new(title: &str, description: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            url: url.to_string(),
            published_at: String::new(),
        }
    }

    /// Description length in characters, the completeness measure for merges.
    pub fn description_len(&self) -> usize {
        self.description.chars().count()
    }

    /// Title and description joined the way they are embedded.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title.trim(), self.description.trim())
            .trim()
            .to_string()
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Whether there is anything to embed; articles without text skip the semantic stage.
    pub fn has_text(&self) -> bool {
        !self.combined_text().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text_trims_empty_parts() {
        let article = Article::new("  Floods hit Assam ", "", "");
        assert_eq!(article.combined_text(), "Floods hit Assam");

        let article = Article::new("", " Rain continues ", "");
        assert_eq!(article.combined_text(), "Rain continues");

        assert_eq!(Article::default().combined_text(), "");
        assert!(!Article::new("  ", " ", "https://n.com/a").has_text());
    }

    #[test]
    fn test_description_len_counts_characters() {
        let article = Article::new("t", "caf\u{e9}", "");
        assert_eq!(article.description_len(), 4);
        assert!(article.description.len() > 4);
    }

    #[test]
    fn test_deserialize_feed_field_names() {
        let json = r#"[
            {"title": "A", "description": "d", "link": "https://n.com/a", "publishedAt": "2024-07-01"},
            {"title": "B", "url": "https://n.com/b", "published": "2024-07-02"},
            {"title": "C"}
        ]"#;
        let articles: Vec<Article> = serde_json::from_str(json).unwrap();
        assert_eq!(articles[0].url, "https://n.com/a");
        assert_eq!(articles[0].published_at, "2024-07-01");
        assert_eq!(articles[1].url, "https://n.com/b");
        assert_eq!(articles[1].published_at, "2024-07-02");
        assert_eq!(articles[1].description, "");
        assert_eq!(articles[2].url, "");
    }
}
