use tracing::warn;

use crate::environment::get_env_var_or;

/// Title threshold of the main title stage.
pub const DEFAULT_TITLE_THRESHOLD: f32 = 0.85;
/// Cosine threshold of the semantic stage.
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.60;

/// Clamp a threshold into [0, 1]. Non-finite values keep `current`.
fn sanitize_threshold(name: &str, value: f32, current: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        warn!("Ignoring non-finite {} {}, keeping {}", name, value, current);
        current
    }
}

/// Layered decision constants of the semantic stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticRules {
    /// Looser title threshold applied to a single pair's titles.
    pub pair_title_threshold: f32,
    /// Cosine high enough to merge without lexical corroboration.
    pub high_similarity: f32,
    /// Key-word overlap that corroborates a cosine above `corroborated_floor`.
    pub key_overlap_corroborating: f32,
    pub corroborated_floor: f32,
    /// Key-word overlap strong enough to merge with a cosine above `strong_overlap_floor`.
    pub key_overlap_strong: f32,
    pub strong_overlap_floor: f32,
    /// URL paths at most this long never match once a numeric suffix is dropped.
    pub min_url_path_len: usize,
}

impl Default for SemanticRules {
    fn default() -> Self {
        Self {
            pair_title_threshold: 0.75,
            high_similarity: 0.70,
            key_overlap_corroborating: 0.35,
            corroborated_floor: 0.60,
            key_overlap_strong: 0.45,
            strong_overlap_floor: 0.65,
            min_url_path_len: 10,
        }
    }
}

/// Thresholds for one deduplication run.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    pub title_threshold: f32,
    pub semantic_threshold: f32,
    pub rules: SemanticRules,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_threshold: DEFAULT_TITLE_THRESHOLD,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            rules: SemanticRules::default(),
        }
    }
}

impl DedupConfig {
    /// Defaults overridden by `DEDUP_TITLE_THRESHOLD` / `DEDUP_SEMANTIC_THRESHOLD`.
    pub fn from_env() -> Self {
        Self::default()
            .with_title_threshold(get_env_var_or(
                "DEDUP_TITLE_THRESHOLD",
                DEFAULT_TITLE_THRESHOLD,
            ))
            .with_semantic_threshold(get_env_var_or(
                "DEDUP_SEMANTIC_THRESHOLD",
                DEFAULT_SEMANTIC_THRESHOLD,
            ))
    }

    pub fn with_title_threshold(mut self, threshold: f32) -> Self {
        self.title_threshold =
            sanitize_threshold("title threshold", threshold, self.title_threshold);
        self
    }

    pub fn with_semantic_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold =
            sanitize_threshold("semantic threshold", threshold, self.semantic_threshold);
        self
    }
}

/// Settings for the more aggressive pass run over an already selected set.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalPassConfig {
    /// Selections of this size or smaller are trusted as-is.
    pub min_articles: usize,
    pub title_threshold: f32,
    pub semantic_threshold: f32,
}

impl Default for FinalPassConfig {
    fn default() -> Self {
        Self {
            min_articles: 10,
            title_threshold: DEFAULT_TITLE_THRESHOLD,
            semantic_threshold: 0.55,
        }
    }
}

impl FinalPassConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_articles: get_env_var_or("DEDUP_FINAL_PASS_MIN_ARTICLES", defaults.min_articles),
            ..defaults
        }
        .with_title_threshold(get_env_var_or(
            "DEDUP_FINAL_PASS_TITLE_THRESHOLD",
            defaults.title_threshold,
        ))
        .with_semantic_threshold(get_env_var_or(
            "DEDUP_FINAL_PASS_SEMANTIC_THRESHOLD",
            defaults.semantic_threshold,
        ))
    }

    pub fn with_title_threshold(mut self, threshold: f32) -> Self {
        self.title_threshold =
            sanitize_threshold("final pass title threshold", threshold, self.title_threshold);
        self
    }

    pub fn with_semantic_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = sanitize_threshold(
            "final pass semantic threshold",
            threshold,
            self.semantic_threshold,
        );
        self
    }

    /// The pipeline configuration this pass runs with.
    pub fn dedup_config(&self) -> DedupConfig {
        DedupConfig::default()
            .with_title_threshold(self.title_threshold)
            .with_semantic_threshold(self.semantic_threshold)
    }
}
