pub mod article;
pub mod dedup;
pub mod environment;
pub mod logging;
pub mod text;
pub mod vector;

pub const TARGET_DEDUP: &str = "dedup";
pub const TARGET_VECTOR: &str = "article-embeddings";

pub use article::Article;
pub use dedup::{
    deduplicate, deduplicate_with_report, final_pass, DedupConfig, DedupReport, FinalPassConfig,
    SemanticOutcome,
};
pub use vector::{EmbeddingProvider, EmbeddingUnavailable};
