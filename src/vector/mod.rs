// Embedding provider seam and vector math for the semantic stage
pub const MODEL_URL: &str =
    "https://huggingface.co/intfloat/e5-large-v2/resolve/main/model.safetensors";
pub const TOKENIZER_URL: &str =
    "https://huggingface.co/intfloat/e5-large-v2/resolve/main/tokenizer.json";

use std::fmt;
use tracing::{info, warn};

pub mod config;
pub mod embedding;
pub mod similarity;

// Re-export main components
pub use config::*;
pub use embedding::*;
pub use similarity::*;

use crate::TARGET_VECTOR;

/// Anything that turns a batch of texts into fixed-length vectors.
///
/// Implementations may batch internally; the engine calls `encode` at most once
/// per deduplication run with every text that needs a vector.
pub trait EmbeddingProvider {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

impl<F> EmbeddingProvider for F
where
    F: Fn(&[String]) -> anyhow::Result<Vec<Vec<f32>>>,
{
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self(texts)
    }
}

/// Why the semantic stage could not get usable vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingUnavailable {
    NotConfigured,
    EncodeFailed(String),
    PartialBatch { expected: usize, received: usize },
    DimensionMismatch { expected: usize, found: usize },
    EmptyVectors,
}

impl fmt::Display for EmbeddingUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingUnavailable::NotConfigured => write!(f, "no embedding provider configured"),
            EmbeddingUnavailable::EncodeFailed(e) => write!(f, "embedding call failed: {}", e),
            EmbeddingUnavailable::PartialBatch { expected, received } => write!(
                f,
                "embedding returned {} vectors for {} texts",
                received, expected
            ),
            EmbeddingUnavailable::DimensionMismatch { expected, found } => write!(
                f,
                "embedding dimensions don't match: {} vs {}",
                expected, found
            ),
            EmbeddingUnavailable::EmptyVectors => write!(f, "embedding returned empty vectors"),
        }
    }
}

impl std::error::Error for EmbeddingUnavailable {}

/// Encode `texts` in one call and validate the batch.
///
/// Any failure, including a short batch, is reported as unavailable: a partial
/// batch cannot be aligned with its texts safely.
pub fn embed_batch(
    provider: Option<&dyn EmbeddingProvider>,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingUnavailable> {
    let provider = provider.ok_or(EmbeddingUnavailable::NotConfigured)?;

    let vectors = provider.encode(texts).map_err(|e| {
        warn!(target: TARGET_VECTOR, "Embedding call failed for {} texts: {:?}", texts.len(), e);
        EmbeddingUnavailable::EncodeFailed(e.to_string())
    })?;

    if vectors.len() != texts.len() {
        return Err(EmbeddingUnavailable::PartialBatch {
            expected: texts.len(),
            received: vectors.len(),
        });
    }

    let dimensions = match vectors.first() {
        Some(v) if !v.is_empty() => v.len(),
        Some(_) => return Err(EmbeddingUnavailable::EmptyVectors),
        None => return Ok(vectors),
    };
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(EmbeddingUnavailable::DimensionMismatch {
            expected: dimensions,
            found: bad.len(),
        });
    }

    info!(target: TARGET_VECTOR, "Embedded {} texts ({} dimensions)", vectors.len(), dimensions);
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {}", i)).collect()
    }

    #[test]
    fn test_missing_provider() {
        assert_eq!(
            embed_batch(None, &texts(2)),
            Err(EmbeddingUnavailable::NotConfigured)
        );
    }

    #[test]
    fn test_closure_provider() {
        let provider = |texts: &[String]| -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        };
        let vectors = embed_batch(Some(&provider), &texts(3)).unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vec![6.0, 1.0]);
    }

    #[test]
    fn test_failing_provider() {
        let provider = |_: &[String]| -> anyhow::Result<Vec<Vec<f32>>> {
            Err(anyhow::anyhow!("model not loaded"))
        };
        match embed_batch(Some(&provider), &texts(2)) {
            Err(EmbeddingUnavailable::EncodeFailed(msg)) => assert!(msg.contains("model not loaded")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_partial_batch() {
        let provider = |_: &[String]| -> anyhow::Result<Vec<Vec<f32>>> { Ok(vec![vec![1.0, 0.0]]) };
        assert_eq!(
            embed_batch(Some(&provider), &texts(3)),
            Err(EmbeddingUnavailable::PartialBatch {
                expected: 3,
                received: 1
            })
        );
    }

    #[test]
    fn test_inconsistent_dimensions() {
        let provider = |_: &[String]| -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]])
        };
        assert_eq!(
            embed_batch(Some(&provider), &texts(2)),
            Err(EmbeddingUnavailable::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );

        let provider = |_: &[String]| -> anyhow::Result<Vec<Vec<f32>>> { Ok(vec![vec![], vec![]]) };
        assert_eq!(
            embed_batch(Some(&provider), &texts(2)),
            Err(EmbeddingUnavailable::EmptyVectors)
        );
    }
}
