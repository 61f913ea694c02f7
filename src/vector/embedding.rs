use anyhow::Result;
use candle_core::{DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{
    BertModel, Config as BertConfig, HiddenAct, PositionEmbeddingType,
};
use std::sync::Arc;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, error, info};

use super::config::E5Config;
use super::similarity::magnitude;
use super::EmbeddingProvider;
use crate::TARGET_VECTOR;

/// Local e5-large-v2 sentence embedder.
#[derive(Clone)]
pub struct E5Embedder {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    config: E5Config,
}

impl E5Embedder {
    /// Load model weights and tokenizer from the paths in `config`.
    ///
    /// Call [`E5Config::ensure_models_exist`] first when the files may be missing.
    pub fn load(config: E5Config) -> Result<Self> {
        let model = load_e5_model(&config)?;
        let tokenizer = load_e5_tokenizer(&config)?;
        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            config,
        })
    }

    /// Generate an embedding for a single text
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start_time = Instant::now();
        let device = &self.config.device;
        let prefixed_text = format!("{}{}", self.config.text_prefix, text);

        let encoding = self
            .tokenizer
            .encode(prefixed_text.as_str(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = self.config.token_limit();
        let input_ids: Vec<i64> = encoding
            .get_ids()
            .iter()
            .take(max_len)
            .map(|&x| x as i64)
            .collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .take(max_len)
            .map(|&x| x as i64)
            .collect();
        let token_count = input_ids.len();

        let input_ids = Tensor::new(input_ids, device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(attention_mask, device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        // [1, tokens, hidden]
        let hidden_state = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over the tokens the attention mask keeps
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed_hidden = hidden_state.broadcast_mul(&mask)?.sum(1)?;
        let valid_token_counts = mask.sum(1)?.clamp(1.0, f32::MAX)?;
        let mean_pooled = summed_hidden.broadcast_div(&valid_token_counts)?;

        // Normalize the vector
        let norm = mean_pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = mean_pooled.broadcast_div(&norm)?;

        let vector = normalized.squeeze(0)?.to_vec1::<f32>()?;

        if vector.len() != self.config.dimensions {
            return Err(anyhow::anyhow!(
                "Unexpected embedding dimensions: got {}, expected {}",
                vector.len(),
                self.config.dimensions
            ));
        }

        debug!(target: TARGET_VECTOR,
            "Embedded {} tokens in {:?}; Dimensions: {}; Vector magnitude: {:.6}; Original text length: {} chars",
            token_count,
            start_time.elapsed(),
            vector.len(),
            magnitude(&vector),
            text.len()
        );

        Ok(vector)
    }
}

impl EmbeddingProvider for E5Embedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start_time = Instant::now();
        let vectors = texts
            .iter()
            .map(|text| self.embed_one(text))
            .collect::<Result<Vec<_>>>()?;
        info!(target: TARGET_VECTOR,
            "Embedded {} texts in {:?}",
            vectors.len(),
            start_time.elapsed()
        );
        Ok(vectors)
    }
}

/// Load the E5 BERT weights from config
fn load_e5_model(config: &E5Config) -> Result<BertModel> {
    info!(target: TARGET_VECTOR, "Starting to load E5 model from {}", config.model_path);
    let bert_config = BertConfig {
        hidden_size: config.dimensions,
        intermediate_size: 4096,
        max_position_embeddings: config.max_length,
        num_attention_heads: 16,
        num_hidden_layers: 24,
        vocab_size: 30522,
        layer_norm_eps: 1e-12,
        pad_token_id: 0,
        hidden_act: HiddenAct::Gelu,
        hidden_dropout_prob: 0.0,
        type_vocab_size: 2,
        initializer_range: 0.02,
        position_embedding_type: PositionEmbeddingType::Absolute,
        use_cache: false,
        classifier_dropout: None,
        model_type: None,
    };

    let tensors = match candle_core::safetensors::load_buffer(
        &std::fs::read(&config.model_path)?,
        &config.device,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(target: TARGET_VECTOR, "!!! Failed to load model tensors: {}", e);
            return Err(anyhow::anyhow!("Failed to load model tensors"));
        }
    };

    let vb = VarBuilder::from_tensors(tensors, DType::F32, &config.device);

    let model = match BertModel::load(vb, &bert_config) {
        Ok(m) => m,
        Err(e) => {
            error!(target: TARGET_VECTOR, "!!! Failed to load BERT model: {}", e);
            return Err(anyhow::anyhow!("Failed to load BERT model"));
        }
    };

    info!(target: TARGET_VECTOR, "Successfully loaded E5 model");
    Ok(model)
}

/// Load the E5 tokenizer from config
fn load_e5_tokenizer(config: &E5Config) -> Result<Tokenizer> {
    info!(target: TARGET_VECTOR, "Starting to load E5 tokenizer from {}", config.tokenizer_path);

    match Tokenizer::from_file(&config.tokenizer_path) {
        Ok(t) => {
            info!(target: TARGET_VECTOR, "Successfully loaded E5 tokenizer");
            Ok(t)
        }
        Err(e) => {
            error!(target: TARGET_VECTOR, "!!! Failed to load tokenizer: {}", e);
            Err(anyhow::anyhow!("Failed to load tokenizer"))
        }
    }
}
