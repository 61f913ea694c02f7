use anyhow::Result;
use candle_core::Device;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::environment::{get_env_var_or, get_env_var_string};
use crate::TARGET_VECTOR;

/// Configuration struct for the E5 embedding model
#[derive(Debug, Clone)]
pub struct E5Config {
    pub model_path: String,
    pub tokenizer_path: String,
    pub dimensions: usize,
    pub max_length: usize,
    /// E5 expects every input to carry a role prefix; "query: " suits symmetric comparison.
    pub text_prefix: String,
    pub device: Device,
}

impl Default for E5Config {
    fn default() -> Self {
        Self {
            model_path: "models/e5-large-v2.safetensors".to_string(),
            tokenizer_path: "models/e5-tokenizer.json".to_string(),
            dimensions: 1024,
            max_length: 512,
            text_prefix: "query: ".to_string(),
            device: Device::Cpu,
        }
    }
}

impl E5Config {
    /// Default configuration overridden by `E5_MODEL_PATH`, `E5_TOKENIZER_PATH` and `E5_MAX_LENGTH`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_path: get_env_var_string("E5_MODEL_PATH", &defaults.model_path),
            tokenizer_path: get_env_var_string("E5_TOKENIZER_PATH", &defaults.tokenizer_path),
            max_length: match get_env_var_or("E5_MAX_LENGTH", defaults.max_length) {
                0 => {
                    warn!(target: TARGET_VECTOR,
                        "E5_MAX_LENGTH must be positive, using {}", defaults.max_length
                    );
                    defaults.max_length
                }
                max_length => max_length,
            },
            ..defaults
        }
    }

    /// Tokens fed to the model, one below `max_length` and never zero.
    pub fn token_limit(&self) -> usize {
        self.max_length.saturating_sub(1).max(1)
    }

    pub async fn ensure_models_exist(&self) -> Result<()> {
        download_if_missing(&self.model_path, crate::vector::MODEL_URL).await?;
        download_if_missing(&self.tokenizer_path, crate::vector::TOKENIZER_URL).await?;
        Ok(())
    }
}

async fn download_if_missing(path: &str, source_url: &str) -> Result<()> {
    if Path::new(path).exists() {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    info!(target: TARGET_VECTOR, "Downloading {} to {}", source_url, path);
    let response = reqwest::get(source_url).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    fs::write(path, &bytes).await?;
    info!(target: TARGET_VECTOR, "Downloaded {} bytes to {}", bytes.len(), path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = E5Config::default();
        assert_eq!(config.dimensions, 1024);
        assert_eq!(config.max_length, 512);
        assert!(config.text_prefix.ends_with(": "));
        assert_eq!(config.token_limit(), 511);
    }

    #[test]
    fn test_zero_max_length() {
        let config = E5Config {
            max_length: 0,
            ..E5Config::default()
        };
        assert_eq!(config.token_limit(), 1);

        std::env::set_var("E5_MAX_LENGTH", "0");
        let config = E5Config::from_env();
        std::env::remove_var("E5_MAX_LENGTH");
        assert_eq!(config.max_length, 512);
    }

    #[tokio::test]
    async fn test_existing_files_are_not_downloaded() {
        let dir = std::env::temp_dir().join(format!("newsdedup-e5-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let model = dir.join("model.safetensors");
        let tokenizer = dir.join("tokenizer.json");
        std::fs::write(&model, b"stub").unwrap();
        std::fs::write(&tokenizer, b"{}").unwrap();

        let config = E5Config {
            model_path: model.to_string_lossy().to_string(),
            tokenizer_path: tokenizer.to_string_lossy().to_string(),
            ..E5Config::default()
        };
        config.ensure_models_exist().await.unwrap();
        assert_eq!(std::fs::read(&model).unwrap(), b"stub");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
