//! Text-to-text generation with T5 family checkpoints (FLAN-T5 and friends).
use crate::completion::{Completion, CompletionMetrics, CompletionModel};
use crate::model::{ModelConfig, ModelMetrics};
use anyhow::{Context, Error as E, Result, anyhow};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5;
use hf_hub::{Repo, RepoType, api::sync::Api};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::instrument;

pub const DEFAULT_MODEL_ID: &str = "google/flan-t5-small";
const DEFAULT_MAX_INPUT_TOKENS: usize = 512;
const DEFAULT_MAX_NEW_TOKENS: usize = 160;

#[derive(Debug, Clone, PartialEq)]
enum ModelSource {
    Local(PathBuf),
    Hub { model_id: String, revision: String },
}

struct LoadedT5 {
    model: t5::T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    config: t5::Config,
    device: Device,
}

pub struct T5Model {
    model_name: String,
    source: ModelSource,
    max_input_tokens: usize,
    loaded: Option<Arc<Mutex<LoadedT5>>>,
    metrics: ModelMetrics,
}

impl T5Model {
    #[instrument(skip(model_config))]
    pub fn new(model_config: ModelConfig) -> Result<Self> {
        let max_input_tokens: usize = model_config
            .get_setting("max_input_tokens")
            .unwrap_or(DEFAULT_MAX_INPUT_TOKENS);
        if max_input_tokens < 2 {
            return Err(anyhow!("'max_input_tokens' must be at least 2"));
        }

        let source = match model_config.get_setting::<String>("path") {
            Some(path) => {
                let model_dir = PathBuf::from(shellexpand::tilde(&path).into_owned());
                if !model_dir.is_dir() {
                    return Err(anyhow!(
                        "Model loading failed: directory not found at path: {}",
                        model_dir.display()
                    ));
                }
                ModelSource::Local(model_dir)
            }
            None => ModelSource::Hub {
                model_id: model_config
                    .get_setting("model_id")
                    .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
                revision: model_config
                    .get_setting("revision")
                    .unwrap_or_else(|| "main".to_string()),
            },
        };

        Ok(Self {
            model_name: model_config.name,
            source,
            max_input_tokens,
            loaded: None,
            metrics: ModelMetrics::default(),
        })
    }

    fn resolve_files(source: &ModelSource) -> Result<(PathBuf, PathBuf, PathBuf)> {
        match source {
            ModelSource::Local(dir) => Ok((
                dir.join("config.json"),
                dir.join("tokenizer.json"),
                dir.join("model.safetensors"),
            )),
            ModelSource::Hub { model_id, revision } => {
                tracing::info!(%model_id, %revision, "fetching model files from hub");
                let api = Api::new()?;
                let repo = api.repo(Repo::with_revision(
                    model_id.clone(),
                    RepoType::Model,
                    revision.clone(),
                ));
                Ok((
                    repo.get("config.json")?,
                    repo.get("tokenizer.json")?,
                    repo.get("model.safetensors")?,
                ))
            }
        }
    }

    fn load_blocking(source: &ModelSource) -> Result<LoadedT5> {
        let device = Device::Cpu;
        let (config_path, tokenizer_path, weights_path) = Self::resolve_files(source)?;

        let config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let mut config: t5::Config = serde_json::from_str(&config)?;
        config.use_cache = true;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(E::msg)?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = t5::T5ForConditionalGeneration::load(vb, &config)?;

        Ok(LoadedT5 {
            model,
            tokenizer,
            config,
            device,
        })
    }
}

/// Cut `ids` to at most `max_len` tokens, dropping from the end but keeping a
/// trailing end-of-sequence token in place.
pub(crate) fn truncate_input(mut ids: Vec<u32>, max_len: usize, eos_token_id: u32) -> Vec<u32> {
    if ids.len() <= max_len {
        return ids;
    }
    if ids.last() == Some(&eos_token_id) {
        ids.truncate(max_len - 1);
        ids.push(eos_token_id);
    } else {
        ids.truncate(max_len);
    }
    ids
}

fn generate(
    loaded: &mut LoadedT5,
    prompt: &str,
    max_input_tokens: usize,
    max_new_tokens: usize,
    mut logits_processor: LogitsProcessor,
) -> Result<Completion> {
    let start_time = Instant::now();
    let eos_token_id = loaded.config.eos_token_id as u32;

    let tokens = loaded
        .tokenizer
        .encode(prompt, true)
        .map_err(E::msg)?
        .get_ids()
        .to_vec();
    let tokens = truncate_input(tokens, max_input_tokens, eos_token_id);

    loaded.model.clear_kv_cache();
    let input = Tensor::new(tokens.as_slice(), &loaded.device)?.unsqueeze(0)?;
    let encoder_output = loaded.model.encode(&input)?;
    let prompt_eval_end = Instant::now();

    let decoder_start = loaded
        .config
        .decoder_start_token_id
        .unwrap_or(loaded.config.pad_token_id) as u32;
    let mut output_tokens = vec![decoder_start];
    let mut finish_reason = "Length";

    for index in 0..max_new_tokens {
        let decoder_input = if index == 0 {
            Tensor::new(output_tokens.as_slice(), &loaded.device)?.unsqueeze(0)?
        } else {
            let last = output_tokens[output_tokens.len() - 1];
            Tensor::new(&[last], &loaded.device)?.unsqueeze(0)?
        };
        let logits = loaded
            .model
            .decode(&decoder_input, &encoder_output)?
            .squeeze(0)?
            .to_dtype(DType::F32)?;
        let next_token = logits_processor.sample(&logits)?;
        if next_token == eos_token_id {
            finish_reason = "Stop";
            break;
        }
        output_tokens.push(next_token);
    }
    loaded.model.clear_kv_cache();

    let text = loaded
        .tokenizer
        .decode(&output_tokens[1..], true)
        .map_err(E::msg)?;
    let completion_end = Instant::now();

    Ok(Completion {
        text: text.trim().to_string(),
        finish_reason: Some(finish_reason.to_string()),
        metrics: CompletionMetrics {
            prompt_tokens: tokens.len() as u32,
            prompt_eval_latency_ms: prompt_eval_end.duration_since(start_time).as_millis() as f32,
            completion_tokens: (output_tokens.len() - 1) as u32,
            completion_latency_ms: completion_end.duration_since(prompt_eval_end).as_millis()
                as f32,
        },
    })
}

#[async_trait]
impl CompletionModel for T5Model {
    fn metrics(&self) -> ModelMetrics {
        self.metrics.clone()
    }

    #[instrument(skip_all, fields(model = %self.model_name))]
    async fn load(&mut self) -> Result<()> {
        if self.loaded.is_some() {
            return Ok(());
        }
        let start_time = Instant::now();
        let source = self.source.clone();
        let loaded = tokio::task::spawn_blocking(move || Self::load_blocking(&source))
            .await
            .context("Model loading task failed")?
            .context("Model loading failed")?;

        self.loaded = Some(Arc::new(Mutex::new(loaded)));
        self.metrics.init_latency_ms = start_time.elapsed().as_millis() as f32;
        tracing::info!(
            init_latency_ms = self.metrics.init_latency_ms,
            "model loaded"
        );
        Ok(())
    }

    #[instrument(skip_all)]
    async fn complete(
        &self,
        prompt: &str,
        settings: &HashMap<String, String>,
    ) -> Result<Completion> {
        let loaded = self
            .loaded
            .clone()
            .ok_or_else(|| anyhow!("Model not loaded"))?;

        let max_new_tokens = settings
            .get("max_tokens")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_NEW_TOKENS);
        let seed = settings
            .get("seed")
            .and_then(|s| s.parse().ok())
            .unwrap_or(299792458);
        let temperature: Option<f64> = settings.get("temperature").and_then(|s| s.parse().ok());
        let top_p: Option<f64> = settings.get("top_p").and_then(|s| s.parse().ok());

        let max_input_tokens = self.max_input_tokens;
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || {
            let mut loaded = loaded.blocking_lock();
            let logits_processor = LogitsProcessor::new(seed, temperature, top_p);
            generate(
                &mut loaded,
                &prompt,
                max_input_tokens,
                max_new_tokens,
                logits_processor,
            )
        })
        .await
        .context("Generation task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelProvider;

    fn t5_config(settings: HashMap<String, serde_yaml::Value>) -> ModelConfig {
        ModelConfig {
            name: "test-t5".to_string(),
            provider: ModelProvider::T5,
            settings,
        }
    }

    #[test]
    fn test_t5_model_defaults_to_flan_small() {
        let model = T5Model::new(t5_config(HashMap::new())).unwrap();
        assert_eq!(
            model.source,
            ModelSource::Hub {
                model_id: DEFAULT_MODEL_ID.to_string(),
                revision: "main".to_string(),
            }
        );
        assert_eq!(model.max_input_tokens, 512);
    }

    #[test]
    fn test_t5_model_new_path_not_found() {
        let settings = HashMap::from([(
            "path".to_string(),
            "/path/to/non/existent/flan-t5".into(),
        )]);
        let model = T5Model::new(t5_config(settings));
        assert!(model.is_err());
        assert!(
            model
                .err()
                .unwrap()
                .to_string()
                .contains("Model loading failed")
        );
    }

    #[test]
    fn test_t5_model_new_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let settings = HashMap::from([(
            "path".to_string(),
            dir.path().to_string_lossy().as_ref().into(),
        )]);
        let model = T5Model::new(t5_config(settings)).unwrap();
        assert_eq!(model.source, ModelSource::Local(dir.path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_complete_before_load_fails() {
        let model = T5Model::new(t5_config(HashMap::new())).unwrap();
        let err = model.complete("hi", &HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("Model not loaded"));
    }

    #[tokio::test]
    async fn test_load_from_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = HashMap::from([(
            "path".to_string(),
            dir.path().to_string_lossy().as_ref().into(),
        )]);
        let mut model = T5Model::new(t5_config(settings)).unwrap();
        let err = model.load().await.unwrap_err();
        assert!(err.to_string().contains("Model loading failed"));
    }

    #[test]
    fn test_truncate_input_short_is_unchanged() {
        assert_eq!(truncate_input(vec![5, 6, 1], 4, 1), vec![5, 6, 1]);
        assert_eq!(truncate_input(vec![5, 6, 1], 3, 1), vec![5, 6, 1]);
    }

    #[test]
    fn test_truncate_input_keeps_eos() {
        assert_eq!(truncate_input(vec![5, 6, 7, 8, 1], 3, 1), vec![5, 6, 1]);
    }

    #[test]
    fn test_truncate_input_without_eos() {
        assert_eq!(truncate_input(vec![5, 6, 7, 8], 2, 1), vec![5, 6]);
    }

    #[tokio::test]
    #[ignore = "downloads google/flan-t5-small from the Hugging Face hub"]
    async fn test_flan_t5_answers_question() {
        let mut model = T5Model::new(t5_config(HashMap::new())).unwrap();
        model.load().await.unwrap();
        let settings = HashMap::from([("max_tokens".to_string(), "160".to_string())]);
        let completion = model
            .complete(
                "Answer clearly and briefly:\nWhat is the capital of France?",
                &settings,
            )
            .await
            .unwrap();
        assert!(!completion.text.is_empty());
        assert!(completion.metrics.completion_tokens <= 160);
    }
}
