//! A fake completion provider for tests and offline demos.
use crate::completion::{Completion, CompletionMetrics, CompletionModel};
use crate::model::{ModelConfig, ModelMetrics};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;

/// A fake `CompletionModel` that never touches real weights.
///
/// Its behavior can be configured via settings in the `ModelConfig`.
/// The `response_mode` setting controls what kind of response it generates:
/// - `"echo"` (default): returns the prompt unchanged.
/// - `"empty"`: returns an empty string.
/// - `"error"`: fails the generation.
/// - `"fixed"`: returns the `response` setting.
#[derive(Debug)]
pub struct TestProviderModel {
    config: ModelConfig,
    metrics: ModelMetrics,
}

impl TestProviderModel {
    /// Creates a new `TestProviderModel`.
    pub fn new(config: ModelConfig) -> Result<Self> {
        Ok(Self {
            config,
            metrics: ModelMetrics::default(),
        })
    }
}

#[async_trait]
impl CompletionModel for TestProviderModel {
    fn metrics(&self) -> ModelMetrics {
        self.metrics.clone()
    }

    async fn load(&mut self) -> Result<()> {
        Ok(())
    }

    async fn complete(
        &self,
        prompt: &str,
        settings: &HashMap<String, String>,
    ) -> Result<Completion> {
        let response_mode: String = self
            .config
            .get_setting("response_mode")
            .unwrap_or_else(|| "echo".to_string());

        let text = match response_mode.as_str() {
            "error" => return Err(anyhow!("TestProviderModel error")),
            "empty" => String::new(),
            "fixed" => self.config.get_setting("response").unwrap_or_default(),
            _ => prompt.to_string(),
        };

        // Words stand in for tokens
        let max_tokens: usize = settings
            .get("max_tokens")
            .and_then(|s| s.parse().ok())
            .unwrap_or(usize::MAX);
        let words: Vec<&str> = text.split_inclusive(char::is_whitespace).collect();
        let finish_reason = if words.len() > max_tokens {
            "Length"
        } else {
            "Stop"
        };
        let text: String = words.into_iter().take(max_tokens).collect();

        Ok(Completion {
            metrics: CompletionMetrics {
                prompt_tokens: prompt.split_whitespace().count() as u32,
                completion_tokens: text.split_whitespace().count() as u32,
                ..Default::default()
            },
            text,
            finish_reason: Some(finish_reason.to_string()),
        })
    }
}
