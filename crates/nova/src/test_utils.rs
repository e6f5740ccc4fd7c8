//! Test helpers shared by the nova unit tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use nova_core::assistant::Assistant;
use nova_core::completion::{Completion, CompletionMetrics, CompletionModel};
use nova_core::model::ModelMetrics;
use nova_core::config::{ModeConfig, ProfileConfig};
use nova_core::model::{ModelConfig, ModelProvider};

/// Mode config backed by the fake provider in the given `response_mode`.
pub fn test_mode(response_mode: &str, instruction: &str, fallback: Option<&str>) -> ModeConfig {
    ModeConfig {
        model: ModelConfig {
            name: "fake".to_string(),
            provider: ModelProvider::Test,
            settings: HashMap::from([(
                "response_mode".to_string(),
                serde_yaml::Value::String(response_mode.to_string()),
            )]),
        },
        profile: ProfileConfig::default(),
        instruction: instruction.to_string(),
        max_new_tokens: 160,
        fallback: fallback.map(str::to_string),
    }
}

pub async fn test_assistant(
    response_mode: &str,
    instruction: &str,
    fallback: Option<&str>,
) -> Arc<Assistant> {
    let mode = test_mode(response_mode, instruction, fallback);
    Arc::new(Assistant::load(&mode).await.unwrap())
}

/// Echoes the prompt, except that the first `failures` calls fail.
pub struct FlakyModel {
    failures: AtomicUsize,
}

impl FlakyModel {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl CompletionModel for FlakyModel {
    fn metrics(&self) -> ModelMetrics {
        ModelMetrics::default()
    }

    async fn load(&mut self) -> Result<()> {
        Ok(())
    }

    async fn complete(
        &self,
        prompt: &str,
        _settings: &HashMap<String, String>,
    ) -> Result<Completion> {
        let remaining = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(anyhow!("generation failed"));
        }
        Ok(Completion {
            text: prompt.to_string(),
            finish_reason: Some("Stop".to_string()),
            metrics: CompletionMetrics::default(),
        })
    }
}

/// Assistant over a [`FlakyModel`] with no instruction and no fallback.
pub fn flaky_assistant(failures: usize) -> Arc<Assistant> {
    let mode = test_mode("echo", "", None);
    Arc::new(Assistant::new(Arc::new(FlakyModel::new(failures)), &mode))
}
