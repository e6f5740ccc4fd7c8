//! The assistant turns a user question into a model prompt and cleans up the
//! generated answer.
use crate::completion::{Completion, CompletionModel};
use crate::config::{ModeConfig, ProfileConfig};
use crate::model::ModelMetrics;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Wraps a loaded completion model behind a single `generate` call.
pub struct Assistant {
    model: Arc<dyn CompletionModel + Send + Sync>,
    instruction: String,
    max_new_tokens: usize,
    fallback: Option<String>,
    profile: ProfileConfig,
}

impl Assistant {
    /// Create an assistant for the given mode from an already loaded model.
    ///
    /// Several assistants may share one model.
    pub fn new(model: Arc<dyn CompletionModel + Send + Sync>, mode: &ModeConfig) -> Self {
        Self {
            model,
            instruction: mode.instruction.clone(),
            max_new_tokens: mode.max_new_tokens,
            fallback: mode.fallback.clone(),
            profile: mode.profile.clone(),
        }
    }

    /// Initialize and load the model named by `mode`.
    pub async fn load(mode: &ModeConfig) -> Result<Self> {
        let mut model = crate::get_completion_llm(mode.model.clone())
            .context("Failed to initialize model")?;
        model.load().await.context("Failed to load model")?;
        Ok(Self::new(Arc::from(model), mode))
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.model.metrics()
    }

    /// The model behind this assistant.
    pub fn model(&self) -> Arc<dyn CompletionModel + Send + Sync> {
        self.model.clone()
    }

    /// Prefix the user text with the configured instruction, if any.
    pub fn format_prompt(&self, user_prompt: &str) -> String {
        if self.instruction.is_empty() {
            user_prompt.to_string()
        } else {
            format!("{}\n{}", self.instruction, user_prompt)
        }
    }

    fn settings(&self) -> HashMap<String, String> {
        let mut settings = HashMap::new();
        settings.insert("max_tokens".to_string(), self.max_new_tokens.to_string());
        settings.insert("seed".to_string(), self.profile.seed.to_string());
        if let Some(temperature) = self.profile.temperature {
            settings.insert("temperature".to_string(), temperature.to_string());
        }
        if let Some(top_p) = self.profile.top_p {
            settings.insert("top_p".to_string(), top_p.to_string());
        }
        settings
    }

    /// Run one generation and return the raw completion.
    #[instrument(skip_all)]
    pub async fn complete(&self, user_prompt: &str) -> Result<Completion> {
        let prompt = self.format_prompt(user_prompt);
        let mut completion = self.model.complete(&prompt, &self.settings()).await?;
        completion.text = completion.text.trim().to_string();
        if completion.text.is_empty() {
            if let Some(fallback) = &self.fallback {
                tracing::debug!("empty generation, using fallback reply");
                completion.text = fallback.clone();
            }
        }
        Ok(completion)
    }

    /// Generate the reply text for `user_prompt`.
    pub async fn generate(&self, user_prompt: &str) -> Result<String> {
        Ok(self.complete(user_prompt).await?.text)
    }
}
