use anyhow::Result;
use nova_core::assistant::Assistant;
use nova_core::completion::Completion;
use std::sync::Arc;

/// Single-turn question answering: one input, one output, no history.
pub struct FormService {
    assistant: Arc<Assistant>,
}

impl FormService {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }

    /// Answer `prompt`, returning the full completion with metrics.
    pub async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.assistant.complete(prompt).await
    }

    /// Answer `prompt`.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        self.assistant.generate(prompt).await
    }
}
