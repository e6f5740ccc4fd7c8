use crate::model::ModelMetrics;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Assistant,
    User,
}

impl From<SenderType> for String {
    fn from(val: SenderType) -> Self {
        val.as_str().into()
    }
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match &self {
            SenderType::User => "user",
            SenderType::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "content")]
    pub text: String,
    #[serde(rename = "role")]
    pub sender: SenderType,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionMetrics {
    pub prompt_tokens: u32,
    pub prompt_eval_latency_ms: f32,
    pub completion_tokens: u32,
    pub completion_latency_ms: f32,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub finish_reason: Option<String>,
    pub metrics: CompletionMetrics,
}

#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn metrics(&self) -> ModelMetrics;
    async fn load(&mut self) -> Result<()>;
    async fn complete(&self, prompt: &str, settings: &HashMap<String, String>)
    -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_serializes_as_role_content() {
        let message = ChatMessage {
            text: "Hi".to_string(),
            sender: SenderType::User,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Hi"}));
    }

    #[test]
    fn test_sender_type_as_str() {
        assert_eq!(SenderType::User.as_str(), "user");
        let s: String = SenderType::Assistant.into();
        assert_eq!(s, "assistant");
    }
}
