//! Test utilities for nova-core crate

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::Builder;

use crate::completion::CompletionModel;
use crate::config::{ModeConfig, ProfileConfig};
use crate::model::{ModelConfig, ModelProvider};

/// Creates a temporary config file with the given content.
/// Uses tempfile::Builder to ensure unique directories for parallel tests.
pub fn create_temp_config(content: &str) -> PathBuf {
    let temp_dir = Builder::new()
        .prefix("nova-test")
        .rand_bytes(8)
        .tempdir()
        .unwrap();
    let config_path = temp_dir.path().join("nova.yml");
    File::create(&config_path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
    // Keep the temp directory alive by leaking it (this is just for tests)
    let _ = Box::leak(Box::new(temp_dir));
    config_path
}

/// Model config for the fake provider in the given `response_mode`.
pub fn test_model_config(response_mode: &str) -> ModelConfig {
    ModelConfig {
        name: "fake".to_string(),
        provider: ModelProvider::Test,
        settings: HashMap::from([(
            "response_mode".to_string(),
            serde_yaml::Value::String(response_mode.to_string()),
        )]),
    }
}

pub fn test_mode_config(
    response_mode: &str,
    instruction: &str,
    fallback: Option<&str>,
) -> ModeConfig {
    ModeConfig {
        model: test_model_config(response_mode),
        profile: ProfileConfig::default(),
        instruction: instruction.to_string(),
        max_new_tokens: 160,
        fallback: fallback.map(str::to_string),
    }
}

/// A loaded fake model.
pub async fn test_model(response_mode: &str) -> Arc<dyn CompletionModel + Send + Sync> {
    let mut model = crate::get_completion_llm(test_model_config(response_mode)).unwrap();
    model.load().await.unwrap();
    Arc::from(model)
}
