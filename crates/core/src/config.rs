use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::{
    assets::{get_config_dir, get_default_config},
    model::ModelConfig,
};

/// Reply used when the model produces no text.
pub const DEFAULT_FALLBACK: &str =
    "Sorry — I couldn't generate a response. Please rephrase your question.";

#[derive(Error, Debug)]
pub enum NovaConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Decoding settings. Without a temperature the model decodes greedily.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProfileConfig {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            top_p: None,
            seed: default_seed(),
        }
    }
}

fn default_seed() -> u64 {
    299792458
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModeConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub instruction: String,
    pub max_new_tokens: usize,
    pub fallback: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Chat sessions kept in memory; the least recently used one is evicted
    /// beyond this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            title: default_title(),
            subtitle: String::new(),
            placeholder: default_placeholder(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7860".to_string()
}

fn default_title() -> String {
    "AI Chat Agent".to_string()
}

fn default_placeholder() -> String {
    "Message Nova…".to_string()
}

fn default_max_sessions() -> usize {
    1024
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub models: HashMap<String, ModelConfig>,
    pub profiles: HashMap<String, ProfileConfig>,
    pub chat: ModeConfig,
    pub form: ModeConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Mode config with the model swapped for a named entry of `models`.
    pub fn with_model(
        &self,
        mode: &ModeConfig,
        model: Option<&str>,
    ) -> Result<ModeConfig, NovaConfigError> {
        let Some(name) = model else {
            return Ok(mode.clone());
        };
        let model = self
            .models
            .get(name)
            .cloned()
            .ok_or_else(|| NovaConfigError::Config(format!("Model '{name}' not found")))?;
        Ok(ModeConfig {
            model,
            ..mode.clone()
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum StringOrObject<T> {
    String(String),
    Object(T),
}

#[derive(Deserialize, Debug)]
struct RawConfig {
    models: HashMap<String, ModelConfig>,
    #[serde(default)]
    profiles: HashMap<String, ProfileConfig>,
    chat: RawModeConfig,
    form: RawModeConfig,
    #[serde(default)]
    server: ServerConfig,
}

#[derive(Deserialize, Debug)]
struct RawModeConfig {
    model: StringOrObject<ModelConfig>,
    #[serde(default)]
    profile: Option<StringOrObject<ProfileConfig>>,
    #[serde(default)]
    instruction: String,
    #[serde(default = "default_max_new_tokens")]
    max_new_tokens: usize,
    #[serde(default = "default_fallback")]
    fallback: Option<String>,
}

fn default_max_new_tokens() -> usize {
    160
}

fn default_fallback() -> Option<String> {
    Some(DEFAULT_FALLBACK.to_string())
}

impl RawConfig {
    #[instrument]
    fn to_config(&self) -> Result<Config, NovaConfigError> {
        let mut models_with_names = HashMap::new();
        for (k, v) in &self.models {
            // Update model name if not set
            let model_name = if v.name.is_empty() {
                k.clone()
            } else {
                v.name.clone()
            };
            let model = ModelConfig {
                name: model_name,
                ..v.clone()
            };
            models_with_names.insert(k.clone(), model);
        }

        let resolve_model =
            |model_entry: &StringOrObject<ModelConfig>| -> Result<ModelConfig, NovaConfigError> {
                match model_entry {
                    StringOrObject::String(s) => models_with_names
                        .get(s)
                        .cloned()
                        .ok_or_else(|| NovaConfigError::Config(format!("Model '{s}' not found"))),
                    StringOrObject::Object(m) => Ok(m.clone()),
                }
            };

        let resolve_profile = |profile_entry: &Option<StringOrObject<ProfileConfig>>| -> Result<ProfileConfig, NovaConfigError> {
            match profile_entry {
                Some(StringOrObject::String(s)) => self.profiles
                    .get(s)
                    .cloned()
                    .ok_or_else(|| NovaConfigError::Config(format!("Profile '{s}' not found"))),
                Some(StringOrObject::Object(p)) => Ok(p.clone()),
                None => Ok(ProfileConfig::default()),
            }
        };

        let resolve_mode = |raw: &RawModeConfig| -> Result<ModeConfig, NovaConfigError> {
            if raw.max_new_tokens == 0 {
                return Err(NovaConfigError::Config(
                    "max_new_tokens must be greater than zero".to_string(),
                ));
            }
            Ok(ModeConfig {
                model: resolve_model(&raw.model)?,
                profile: resolve_profile(&raw.profile)?,
                instruction: raw.instruction.trim().to_string(),
                max_new_tokens: raw.max_new_tokens,
                fallback: raw.fallback.clone(),
            })
        };

        let chat = resolve_mode(&self.chat)?;
        let form = resolve_mode(&self.form)?;

        Ok(Config {
            models: models_with_names,
            profiles: self.profiles.clone(),
            chat,
            form,
            server: self.server.clone(),
        })
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), NovaConfigError> {
    let actual_path = config_path.unwrap_or_else(|| {
        let config_dir = get_config_dir();
        config_dir.join("nova.yml")
    });

    let parent_dir = actual_path.parent().ok_or_else(|| {
        NovaConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, NovaConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let raw: RawConfig = serde_yaml::from_str(&content)?;
    raw.to_config()
}
