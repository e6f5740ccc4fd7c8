use anyhow::{Context, Result};
use nova_core::config::Config;

use crate::cli::ux::{GenerationSpinner, MessageType, style_text};
use crate::svc::load_assistants;
use crate::web::{AppState, run_http};

/// Loads the model once and serves the chat UI until interrupted.
pub async fn execute(bind: Option<String>, model: Option<String>, config: &Config) -> Result<()> {
    let chat_mode = config.with_model(&config.chat, model.as_deref())?;
    let form_mode = config.with_model(&config.form, model.as_deref())?;

    let spinner = GenerationSpinner::new(format!("Loading model {}...", chat_mode.model.name));
    let loaded = load_assistants(&chat_mode, &form_mode).await;
    spinner.clear();
    let (chat, form) = loaded?;

    eprintln!(
        "{}",
        style_text(
            &format!("Model loaded in {:.2}ms", chat.metrics().init_latency_ms),
            MessageType::Footer
        )
    );

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let state = AppState::new(chat, form, &config.server, &chat_mode.model.name)
        .context("Failed to prepare web pages")?;

    eprintln!(
        "{}",
        style_text(
            &format!("Serving on http://{bind} (Ctrl+C to stop)"),
            MessageType::Prompt
        )
    );
    run_http(state, &bind)
        .await
        .with_context(|| format!("Server on {bind} failed"))
}
