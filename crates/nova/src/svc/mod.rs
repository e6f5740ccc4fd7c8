//! Services layer for the app. Uses nova_core domain logic to provide services for the
//! web server and the cli.
pub mod chat;
pub mod form;

use anyhow::{Context, Result};
use nova_core::assistant::Assistant;
use nova_core::config::ModeConfig;
use std::sync::Arc;

/// Load the chat and form assistants, sharing one model when both modes use
/// the same model config.
pub async fn load_assistants(
    chat: &ModeConfig,
    form: &ModeConfig,
) -> Result<(Arc<Assistant>, Arc<Assistant>)> {
    let chat_assistant = Assistant::load(chat)
        .await
        .with_context(|| format!("Failed to load chat model '{}'", chat.model.name))?;

    let form_assistant = if form.model == chat.model {
        Assistant::new(chat_assistant.model(), form)
    } else {
        Assistant::load(form)
            .await
            .with_context(|| format!("Failed to load form model '{}'", form.model.name))?
    };

    Ok((Arc::new(chat_assistant), Arc::new(form_assistant)))
}
