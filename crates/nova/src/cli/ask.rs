use anyhow::{Context, Result};
use nova_core::assistant::Assistant;
use nova_core::config::Config;
use std::sync::Arc;

use crate::cli::ux::{GenerationSpinner, MessageType, format_footer_metrics, style_text};
use crate::svc::form::FormService;

/// Answers one question with the form settings and prints it to stdout.
pub async fn execute(
    instruction: Vec<String>,
    model: Option<String>,
    config: &Config,
) -> Result<()> {
    let instruction = instruction.join(" ");
    let form_mode = config.with_model(&config.form, model.as_deref())?;

    let spinner = GenerationSpinner::new("Loading model...".to_string());
    let loaded = Assistant::load(&form_mode).await;
    spinner.clear();
    let assistant = Arc::new(loaded.context("Failed to load model")?);
    let model_metrics = assistant.metrics();

    let spinner = GenerationSpinner::new("Generating response...".to_string());
    let completion = FormService::new(assistant).complete(&instruction).await;
    spinner.clear();
    let completion = completion?;

    println!("{}", completion.text);
    eprintln!();
    eprintln!(
        "{}",
        style_text(
            &format!("Model loaded in {:.2}ms", model_metrics.init_latency_ms),
            MessageType::Footer
        )
    );
    eprintln!(
        "{}",
        format_footer_metrics(&completion.metrics, completion.finish_reason.as_deref())
    );
    Ok(())
}
