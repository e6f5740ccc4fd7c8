//! Terminal presentation helpers.
use console::{Style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use nova_core::completion::CompletionMetrics;

/// Prints a formatted error message to stderr.
pub fn present_error(error: anyhow::Error) {
    let error_text = style_text("ERROR:", MessageType::Error);
    eprintln!("\n{error_text} {error:#}");
}

/// Represents the type of a terminal message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Prompt,
    /// Footer information, like metrics or status.
    Footer,
    Error,
}

/// Styles a string of text according to the specified `MessageType`.
pub fn style_text(text: &str, style: MessageType) -> StyledObject<&str> {
    let style_obj = match style {
        MessageType::Prompt => Style::new().blue().bold(),
        MessageType::Footer => Style::new().white().dim(),
        MessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

/// Formats the completion metrics into a string for display in the footer.
pub fn format_footer_metrics(metrics: &CompletionMetrics, finish_reason: Option<&str>) -> String {
    let mut footer_complete = String::from("◼ Completed");
    if let Some(reason) = finish_reason {
        footer_complete.push_str(&format!(" ({reason})"));
    }
    footer_complete.push('.');

    let mut details = Vec::new();

    if metrics.completion_latency_ms > 0.0 || metrics.prompt_eval_latency_ms > 0.0 {
        details.push(format!(
            "{:.2}s total",
            (metrics.prompt_eval_latency_ms + metrics.completion_latency_ms) / 1000.0
        ));
    }
    if metrics.completion_tokens > 0 && metrics.completion_latency_ms > 0.0 {
        let tokens_per_sec =
            metrics.completion_tokens as f32 * 1000.0 / metrics.completion_latency_ms;
        details.push(format!("{tokens_per_sec:.2} tokens/s"));
    }
    if metrics.completion_tokens > 0 {
        details.push(format!("{} completion tokens", metrics.completion_tokens));
    }
    if metrics.prompt_tokens > 0 {
        details.push(format!("{} prompt tokens", metrics.prompt_tokens));
    }

    let footer = if details.is_empty() {
        footer_complete
    } else {
        format!("{} {}", footer_complete, details.join(". "))
    };

    style_text(&footer, MessageType::Footer).to_string()
}

/// A spinner shown while the model loads or generates.
#[derive(Debug)]
pub struct GenerationSpinner {
    spinner: ProgressBar,
}

impl GenerationSpinner {
    pub fn new(msg: String) -> Self {
        let spinner = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(spinner_style);
        spinner.set_message(msg);
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { spinner }
    }

    /// Stops the spinner and clears it from the terminal.
    pub fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}
