//! HTML pages, rendered once at startup from the embedded templates.
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use minijinja::{Environment, context};
use nova_core::config::ServerConfig;

use crate::web::AppState;

const CHAT_TEMPLATE: &str = include_str!("../../templates/chat.html");
const FORM_TEMPLATE: &str = include_str!("../../templates/form.html");
const STYLESHEET: &str = include_str!("../../templates/style.css");

#[derive(Debug, Clone)]
pub struct Pages {
    chat: String,
    form: String,
}

impl Pages {
    pub fn render(server: &ServerConfig) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("chat.html", CHAT_TEMPLATE)?;
        env.add_template("form.html", FORM_TEMPLATE)?;

        let ctx = context! {
            title => &server.title,
            subtitle => &server.subtitle,
            placeholder => &server.placeholder,
        };
        let chat = env
            .get_template("chat.html")?
            .render(&ctx)
            .context("Failed to render chat page")?;
        let form = env
            .get_template("form.html")?
            .render(&ctx)
            .context("Failed to render form page")?;
        Ok(Self { chat, form })
    }
}

pub async fn chat_page(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.chat.clone())
}

pub async fn form_page(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.form.clone())
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}
