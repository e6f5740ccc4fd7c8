//! HTTP server: chat page, single-question form page and their JSON endpoints.
pub mod api;
pub mod pages;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use nova_core::assistant::Assistant;
use nova_core::config::ServerConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::svc::{chat::ChatService, form::FormService};
use pages::Pages;

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub form: Arc<FormService>,
    pub pages: Arc<Pages>,
    pub model_name: Arc<str>,
}

impl AppState {
    pub fn new(
        chat: Arc<Assistant>,
        form: Arc<Assistant>,
        server: &ServerConfig,
        model_name: &str,
    ) -> Result<Self> {
        Ok(Self {
            chat: Arc::new(ChatService::new(chat, server.max_sessions)),
            form: Arc::new(FormService::new(form)),
            pages: Arc::new(Pages::render(server)?),
            model_name: Arc::from(model_name),
        })
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::chat_page))
        .route("/form", get(pages::form_page))
        .route("/static/style.css", get(pages::stylesheet))
        .route("/health", get(api::health))
        .route("/api/chat/history", get(api::history))
        .route("/api/chat/input", post(api::input))
        .route("/api/chat/submit", post(api::submit))
        .route("/api/chat/reply", post(api::reply))
        .route("/api/chat/reset", post(api::reset))
        .route("/api/ask", post(api::ask))
        .with_state(state)
}

/// Serve `state` on `bind_addr` until Ctrl+C or SIGTERM.
pub async fn run_http(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
