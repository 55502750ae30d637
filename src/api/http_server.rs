// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP server: router construction and the serve loop.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::embed::embed_handler;
use crate::config::ServerConfig;
use crate::embeddings::{OnnxEmbeddingModel, TextEmbedder};

/// Shared request-handling state: the one embedder instance loaded at
/// startup plus the configured batch cap. Cloned per request; the
/// embedder itself is behind an Arc and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn TextEmbedder>,
    pub max_batch: usize,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/embed", post(embed_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the listener and serves until the process exits.
///
/// The model is fully loaded before this is called, so the service
/// never accepts a request it cannot answer.
pub async fn start_server(config: &ServerConfig, model: Arc<OnnxEmbeddingModel>) -> Result<()> {
    let state = AppState {
        model,
        max_batch: config.max_batch,
    };
    let app = router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    tracing::info!("Embedding server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "ok",
        "model": state.model.model_name(),
        "dimension": state.model.dimension(),
    }))
}
