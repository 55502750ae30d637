// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed handler.
//!
//! Validates the request, runs one batched inference over the shared
//! model, and returns the vectors in input order. Malformed bodies and
//! validation failures become structured 400s; inference failures
//! become structured 500s. Inference is CPU-bound, so it runs on the
//! blocking thread pool rather than a runtime worker.

use crate::api::embed::{EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{debug, error};

pub async fn embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected embed request body: {}", rejection.body_text());
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    request.validate(state.max_batch)?;

    debug!("Embedding batch of {} texts", request.texts.len());

    let model = state.model.clone();
    let texts = request.texts;
    let embeddings = tokio::task::spawn_blocking(move || model.embed_batch(&texts))
        .await
        .map_err(|e| {
            error!("Embedding task panicked: {}", e);
            ApiError::InternalError("embedding inference failed".to_string())
        })?
        .map_err(|e| {
            error!("Embedding inference failed: {:#}", e);
            ApiError::InternalError("embedding inference failed".to_string())
        })?;

    Ok(Json(EmbedResponse { embeddings }))
}
