// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use embed_server::{
    api, config::ServerConfig, embeddings::OnnxEmbeddingModel, models,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env file, then tracing with an info default.
    dotenv::dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;

    // Startup is blocking: the listener is not bound until the model
    // is loaded and validated. A load failure exits non-zero here.
    let artifacts = models::resolve_artifacts(config.model_dir.as_deref())
        .context("Failed to resolve embedding model artifacts")?;

    tracing::info!("Loading embedding model {}", models::MODEL_NAME);
    let model = OnnxEmbeddingModel::new(
        models::MODEL_NAME,
        &artifacts.model_path,
        &artifacts.tokenizer_path,
    )
    .await
    .context("Failed to load embedding model")?;
    tracing::info!("Model ready ({} dimensions)", model.dimension());

    api::start_server(&config, Arc::new(model)).await
}
