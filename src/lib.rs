// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod models;

pub use api::{ApiError, ErrorResponse};
pub use config::ServerConfig;
pub use embeddings::{OnnxEmbeddingModel, TextEmbedder, EMBEDDING_DIMENSION};
pub use models::{ModelArtifacts, MODEL_NAME, MODEL_REPO};
