// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model wrapper for all-MiniLM-L6-v2 (384 dimensions).

pub mod onnx_model;

pub use onnx_model::{OnnxEmbeddingModel, EMBEDDING_DIMENSION};

use anyhow::Result;

/// Trait for batch text embedding backends.
///
/// Inference is CPU-bound and blocking; async callers are expected to
/// dispatch it through `spawn_blocking`. The HTTP layer depends on
/// this trait rather than the concrete ONNX model, so handler tests
/// can run against a stub backend without model files.
pub trait TextEmbedder: Send + Sync {
    /// Embeds all texts in one batch, one vector per input text, in
    /// input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output dimension of the backend's vectors.
    fn dimension(&self) -> usize;

    /// Model name reported by the backend.
    fn model_name(&self) -> &str;
}
