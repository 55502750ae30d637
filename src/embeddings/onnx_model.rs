// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX wrapper around the all-MiniLM-L6-v2 sentence transformer.
//!
//! Loads the model into an ONNX Runtime session once, then serves
//! batch inference for the lifetime of the process. The model emits
//! token-level embeddings `[batch, seq_len, 384]`; sentence vectors
//! are produced by attention-mask-weighted mean pooling.
//!
//! Inference is blocking CPU work. Async callers go through the
//! `TextEmbedder` trait and dispatch with `spawn_blocking` so a long
//! batch does not stall the runtime.

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayViewD, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::info;

/// Output dimensionality of all-MiniLM-L6-v2.
pub const EMBEDDING_DIMENSION: usize = 384;

/// ONNX-based embedding model.
///
/// Cheap to clone; the session and tokenizer live behind `Arc`, so one
/// loaded instance is shared read-only across all request handlers.
/// Inference itself serializes on the session mutex.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

/// Tokenized batch, padded to the longest sequence.
struct EncodedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
    /// Flat copy of the attention mask, kept for mean pooling.
    mask_values: Vec<i64>,
    max_len: usize,
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk.
    ///
    /// Runs a probe inference after loading and fails if the model does
    /// not emit `[batch, seq_len, 384]` token embeddings, so a wrong or
    /// truncated model file is caught at startup rather than on the
    /// first request.
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // Probe inference to validate the output shape before serving.
        {
            let batch = encode_batch(&tokenizer, &["validation probe".to_string()])?;
            let outputs = session.run(ort::inputs![
                "input_ids" => Value::from_array(batch.input_ids)?,
                "attention_mask" => Value::from_array(batch.attention_mask)?,
                "token_type_ids" => Value::from_array(batch.token_type_ids)?
            ])?;
            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract probe output tensor")?;
            let shape = output.shape();
            if shape.len() != 3 || shape[2] != EMBEDDING_DIMENSION {
                anyhow::bail!(
                    "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, {}])",
                    shape,
                    EMBEDDING_DIMENSION
                );
            }
        }

        info!("Embedding model {} loaded and validated", model_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: EMBEDDING_DIMENSION,
        })
    }

    /// Generates one 384-dimensional embedding for a single text.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut embeddings = self.embed_batch(&texts)?;
        embeddings
            .pop()
            .context("Batch inference returned no embedding for a single input")
    }

    /// Generates embeddings for all texts in one batched inference call.
    ///
    /// The output preserves input order index-for-index and always has
    /// exactly one vector per input text. An empty input slice returns
    /// an empty vector without touching the session. Empty strings are
    /// valid inputs: the tokenizer still emits the special tokens, so
    /// the pooling mask is never all-zero.
    ///
    /// Blocks the calling thread for the duration of the inference.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = encode_batch(&self.tokenizer, texts)?;
        let mask_values = batch.mask_values;
        let max_len = batch.max_len;

        let mut session = self.session.lock().unwrap();
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(batch.input_ids)?,
            "attention_mask" => Value::from_array(batch.attention_mask)?,
            "token_type_ids" => Value::from_array(batch.token_type_ids)?
        ])?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        // [batch, seq_len, hidden] -> one pooled vector per batch item.
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch_idx in 0..texts.len() {
            let token_embeddings = output.index_axis(Axis(0), batch_idx);
            let mask = &mask_values[batch_idx * max_len..(batch_idx + 1) * max_len];
            let pooled = mean_pool(token_embeddings, mask);

            if pooled.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    batch_idx,
                    pooled.len(),
                    self.dimension
                );
            }
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }

    /// Output dimension of this model (384).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl crate::embeddings::TextEmbedder for OnnxEmbeddingModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        OnnxEmbeddingModel::embed_batch(self, texts)
    }

    fn dimension(&self) -> usize {
        OnnxEmbeddingModel::dimension(self)
    }

    fn model_name(&self) -> &str {
        OnnxEmbeddingModel::model_name(self)
    }
}

/// Tokenizes a batch and pads every sequence to the longest one.
fn encode_batch(tokenizer: &Tokenizer, texts: &[String]) -> Result<EncodedBatch> {
    let encodings: Vec<_> = texts
        .iter()
        .map(|text| {
            tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(texts.len() * max_len);
    let mut attention_mask = Vec::with_capacity(texts.len() * max_len);

    for encoding in &encodings {
        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();

        input_ids.extend(ids.iter().map(|&id| id as i64));
        attention_mask.extend(mask.iter().map(|&m| m as i64));

        let padding = max_len - ids.len();
        input_ids.extend(std::iter::repeat(0i64).take(padding));
        attention_mask.extend(std::iter::repeat(0i64).take(padding));
    }

    // Single-segment input: token_type_ids are all zeros.
    let token_type_ids = vec![0i64; texts.len() * max_len];
    let mask_values = attention_mask.clone();

    Ok(EncodedBatch {
        input_ids: Array2::from_shape_vec((texts.len(), max_len), input_ids)
            .context("Failed to create input_ids array")?,
        attention_mask: Array2::from_shape_vec((texts.len(), max_len), attention_mask)
            .context("Failed to create attention_mask array")?,
        token_type_ids: Array2::from_shape_vec((texts.len(), max_len), token_type_ids)
            .context("Failed to create token_type_ids array")?,
        mask_values,
        max_len,
    })
}

/// Attention-mask-weighted mean pooling over the sequence dimension.
///
/// Padding positions carry mask 0 and do not contribute. The divisor is
/// clamped away from zero; with special tokens present the mask sum is
/// at least 2 even for the empty string.
fn mean_pool(token_embeddings: ArrayViewD<'_, f32>, mask: &[i64]) -> Vec<f32> {
    let seq_len = token_embeddings.shape()[0];
    let hidden_dim = token_embeddings.shape()[1];

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for i in 0..seq_len {
        let mask_value = mask[i] as f32;
        sum_mask += mask_value;
        for j in 0..hidden_dim {
            pooled[j] += token_embeddings[[i, j]] * mask_value;
        }
    }

    for val in &mut pooled {
        *val /= sum_mask.max(1e-9);
    }

    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_mean_pool_ignores_padding() {
        // Two real tokens, one padding token with a distinctive value.
        let token_embeddings = arr2(&[[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]]);
        let mask = [1i64, 1, 0];

        let pooled = mean_pool(token_embeddings.view().into_dyn(), &mask);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_finite() {
        let token_embeddings = arr2(&[[1.0f32, 1.0]]);
        let mask = [0i64];

        let pooled = mean_pool(token_embeddings.view().into_dyn(), &mask);
        assert!(pooled.iter().all(|v| v.is_finite()));
    }

    // Model-file tests live in tests/embeddings_tests.rs and only run
    // when the model files are downloaded.
}
