// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model artifact resolution.
//!
//! The service needs two files: the ONNX export of the sentence
//! transformer and its tokenizer definition. They come either from a
//! local directory (EMBED_MODEL_DIR) or from the Hugging Face hub
//! cache, downloading on first run.

use anyhow::{Context, Result};
use hf_hub::api::sync::Api;
use std::path::{Path, PathBuf};
use tracing::info;

/// Hub repository the artifacts are resolved from.
pub const MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Model name reported by the service.
pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

const ONNX_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Resolved on-disk locations of the model files.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Resolves the model and tokenizer files.
///
/// With a configured directory the files must already exist there
/// (`model.onnx` and `tokenizer.json`); otherwise both are fetched
/// through the hub client, which reuses its cache on later runs.
pub fn resolve_artifacts(model_dir: Option<&Path>) -> Result<ModelArtifacts> {
    match model_dir {
        Some(dir) => resolve_local(dir),
        None => resolve_from_hub(),
    }
}

fn resolve_local(dir: &Path) -> Result<ModelArtifacts> {
    let model_path = dir.join("model.onnx");
    let tokenizer_path = dir.join("tokenizer.json");

    if !model_path.exists() {
        anyhow::bail!(
            "EMBED_MODEL_DIR is set but {} does not exist",
            model_path.display()
        );
    }
    if !tokenizer_path.exists() {
        anyhow::bail!(
            "EMBED_MODEL_DIR is set but {} does not exist",
            tokenizer_path.display()
        );
    }

    info!("Using local model artifacts from {}", dir.display());
    Ok(ModelArtifacts {
        model_path,
        tokenizer_path,
    })
}

fn resolve_from_hub() -> Result<ModelArtifacts> {
    info!("Resolving {} from the Hugging Face hub", MODEL_REPO);

    let api = Api::new().context("Failed to initialize Hugging Face hub client")?;
    let repo = api.model(MODEL_REPO.to_string());

    let model_path = repo
        .get(ONNX_FILE)
        .context(format!("Failed to fetch {} from {}", ONNX_FILE, MODEL_REPO))?;
    let tokenizer_path = repo.get(TOKENIZER_FILE).context(format!(
        "Failed to fetch {} from {}",
        TOKENIZER_FILE, MODEL_REPO
    ))?;

    Ok(ModelArtifacts {
        model_path,
        tokenizer_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_dir_missing_model_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), "{}").unwrap();

        let result = resolve_artifacts(Some(dir.path()));
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("model.onnx"), "unexpected error: {message}");
    }

    #[test]
    fn test_local_dir_missing_tokenizer_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"stub").unwrap();

        let result = resolve_artifacts(Some(dir.path()));
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(
            message.contains("tokenizer.json"),
            "unexpected error: {message}"
        );
    }

    #[test]
    fn test_local_dir_with_both_files_resolves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"stub").unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), "{}").unwrap();

        let artifacts = resolve_artifacts(Some(dir.path())).unwrap();
        assert_eq!(artifacts.model_path, dir.path().join("model.onnx"));
        assert_eq!(artifacts.tokenizer_path, dir.path().join("tokenizer.json"));
    }
}
