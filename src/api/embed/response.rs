// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response type for POST /embed.

use serde::{Deserialize, Serialize};

/// Response body for POST /embed.
///
/// One inner vector per input text, in input order, each 384 floats:
///
/// ```json
/// {"embeddings": [[0.1, 0.2, ...], ...]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_shape() {
        let response = EmbedResponse {
            embeddings: vec![vec![0.5, -0.5], vec![1.0, 0.0]],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"embeddings": [[0.5, -0.5], [1.0, 0.0]]})
        );
    }

    #[test]
    fn test_empty_response() {
        let response = EmbedResponse { embeddings: vec![] };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"embeddings":[]}"#);
    }
}
