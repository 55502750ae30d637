// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request type for POST /embed.

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Request body for POST /embed.
///
/// A missing `texts` key deserializes to an empty list, which is a
/// valid request yielding an empty response. Non-string elements are
/// rejected during deserialization.
///
/// ```json
/// {"texts": ["Hello world", "Another text"]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub texts: Vec<String>,
}

impl EmbedRequest {
    /// Validates the request against the configured batch cap.
    ///
    /// Empty lists and empty strings are valid; only batch size is
    /// bounded.
    pub fn validate(&self, max_batch: usize) -> Result<(), ApiError> {
        if self.texts.len() > max_batch {
            return Err(ApiError::ValidationError {
                field: "texts".to_string(),
                message: format!(
                    "texts array cannot contain more than {} items (got {})",
                    max_batch,
                    self.texts.len()
                ),
            });
        }

        Ok(())
    }
}
