// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding-model discovery
//!
//! Model availability differs between API versions and keys, so the client
//! tries each (version, model) pair in order and keeps the first that answers.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::gemini::GeminiClient;
use super::types::{EmbedTask, LlmError};
use crate::config::GeminiConfig;

/// Text sent when probing a candidate
const PROBE_TEXT: &str = "test";

/// The (client, model) pair that answered a probe
pub struct ProbedEmbedding {
    pub client: Arc<GeminiClient>,
    pub model: String,
}

impl ProbedEmbedding {
    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }
}

/// Find the first working embedding model
///
/// # Returns
/// The client bound to the working API version plus the model name, or
/// `LlmError::NoWorkingEmbeddingModel` carrying the first failure seen
pub async fn probe_embedding_model(config: &GeminiConfig) -> Result<ProbedEmbedding, LlmError> {
    let mut first_error: Option<String> = None;
    let probe = vec![PROBE_TEXT.to_string()];

    for version in &config.api_versions {
        let client = Arc::new(GeminiClient::new(config, version)?);

        for model in &config.embed_candidates {
            debug!("Probing embedding model {}/{}", version, model);

            match client
                .embed_content(model, &probe, EmbedTask::RetrievalDocument)
                .await
            {
                Ok(_) => {
                    info!("Using embedding model {} (API {})", model, version);
                    return Ok(ProbedEmbedding {
                        client,
                        model: model.clone(),
                    });
                }
                Err(e) => {
                    warn!(
                        "Embedding model {}/{} failed: {}, trying next",
                        version, model, e
                    );
                    if first_error.is_none() {
                        first_error = Some(format!("{}/{}: {}", version, model, e));
                    }
                }
            }
        }
    }

    Err(LlmError::NoWorkingEmbeddingModel {
        first_error: first_error.unwrap_or_else(|| "no candidates configured".to_string()),
    })
}
