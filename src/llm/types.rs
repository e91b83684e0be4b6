// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types shared by the hosted-model providers

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stream of generated text fragments
pub type TokenStream = BoxStream<'static, Result<String, LlmError>>;

/// What an embedding will be used for
///
/// Gemini optimises document and query embeddings differently, so the
/// ingestion and question paths ask for different task types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbedTask {
    RetrievalDocument,
    RetrievalQuery,
}

impl EmbedTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedTask::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            EmbedTask::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// Errors returned by embedding, generation and OCR providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body returned by the API
        message: String,
    },

    /// The API rejected the request with 429
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    /// The key was rejected (401/403)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failure while reading a streamed response
    #[error("Stream error: {0}")]
    Stream(String),

    /// Probing exhausted every (API version, model) candidate
    #[error("No working embedding model found. First error: {first_error}")]
    NoWorkingEmbeddingModel { first_error: String },
}

impl LlmError {
    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            LlmError::Http(_) => "HTTP_ERROR",
            LlmError::Api { .. } => "API_ERROR",
            LlmError::RateLimited { .. } => "RATE_LIMITED",
            LlmError::Unauthorized { .. } => "UNAUTHORIZED",
            LlmError::InvalidResponse(_) => "INVALID_RESPONSE",
            LlmError::Stream(_) => "STREAM_ERROR",
            LlmError::NoWorkingEmbeddingModel { .. } => "NO_EMBEDDING_MODEL",
        }
    }
}
