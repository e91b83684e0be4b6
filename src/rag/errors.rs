// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the ingestion and question-answering pipeline

use thiserror::Error;

use crate::llm::LlmError;

/// Errors that can occur while ingesting documents or answering questions
#[derive(Error, Debug)]
pub enum RagError {
    /// The document could not be read
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Vector contains NaN or Infinity
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Store already holds the maximum number of vectors
    #[error("Maximum vector capacity reached: {current} vectors (max: {max})")]
    CapacityExceeded { current: usize, max: usize },

    /// Vector dimensions don't match the store
    #[error("Dimension mismatch: expected {expected}D, got {actual}D")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding call failed
    #[error("Embedding failed: {0}")]
    Embedding(#[source] LlmError),

    /// Generation call failed
    #[error("Generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RagError::Embedding(LlmError::Unauthorized { .. })
            | RagError::Generation(LlmError::Unauthorized { .. }) => {
                "The API key was rejected - check GOOGLE_API_KEY".to_string()
            }
            RagError::Embedding(LlmError::RateLimited { .. })
            | RagError::Generation(LlmError::RateLimited { .. }) => {
                "The model API is rate limiting requests - try again shortly".to_string()
            }
            RagError::CapacityExceeded { max, .. } => {
                format!("Too many chunks in memory (limit {}) - remove a document first", max)
            }
            _ => self.to_string(),
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::Extraction(_) => "EXTRACTION_FAILED",
            RagError::Config(_) => "INVALID_CONFIG",
            RagError::InvalidVector(_) => "INVALID_VECTOR",
            RagError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            RagError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            RagError::Embedding(_) => "EMBEDDING_FAILED",
            RagError::Generation(_) => "GENERATION_FAILED",
            RagError::Io(_) => "IO_ERROR",
        }
    }
}
