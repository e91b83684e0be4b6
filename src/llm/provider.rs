// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Provider traits for hosted embedding, generation and OCR services
//!
//! The RAG pipeline only talks to these traits, so hosted backends can be
//! swapped and tests can plug in deterministic fakes.

use async_trait::async_trait;

use super::types::{EmbedTask, LlmError, TokenStream};

/// Turns texts into vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    ///
    /// # Returns
    /// One vector per input text, in input order
    async fn embed(&self, texts: &[String], task: EmbedTask) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Model name for logging and stats
    fn model_name(&self) -> &str;
}

/// Produces text from a prompt
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a complete answer in one call
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Generate an answer as a stream of text fragments
    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, LlmError>;

    /// Model name for logging and stats
    fn model_name(&self) -> &str;
}

/// Reads the text of a scanned page
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Extract all text from a single-page PDF
    async fn extract_page_text(&self, page_pdf: &[u8]) -> Result<String, LlmError>;
}
