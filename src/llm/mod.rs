// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted model access: embeddings, generation and OCR

pub mod gemini;
pub mod probe;
pub mod provider;
pub mod rate_limiter;
pub mod sse;
pub mod types;

pub use gemini::{GeminiChat, GeminiClient, GeminiEmbedder, OCR_PROMPT};
pub use probe::{probe_embedding_model, ProbedEmbedding};
pub use provider::{EmbeddingProvider, GenerationProvider, OcrProvider};
pub use rate_limiter::BatchPacer;
pub use types::{EmbedTask, LlmError, TokenStream};
