// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod rag;
pub mod version;

pub use config::{GeminiConfig, RagConfig};
pub use llm::{EmbedTask, EmbeddingProvider, GenerationProvider, LlmError, OcrProvider};
pub use rag::{Conversation, DocumentStats, RagAnswer, RagEngine, RagError, Source};
