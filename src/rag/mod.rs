// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// In-memory vector storage, prompt assembly and streamed answers over ingested documents

pub mod answer;
pub mod conversation;
pub mod engine;
pub mod errors;
pub mod prompt;
pub mod similarity;
pub mod store;

pub use answer::{unique_documents, AnswerStream, RagAnswer, Source};
pub use conversation::{ChatTurn, Conversation, Role};
pub use engine::{DocumentStats, RagEngine};
pub use errors::RagError;
pub use prompt::{build_context, build_prompt, format_history, NO_DOCUMENTS_MESSAGE};
pub use store::{ChunkRecord, ScoredChunk, VectorStore};
