// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Grounded prompt assembly

use super::conversation::{ChatTurn, Role};
use super::store::ScoredChunk;

/// Answer returned when nothing has been ingested
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents uploaded yet. Please upload at least one PDF or TXT file.";

/// Sentence the model is told to use when the context has no answer
pub const REFUSAL_SENTENCE: &str =
    "I don't have enough information in the uploaded documents to answer that.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Build the numbered context block
///
/// Source numbers are 1-based and match the `[Source N]` citations.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[Source {} | Document: {} | Chunk #{}]\n{}",
                i + 1,
                chunk.record.doc_name,
                chunk.record.chunk_idx,
                chunk.record.text
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Format the last `max_turns` turns, one `Role: content` line each
pub fn format_history(history: &[ChatTurn], max_turns: usize) -> String {
    let recent = if history.len() > max_turns {
        &history[history.len() - max_turns..]
    } else {
        history
    };

    recent
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}\n", role, turn.content)
        })
        .collect()
}

/// Build the full generation prompt
pub fn build_prompt(context: &str, history: &str, question: &str) -> String {
    format!(
        "You are a knowledgeable AI assistant. Answer the user's question using ONLY the context below.\n\
         For each key claim, cite the source like: [Source N].\n\
         If the answer is not in the context, say \"{refusal}\"\n\
         \n\
         === CONTEXT ===\n\
         {context}\n\
         \n\
         === CONVERSATION HISTORY ===\n\
         {history}\n\
         \n\
         === QUESTION ===\n\
         {question}\n\
         \n\
         === ANSWER (with citations) ===",
        refusal = REFUSAL_SENTENCE,
        context = context,
        history = history,
        question = question,
    )
}
