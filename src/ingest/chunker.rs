// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-size sliding-window chunking
//!
//! Windows are measured in characters, not bytes, so multi-byte text is never
//! split inside a character.

use serde::Serialize;

use crate::rag::errors::RagError;

/// A retained window of document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position among the kept chunks of the document
    pub index: usize,
    /// Character offset where the raw window starts
    pub start: usize,
    /// Character offset one past the raw window end
    pub end: usize,
    /// Trimmed window text
    pub text: String,
}

/// Split `text` into overlapping windows
///
/// Windows start every `chunk_size - overlap` characters; windows whose trimmed
/// length is not greater than `min_chars` are dropped.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    min_chars: usize,
) -> Result<Vec<Chunk>, RagError> {
    if chunk_size == 0 {
        return Err(RagError::Config(
            "Chunk size must be greater than 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(RagError::Config(format!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }

    // byte offset of every char boundary, plus the end of the string
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_len = boundaries.len();
    boundaries.push(text.len());

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        let window = text[boundaries[start]..boundaries[end]].trim();

        if window.chars().count() > min_chars {
            chunks.push(Chunk {
                index: chunks.len(),
                start,
                end,
                text: window.to_string(),
            });
        }
        start += step;
    }

    Ok(chunks)
}
