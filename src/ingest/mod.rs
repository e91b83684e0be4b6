// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document ingestion: text extraction, OCR fallback and chunking

pub mod chunker;
pub mod extract;
pub mod pdf;

pub use chunker::{chunk_text, Chunk};
pub use extract::{
    extract_document, extract_text_from_pdf, extract_text_from_txt, DocumentKind, ExtractedText,
};
