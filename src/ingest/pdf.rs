// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Low-level PDF helpers
//!
//! These are blocking; callers run them on the blocking pool.

use lopdf::Document;

use crate::rag::errors::RagError;

/// Split a PDF into one standalone PDF per page, in page order
pub fn split_pages(bytes: &[u8]) -> Result<Vec<Vec<u8>>, RagError> {
    let document = Document::load_mem(bytes)
        .map_err(|e| RagError::Extraction(format!("Failed to parse PDF: {}", e)))?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for &number in &page_numbers {
        let mut single = document.clone();
        let others: Vec<u32> = page_numbers
            .iter()
            .copied()
            .filter(|&n| n != number)
            .collect();
        single.delete_pages(&others);
        single.prune_objects();

        let mut buffer = Vec::new();
        single.save_to(&mut buffer).map_err(|e| {
            RagError::Extraction(format!("Failed to write page {}: {}", number, e))
        })?;
        pages.push(buffer);
    }

    Ok(pages)
}

/// Extract the text of a single-page PDF
///
/// Unreadable pages (no text layer, unsupported fonts) yield an empty string.
pub fn page_text(page_pdf: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(page_pdf) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::debug!("pdf-extract failed on page: {}", e);
            String::new()
        }
    }
}
