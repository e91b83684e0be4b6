// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text extraction for PDF and plain-text documents
//!
//! PDFs are read page by page. Pages that yield almost no text (scans,
//! image-only pages) are sent to the vision model as single-page PDFs.

use std::path::Path;
use tracing::{debug, info, warn};

use super::pdf;
use crate::llm::OcrProvider;
use crate::rag::errors::RagError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Kind of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detect the kind from the file extension, falling back to the PDF header
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        let is_pdf_name = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf_name || bytes.starts_with(PDF_MAGIC) {
            DocumentKind::Pdf
        } else {
            DocumentKind::Text
        }
    }
}

/// Result of extracting a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedText {
    pub text: String,
    pub pages: usize,
    /// Pages whose text came from OCR
    pub ocr_pages: usize,
}

impl ExtractedText {
    /// Length of the text in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Decode a plain-text document, replacing invalid UTF-8
pub fn extract_text_from_txt(bytes: &[u8]) -> ExtractedText {
    ExtractedText {
        text: String::from_utf8_lossy(bytes).into_owned(),
        pages: 1,
        ocr_pages: 0,
    }
}

/// Extract a PDF page by page with optional OCR fallback
///
/// # Arguments
/// * `ocr` - Vision model used for pages with fewer than `ocr_min_chars` characters
///
/// # Returns
/// Page texts joined with `\n`, the page count and the number of OCR'd pages
pub async fn extract_text_from_pdf(
    bytes: &[u8],
    ocr: Option<&dyn OcrProvider>,
    ocr_min_chars: usize,
) -> Result<ExtractedText, RagError> {
    let owned = bytes.to_vec();
    let page_pdfs = tokio::task::spawn_blocking(move || pdf::split_pages(&owned))
        .await
        .map_err(|e| RagError::Extraction(format!("PDF parser task failed: {}", e)))??;

    let pages = page_pdfs.len();
    let mut page_texts = Vec::with_capacity(pages);
    let mut ocr_pages = 0;

    for (index, page_pdf) in page_pdfs.into_iter().enumerate() {
        let task_pdf = page_pdf.clone();
        let mut text = tokio::task::spawn_blocking(move || pdf::page_text(&task_pdf))
            .await
            .unwrap_or_else(|e| {
                // pdf-extract panics on some malformed fonts
                warn!("Text extraction crashed on page {}: {}", index + 1, e);
                String::new()
            });

        let chars = text.chars().count();
        if chars < ocr_min_chars {
            if let Some(ocr) = ocr {
                debug!("Page {} has {} chars, running OCR", index + 1, chars);
                match ocr.extract_page_text(&page_pdf).await {
                    Ok(ocr_text) => {
                        let ocr_text = ocr_text.trim();
                        if ocr_text.chars().count() > chars {
                            text = ocr_text.to_string();
                            ocr_pages += 1;
                        }
                    }
                    Err(e) => {
                        warn!("OCR failed for page {}: {}", index + 1, e);
                    }
                }
            }
        }

        page_texts.push(text);
    }

    info!(
        "Extracted {} pages from PDF ({} via OCR)",
        pages, ocr_pages
    );

    Ok(ExtractedText {
        text: page_texts.join("\n"),
        pages,
        ocr_pages,
    })
}

/// Extract any supported document
pub async fn extract_document(
    file_name: &str,
    bytes: &[u8],
    ocr: Option<&dyn OcrProvider>,
    ocr_min_chars: usize,
) -> Result<(DocumentKind, ExtractedText), RagError> {
    let kind = DocumentKind::detect(file_name, bytes);
    let extracted = match kind {
        DocumentKind::Pdf => extract_text_from_pdf(bytes, ocr, ocr_min_chars).await?,
        DocumentKind::Text => extract_text_from_txt(bytes),
    };
    Ok((kind, extracted))
}
