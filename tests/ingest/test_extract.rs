// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// PDF extraction and OCR fallback tests

use async_trait::async_trait;
use docmind::ingest::pdf::split_pages;
use docmind::ingest::{extract_document, extract_text_from_pdf, DocumentKind};
use docmind::llm::{LlmError, OcrProvider};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};

const TEXT_LAYER: &str =
    "This first page has a genuine text layer that is comfortably longer than fifty characters.";
const OCR_TEXT: &str = "Scanned page text recovered by the vision model, long enough to count.";

/// Build a PDF with one page per entry; `None` pages have no text layer
fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let operations = match page {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn two_page_pdf() -> Vec<u8> {
    build_pdf(&[Some(TEXT_LAYER), None])
}

/// Returns a fixed text and counts calls
struct FixedOcr {
    text: String,
    calls: AtomicUsize,
}

impl FixedOcr {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OcrProvider for FixedOcr {
    async fn extract_page_text(&self, page_pdf: &[u8]) -> Result<String, LlmError> {
        assert!(page_pdf.starts_with(b"%PDF-"));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("  {}  ", self.text))
    }
}

struct BrokenOcr;

#[async_trait]
impl OcrProvider for BrokenOcr {
    async fn extract_page_text(&self, _page_pdf: &[u8]) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "vision model overloaded".to_string(),
        })
    }
}

#[test]
fn test_split_pages_yields_single_page_pdfs() {
    let pages = split_pages(&build_pdf(&[Some("one"), Some("two"), None])).unwrap();
    assert_eq!(pages.len(), 3);
    for page in &pages {
        let doc = Document::load_mem(page).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}

#[tokio::test]
async fn test_page_without_text_goes_to_ocr() {
    let ocr = FixedOcr::new(OCR_TEXT);
    let extracted = extract_text_from_pdf(&two_page_pdf(), Some(&ocr), 50)
        .await
        .unwrap();

    assert_eq!(extracted.pages, 2);
    assert!(extracted.text.contains("genuine text layer"));
    assert!(extracted.text.contains(OCR_TEXT));
    // only the page without a text layer is sent to OCR
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    assert_eq!(extracted.ocr_pages, 1);
    assert!(!extracted.text.contains("  Scanned"));
    assert!(extracted.text.find("genuine") < extracted.text.find("Scanned"));
}

#[tokio::test]
async fn test_ocr_text_only_used_when_longer() {
    let ocr = FixedOcr::new("");
    let extracted = extract_text_from_pdf(&two_page_pdf(), Some(&ocr), 10_000)
        .await
        .unwrap();

    // both pages were below the threshold
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    assert_eq!(extracted.ocr_pages, 0);
    assert_eq!(extracted.pages, 2);
}

#[tokio::test]
async fn test_ocr_failure_is_ignored() {
    let extracted = extract_text_from_pdf(&two_page_pdf(), Some(&BrokenOcr), 50)
        .await
        .unwrap();
    assert_eq!(extracted.pages, 2);
    assert_eq!(extracted.ocr_pages, 0);
}

#[tokio::test]
async fn test_no_ocr_provider() {
    let (kind, extracted) = extract_document("scan.pdf", &two_page_pdf(), None, 50)
        .await
        .unwrap();
    assert_eq!(kind, DocumentKind::Pdf);
    assert_eq!(extracted.pages, 2);
    assert_eq!(extracted.ocr_pages, 0);
    assert!(extracted.text.contains("genuine text layer"));
    assert!(!extracted.text.contains(OCR_TEXT));
}

#[tokio::test]
async fn test_text_layer_extracted_from_each_page() {
    let pdf = build_pdf(&[Some("Alpha page about tidal energy"), Some("Beta page about wind farms")]);
    let extracted = extract_text_from_pdf(&pdf, None, 0).await.unwrap();

    assert_eq!(extracted.pages, 2);
    let alpha = extracted.text.find("tidal energy").unwrap();
    let beta = extracted.text.find("wind farms").unwrap();
    assert!(alpha < beta);
}

#[tokio::test]
async fn test_pdf_detected_by_header_without_extension() {
    let (kind, extracted) = extract_document("upload", &build_pdf(&[None]), None, 50)
        .await
        .unwrap();
    assert_eq!(kind, DocumentKind::Pdf);
    assert_eq!(extracted.pages, 1);
    assert_eq!(extracted.text, "");
}

#[tokio::test]
async fn test_text_document() {
    let (kind, extracted) = extract_document("notes.md", "# Notes\nplain text".as_bytes(), None, 50)
        .await
        .unwrap();
    assert_eq!(kind, DocumentKind::Text);
    assert_eq!(extracted.text, "# Notes\nplain text");
    assert_eq!(extracted.pages, 1);
}
