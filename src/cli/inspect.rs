// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extraction and chunking report, no embeddings involved

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{GeminiConfig, RagConfig};
use crate::ingest::{chunk_text, extract_document, Chunk, DocumentKind};
use crate::llm::{GeminiChat, GeminiClient, OcrProvider};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Run OCR on pages with too little text (needs an API key)
    #[arg(long)]
    pub ocr: bool,

    /// Print every chunk
    #[arg(long)]
    pub show_chunks: bool,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Files to inspect
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Extraction and chunking summary of one file
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub file_name: String,
    pub kind: String,
    pub pages: usize,
    pub ocr_pages: usize,
    pub chars: usize,
    pub chunks: usize,
    pub avg_chunk_chars: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chunk_list: Vec<Chunk>,
}

pub async fn run(gemini: &GeminiConfig, rag: &RagConfig, args: InspectArgs) -> Result<()> {
    let ocr: Option<Arc<dyn OcrProvider>> = if args.ocr {
        gemini.validate().map_err(anyhow::Error::msg)?;
        let version = gemini
            .api_versions
            .first()
            .map(String::as_str)
            .unwrap_or("v1beta");
        let client = Arc::new(GeminiClient::new(gemini, version)?);
        Some(Arc::new(GeminiChat::new(client, gemini.chat_model.clone())))
    } else {
        None
    };

    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (kind, extracted) =
            extract_document(&file_name, &bytes, ocr.as_deref(), rag.ocr_min_chars).await?;
        let chunks = chunk_text(
            &extracted.text,
            rag.chunk_size,
            rag.chunk_overlap,
            rag.min_chunk_chars,
        )?;

        reports.push(build_report(
            file_name,
            kind,
            extracted.pages,
            extracted.ocr_pages,
            extracted.char_count(),
            chunks,
            args.show_chunks,
        ));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}

fn build_report(
    file_name: String,
    kind: DocumentKind,
    pages: usize,
    ocr_pages: usize,
    chars: usize,
    chunks: Vec<Chunk>,
    keep_chunks: bool,
) -> InspectReport {
    let total: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
    let avg_chunk_chars = if chunks.is_empty() {
        0
    } else {
        total / chunks.len()
    };

    InspectReport {
        file_name,
        kind: match kind {
            DocumentKind::Pdf => "pdf".to_string(),
            DocumentKind::Text => "text".to_string(),
        },
        pages,
        ocr_pages,
        chars,
        chunks: chunks.len(),
        avg_chunk_chars,
        chunk_list: if keep_chunks { chunks } else { Vec::new() },
    }
}

fn print_report(report: &InspectReport) {
    println!(
        "{} ({}): {} pages ({} via OCR), {} chars, {} chunks, avg {} chars/chunk",
        report.file_name,
        report.kind,
        report.pages,
        report.ocr_pages,
        report.chars,
        report.chunks,
        report.avg_chunk_chars
    );
    for chunk in &report.chunk_list {
        println!("--- chunk #{} [{}..{}]", chunk.index, chunk.start, chunk.end);
        println!("{}", chunk.text);
    }
}
