// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod chat;
pub mod inspect;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{GeminiConfig, RagConfig};
use crate::rag::{ChatTurn, DocumentStats, RagAnswer, RagEngine, Source};

/// Chunks previewed under an answer
const PREVIEW_CHUNKS: usize = 4;
/// Characters shown per previewed chunk
const PREVIEW_CHARS: usize = 400;

/// DocMind CLI
#[derive(Parser, Debug)]
#[command(name = "docmind")]
#[command(version)]
#[command(about = "Ask questions about your PDF and text documents", long_about = None)]
pub struct Cli {
    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Chat/vision model used for answers and OCR
    #[arg(long, env = "DOCMIND_CHAT_MODEL", global = true)]
    pub chat_model: Option<String>,

    /// Override the Gemini API endpoint
    #[arg(long, env = "GEMINI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index documents and answer one question
    Ask(AskArgs),

    /// Index documents and start an interactive session
    Chat(ChatArgs),

    /// Show extraction and chunking results without embedding
    Inspect(inspect::InspectArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// PDF or text file to index (repeatable)
    #[arg(short, long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Print the retrieved chunks under the answer
    #[arg(long)]
    pub show_context: bool,

    /// The question to answer
    pub question: String,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// PDF or text file to index at startup (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Number of chunks to retrieve per question
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

impl Cli {
    /// Gemini settings from the environment, overridden by flags
    pub fn gemini_config(&self) -> GeminiConfig {
        let mut config = GeminiConfig::from_env();
        if let Some(key) = &self.api_key {
            config.api_key = key.clone();
        }
        if let Some(model) = &self.chat_model {
            config.chat_model = model.clone();
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        config
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let gemini = cli.gemini_config();
    let rag = RagConfig::from_env();
    rag.validate().map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Ask(args) => ask(&gemini, rag, args).await,
        Commands::Chat(args) => chat::run(&gemini, rag, args).await,
        Commands::Inspect(args) => inspect::run(&gemini, &rag, args).await,
    }
}

async fn ask(gemini: &GeminiConfig, rag: RagConfig, args: AskArgs) -> Result<()> {
    let engine = RagEngine::connect_gemini(gemini, rag)
        .await
        .context("Failed to initialise the RAG engine")?;

    for path in &args.files {
        index_file(&engine, path).await?;
    }

    let top_k = args.top_k.unwrap_or(engine.config().top_k);
    let history = vec![ChatTurn::user(args.question.clone())];
    let answer = engine.query(&args.question, top_k, &history).await?;

    let (_, sources) = print_answer(answer).await?;
    print_sources(&sources, args.show_context);
    Ok(())
}

/// Index one file unless a document with its name is already loaded
pub(crate) async fn index_file(engine: &RagEngine, path: &Path) -> Result<Option<DocumentStats>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if engine.has_document(&name).await {
        println!("{} is already indexed, skipping", name);
        return Ok(None);
    }

    let stats = engine
        .ingest_path(path)
        .await
        .with_context(|| format!("Failed to index {}", path.display()))?;
    println!("Indexed {}", format_stats(&stats));
    Ok(Some(stats))
}

pub(crate) fn format_stats(stats: &DocumentStats) -> String {
    let mut line = format!(
        "{} [{}]: {} pages, {} chunks, {} chars",
        stats.file_name, stats.doc_id, stats.pages, stats.chunks, stats.chars
    );
    if stats.ocr_pages > 0 {
        line.push_str(&format!(", {} pages via OCR", stats.ocr_pages));
    }
    line
}

/// Stream an answer to stdout
///
/// # Returns
/// The full answer text and its sources
pub(crate) async fn print_answer(answer: RagAnswer) -> Result<(String, Vec<Source>)> {
    let RagAnswer {
        sources,
        mut stream,
    } = answer;

    let mut stdout = std::io::stdout();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        write!(stdout, "{}", fragment)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok((stream.answer().to_string(), sources))
}

pub(crate) fn print_sources(sources: &[Source], show_context: bool) {
    if sources.is_empty() {
        return;
    }

    println!();
    println!("Sources: {}", crate::rag::unique_documents(sources).join(", "));

    if show_context {
        for (i, source) in sources.iter().take(PREVIEW_CHUNKS).enumerate() {
            println!();
            println!(
                "[Source {}] {} - chunk #{} (distance {:.3})",
                i + 1,
                source.doc_name,
                source.chunk_idx,
                source.distance
            );
            println!("{}", source.preview(PREVIEW_CHARS));
        }
    }
}
