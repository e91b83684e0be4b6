// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! RAG engine
//!
//! Ingests documents (extract, chunk, embed, index) and answers questions
//! (embed, retrieve, build prompt, stream generation).

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::answer::{AnswerStream, RagAnswer, Source};
use super::conversation::ChatTurn;
use super::errors::RagError;
use super::prompt::{build_context, build_prompt, format_history, NO_DOCUMENTS_MESSAGE};
use super::store::{ChunkRecord, StoredChunk, VectorStore};
use crate::config::{GeminiConfig, RagConfig};
use crate::ingest::{chunk_text, extract_document};
use crate::llm::{
    probe_embedding_model, BatchPacer, EmbedTask, EmbeddingProvider, GeminiChat, GeminiEmbedder,
    GenerationProvider, LlmError, OcrProvider,
};

/// Capacity of the channel between the model stream and the caller
const ANSWER_CHANNEL_CAPACITY: usize = 100;

/// Per-document ingestion statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStats {
    pub doc_id: String,
    pub file_name: String,
    pub pages: usize,
    pub chunks: usize,
    /// Characters of extracted text
    pub chars: usize,
    pub ocr_pages: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug)]
struct EngineState {
    store: VectorStore,
    /// Registry in ingest order; file names are unique
    documents: Vec<DocumentStats>,
}

impl EngineState {
    fn position(&self, file_name: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.file_name == file_name)
    }
}

/// Document question-answering engine
pub struct RagEngine {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    ocr: Option<Arc<dyn OcrProvider>>,
    pacer: BatchPacer,
    state: RwLock<EngineState>,
}

impl RagEngine {
    /// Create an engine from explicit providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<Self, RagError> {
        config.validate().map_err(RagError::Config)?;

        let state = EngineState {
            store: VectorStore::new(config.max_chunks),
            documents: Vec::new(),
        };

        Ok(Self {
            pacer: BatchPacer::new(config.batch_delay),
            config,
            embedder,
            generator,
            ocr: None,
            state: RwLock::new(state),
        })
    }

    /// Enable OCR for PDF pages with too little text
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrProvider>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Probe for a working embedding model and wire Gemini for everything
    pub async fn connect_gemini(gemini: &GeminiConfig, config: RagConfig) -> Result<Self, RagError> {
        gemini.validate().map_err(RagError::Config)?;

        let probed = probe_embedding_model(gemini)
            .await
            .map_err(RagError::Embedding)?;
        let chat = Arc::new(GeminiChat::new(probed.client.clone(), gemini.chat_model.clone()));
        let embedder = Arc::new(GeminiEmbedder::new(probed.client, probed.model));

        let engine = Self::new(config, embedder, chat.clone())?.with_ocr(chat);
        info!(
            "RAG engine ready: embed_model={}, chat_model={}",
            engine.embed_model(),
            engine.chat_model()
        );
        Ok(engine)
    }

    /// Ingest a document from memory
    ///
    /// A document with the same file name is replaced.
    pub async fn ingest_document(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentStats, RagError> {
        let start = Instant::now();

        let (kind, extracted) = extract_document(
            file_name,
            bytes,
            self.ocr.as_deref(),
            self.config.ocr_min_chars,
        )
        .await?;
        debug!("Extracted {:?} document {}", kind, file_name);

        let chunks = chunk_text(
            &extracted.text,
            self.config.chunk_size,
            self.config.chunk_overlap,
            self.config.min_chunk_chars,
        )?;

        let doc_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();

        // every batch is embedded before the store is touched
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.embed_batch_size) {
            self.pacer.wait().await;

            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self
                .embedder
                .embed(&texts, EmbedTask::RetrievalDocument)
                .await
                .map_err(RagError::Embedding)?;

            if embeddings.len() != batch.len() {
                return Err(RagError::Embedding(LlmError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                ))));
            }
            vectors.extend(embeddings);
        }

        let stats = DocumentStats {
            doc_id: doc_id.clone(),
            file_name: file_name.to_string(),
            pages: extracted.pages,
            chunks: chunks.len(),
            chars: extracted.char_count(),
            ocr_pages: extracted.ocr_pages,
            ingested_at: Utc::now(),
        };

        let mut state = self.state.write().await;

        let replaced = state.position(file_name);
        let replaced_id = replaced.map(|i| state.documents[i].doc_id.clone());

        let stored = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredChunk {
                id: format!("{}_{}", doc_id, chunk.index),
                vector,
                record: ChunkRecord {
                    doc_id: doc_id.clone(),
                    doc_name: file_name.to_string(),
                    chunk_idx: chunk.index,
                    text: chunk.text,
                },
            })
            .collect();
        let removed = state
            .store
            .replace_document(replaced_id.as_deref(), stored)?;

        if let Some(i) = replaced {
            state.documents.remove(i);
            info!(
                "Replaced earlier copy of {} ({} chunks removed)",
                file_name, removed
            );
        }
        state.documents.push(stats.clone());

        info!(
            "Ingested {}: {} pages, {} chunks, {} chars, {} OCR pages in {}ms",
            file_name,
            stats.pages,
            stats.chunks,
            stats.chars,
            stats.ocr_pages,
            start.elapsed().as_millis()
        );

        Ok(stats)
    }

    /// Ingest a file from disk under its file name
    pub async fn ingest_path(&self, path: impl AsRef<Path>) -> Result<DocumentStats, RagError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.ingest_document(&file_name, &bytes).await
    }

    /// Remove a document and all of its chunks
    ///
    /// # Returns
    /// `false` if no document has that name
    pub async fn remove_document(&self, file_name: &str) -> bool {
        let mut state = self.state.write().await;
        match state.position(file_name) {
            Some(i) => {
                let stats = state.documents.remove(i);
                let removed = state.store.delete_document(&stats.doc_id);
                info!("Removed {} ({} chunks)", file_name, removed);
                true
            }
            None => false,
        }
    }

    /// Remove every document
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.store.clear();
        state.documents.clear();
        info!("Cleared all documents");
    }

    /// Answer a question from the ingested documents
    ///
    /// # Arguments
    /// * `top_k` - Chunks to retrieve, capped at the number stored
    /// * `history` - Conversation so far; only the last `history_turns` are used
    pub async fn query(
        &self,
        question: &str,
        top_k: usize,
        history: &[ChatTurn],
    ) -> Result<RagAnswer, RagError> {
        if self.state.read().await.store.is_empty() {
            return Ok(RagAnswer {
                sources: Vec::new(),
                stream: AnswerStream::ready(NO_DOCUMENTS_MESSAGE),
            });
        }

        let query_vector = self
            .embedder
            .embed(&[question.to_string()], EmbedTask::RetrievalQuery)
            .await
            .map_err(RagError::Embedding)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RagError::Embedding(LlmError::InvalidResponse(
                    "no embedding returned for question".to_string(),
                ))
            })?;

        let results = {
            let state = self.state.read().await;
            let k = top_k.min(state.store.count());
            state.store.query(&query_vector, k)?
        };
        debug!("Retrieved {} chunks for question", results.len());

        let context = build_context(&results);
        let history = format_history(history, self.config.history_turns);
        let prompt = build_prompt(&context, &history, question);
        let sources: Vec<Source> = results.iter().map(Source::from).collect();

        let mut tokens = self
            .generator
            .generate_stream(&prompt)
            .await
            .map_err(RagError::Generation)?;

        let (tx, rx) = mpsc::channel(ANSWER_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(item) = tokens.next().await {
                let failed = item.is_err();
                if tx.send(item.map_err(RagError::Generation)).await.is_err() {
                    debug!("Answer receiver dropped, stopping stream");
                    break;
                }
                if failed {
                    warn!("Generation stream failed");
                    break;
                }
            }
        });

        Ok(RagAnswer {
            sources,
            stream: AnswerStream::new(rx),
        })
    }

    /// Number of chunks across all documents
    pub async fn total_chunks(&self) -> usize {
        self.state.read().await.store.count()
    }

    /// Stats of every document, in ingest order
    pub async fn list_documents(&self) -> Vec<DocumentStats> {
        self.state.read().await.documents.clone()
    }

    pub async fn get_document(&self, file_name: &str) -> Option<DocumentStats> {
        let state = self.state.read().await;
        state.position(file_name).map(|i| state.documents[i].clone())
    }

    pub async fn has_document(&self, file_name: &str) -> bool {
        self.state.read().await.position(file_name).is_some()
    }

    pub fn embed_model(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn chat_model(&self) -> &str {
        self.generator.model_name()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}
