// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Streamed answers and their sources

use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use super::errors::RagError;
use super::store::ScoredChunk;

/// A retrieved chunk shown alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub doc_name: String,
    pub doc_id: String,
    pub chunk_idx: usize,
    pub chunk: String,
    pub distance: f32,
}

impl From<&ScoredChunk> for Source {
    fn from(scored: &ScoredChunk) -> Self {
        Self {
            doc_name: scored.record.doc_name.clone(),
            doc_id: scored.record.doc_id.clone(),
            chunk_idx: scored.record.chunk_idx,
            chunk: scored.record.text.clone(),
            distance: scored.distance,
        }
    }
}

impl Source {
    /// First `max_chars` characters of the chunk, with an ellipsis if cut
    pub fn preview(&self, max_chars: usize) -> String {
        if self.chunk.chars().count() <= max_chars {
            self.chunk.clone()
        } else {
            let cut: String = self.chunk.chars().take(max_chars).collect();
            format!("{}…", cut)
        }
    }
}

/// Document names of `sources`, deduplicated in first-seen order
pub fn unique_documents(sources: &[Source]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for source in sources {
        if !names.contains(&source.doc_name) {
            names.push(source.doc_name.clone());
        }
    }
    names
}

/// Token stream of one answer
///
/// Every fragment is also appended to an internal buffer, so the complete
/// answer is available from `answer()` once the stream has ended.
pub struct AnswerStream {
    receiver: mpsc::Receiver<Result<String, RagError>>,
    /// Yielded before anything from `receiver`
    pending: Option<String>,
    full_answer: String,
    finished: bool,
}

impl AnswerStream {
    pub fn new(receiver: mpsc::Receiver<Result<String, RagError>>) -> Self {
        Self {
            receiver,
            pending: None,
            full_answer: String::new(),
            finished: false,
        }
    }

    /// Stream that yields `text` once and ends
    pub fn ready(text: impl Into<String>) -> Self {
        let (_, closed) = mpsc::channel(1);
        Self {
            pending: Some(text.into()),
            ..Self::new(closed)
        }
    }

    /// Text received so far
    pub fn answer(&self) -> &str {
        &self.full_answer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the stream and return the full answer
    pub async fn collect_answer(mut self) -> Result<String, RagError> {
        while let Some(fragment) = self.next().await {
            fragment?;
        }
        Ok(self.full_answer)
    }
}

impl Stream for AnswerStream {
    type Item = Result<String, RagError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(fragment) = self.pending.take() {
            self.full_answer.push_str(&fragment);
            return Poll::Ready(Some(Ok(fragment)));
        }

        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                self.full_answer.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Answer to one question: the sources used plus the streamed text
pub struct RagAnswer {
    pub sources: Vec<Source>,
    pub stream: AnswerStream,
}

impl RagAnswer {
    /// Document names cited by this answer, first-seen order
    pub fn documents(&self) -> Vec<String> {
        unique_documents(&self.sources)
    }
}
