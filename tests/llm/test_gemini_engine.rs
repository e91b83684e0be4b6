// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// End-to-end engine run against the mock Gemini API

use super::mock_server::{candidate, embeddings_for, error_response, json_response, spawn, sse_response};
use axum::http::StatusCode;
use docmind::rag::{ChatTurn, RagEngine, RagError};
use docmind::{GeminiConfig, RagConfig};
use std::time::Duration;

fn rag_config() -> RagConfig {
    RagConfig {
        chunk_size: 120,
        chunk_overlap: 20,
        min_chunk_chars: 10,
        batch_delay: Duration::ZERO,
        ..RagConfig::default()
    }
}

#[tokio::test]
async fn test_connect_ingest_and_answer() {
    let (url, log) = spawn(|path, body| {
        if path.ends_with(":batchEmbedContents") {
            json_response(StatusCode::OK, embeddings_for(body))
        } else if path.ends_with(":streamGenerateContent") {
            sse_response(&[candidate("Zebras are striped "), candidate("[Source 1].")])
        } else {
            error_response(StatusCode::NOT_FOUND, "unexpected call")
        }
    })
    .await;

    let mut gemini = GeminiConfig::new("test-key");
    gemini.base_url = url;
    let engine = RagEngine::connect_gemini(&gemini, rag_config()).await.unwrap();
    assert_eq!(engine.embed_model(), "gemini-embedding-001");
    assert_eq!(engine.chat_model(), "gemini-2.5-flash");

    let text = "Zebras have black and white stripes that confuse biting flies. \
                Each zebra has a unique stripe pattern like a fingerprint.";
    let stats = engine.ingest_document("zebras.txt", text.as_bytes()).await.unwrap();
    assert!(stats.chunks >= 1);

    let question = "Why are zebras striped?";
    let history = vec![ChatTurn::user(question)];
    let answer = engine.query(question, 6, &history).await.unwrap();
    assert_eq!(answer.sources.len(), stats.chunks);
    assert!(answer.sources.iter().all(|s| s.doc_name == "zebras.txt"));
    assert_eq!(
        answer.stream.collect_answer().await.unwrap(),
        "Zebras are striped [Source 1]."
    );

    let requests = log.lock().unwrap();
    let embed_tasks: Vec<&str> = requests
        .iter()
        .filter(|r| r.path.ends_with(":batchEmbedContents"))
        .map(|r| r.body["requests"][0]["taskType"].as_str().unwrap_or(""))
        .collect();
    // probe, document batch, question
    assert_eq!(
        embed_tasks,
        vec!["RETRIEVAL_DOCUMENT", "RETRIEVAL_DOCUMENT", "RETRIEVAL_QUERY"]
    );

    let generation = requests
        .iter()
        .find(|r| r.path.ends_with(":streamGenerateContent"))
        .unwrap();
    let prompt = generation.body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.contains("[Source 1 | Document: zebras.txt | Chunk #"));
    assert!(prompt.contains("=== CONVERSATION HISTORY ===\nUser: Why are zebras striped?\n"));
}

#[tokio::test]
async fn test_connect_requires_api_key() {
    let gemini = GeminiConfig::new("");
    let result = RagEngine::connect_gemini(&gemini, rag_config()).await;
    assert!(matches!(result, Err(RagError::Config(_))));
}

#[tokio::test]
async fn test_connect_fails_without_embedding_model() {
    let (url, _) = spawn(|_, _| error_response(StatusCode::NOT_FOUND, "model not found")).await;

    let mut gemini = GeminiConfig::new("test-key");
    gemini.base_url = url;
    let result = RagEngine::connect_gemini(&gemini, rag_config()).await;
    match result {
        Err(RagError::Embedding(e)) => {
            assert!(e.to_string().starts_with("No working embedding model found"))
        }
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("engine should not connect"),
    }
}
