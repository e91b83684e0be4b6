// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Gemini REST client tests against a local mock server

use super::mock_server::{candidate, error_response, json_response, spawn, sse_response};
use axum::http::StatusCode;
use base64::Engine as _;
use docmind::llm::{EmbedTask, GeminiClient, LlmError, OCR_PROMPT};
use docmind::GeminiConfig;
use futures::StreamExt;
use serde_json::json;

fn config(base_url: &str) -> GeminiConfig {
    let mut config = GeminiConfig::new("test-key");
    config.base_url = base_url.to_string();
    config
}

#[tokio::test]
async fn test_embed_content_request_and_response() {
    let (url, log) = spawn(|_, _| {
        json_response(
            StatusCode::OK,
            json!({"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}),
        )
    })
    .await;

    let client = GeminiClient::new(&config(&url), "v1beta").unwrap();
    let texts = vec!["first".to_string(), "second".to_string()];
    let vectors = client
        .embed_content("text-embedding-004", &texts, EmbedTask::RetrievalQuery)
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/v1beta/models/text-embedding-004:batchEmbedContents");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));
    assert_eq!(request.body["requests"][1]["content"]["parts"][0]["text"], "second");
    assert_eq!(request.body["requests"][0]["taskType"], "RETRIEVAL_QUERY");
    assert_eq!(request.body["requests"][0]["model"], "models/text-embedding-004");
}

#[tokio::test]
async fn test_prefixed_model_name_not_doubled() {
    let (url, log) = spawn(|_, _| {
        json_response(StatusCode::OK, json!({"embeddings": [{"values": [1.0]}]}))
    })
    .await;

    let client = GeminiClient::new(&config(&url), "v1").unwrap();
    client
        .embed_content("models/embedding-001", &["x".to_string()], EmbedTask::RetrievalDocument)
        .await
        .unwrap();

    assert_eq!(
        log.lock().unwrap()[0].path,
        "/v1/models/embedding-001:batchEmbedContents"
    );
}

#[tokio::test]
async fn test_embedding_count_mismatch() {
    let (url, _) = spawn(|_, _| {
        json_response(StatusCode::OK, json!({"embeddings": [{"values": [1.0]}]}))
    })
    .await;

    let client = GeminiClient::new(&config(&url), "v1").unwrap();
    let err = client
        .embed_content(
            "gemini-embedding-001",
            &["a".to_string(), "b".to_string()],
            EmbedTask::RetrievalDocument,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_generate_content() {
    let (url, log) = spawn(|_, _| json_response(StatusCode::OK, candidate("The answer [Source 1].")))
        .await;

    let client = GeminiClient::new(&config(&url), "v1beta").unwrap();
    let text = client
        .generate_content("gemini-2.5-flash", "What is it?")
        .await
        .unwrap();
    assert_eq!(text, "The answer [Source 1].");

    let requests = log.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.path, "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(request.body["contents"][0]["role"], "user");
    assert_eq!(request.body["contents"][0]["parts"][0]["text"], "What is it?");
}

#[tokio::test]
async fn test_stream_generate_content() {
    let (url, log) = spawn(|_, _| {
        sse_response(&[
            candidate("Hel"),
            json!({"candidates": [{"content": {"parts": []}}]}),
            candidate("lo"),
            json!({"candidates": [{"finishReason": "STOP"}], "usageMetadata": {"totalTokenCount": 9}}),
        ])
    })
    .await;

    let client = GeminiClient::new(&config(&url), "v1beta").unwrap();
    let fragments: Vec<String> = client
        .stream_generate_content("gemini-2.5-flash", "Say hello")
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Hel", "lo"]);

    let requests = log.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.path, "/v1beta/models/gemini-2.5-flash:streamGenerateContent");
    assert_eq!(request.query.as_deref(), Some("alt=sse"));
}

#[tokio::test]
async fn test_extract_page_text_sends_inline_pdf() {
    let (url, log) = spawn(|_, _| json_response(StatusCode::OK, candidate("  page text  "))).await;

    let client = GeminiClient::new(&config(&url), "v1").unwrap();
    let text = client
        .extract_page_text("gemini-2.5-flash", b"%PDF-1.5 fake")
        .await
        .unwrap();
    assert_eq!(text, "  page text  ");

    let requests = log.lock().unwrap();
    let request = &requests[0];
    let parts = &request.body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
    assert_eq!(
        parts[0]["inlineData"]["data"],
        base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.5 fake")
    );
    assert_eq!(parts[1]["text"], OCR_PROMPT);
}

#[tokio::test]
async fn test_status_mapping() {
    let (url, _) = spawn(|path, _| {
        if path.contains("limited") {
            error_response(StatusCode::TOO_MANY_REQUESTS, "quota")
        } else if path.contains("forbidden") {
            error_response(StatusCode::FORBIDDEN, "API key not valid")
        } else {
            error_response(StatusCode::NOT_FOUND, "model not found")
        }
    })
    .await;
    let client = GeminiClient::new(&config(&url), "v1").unwrap();

    let err = client.generate_content("limited", "q").await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimited { .. }));

    let err = client.generate_content("forbidden", "q").await.unwrap_err();
    match err {
        LlmError::Unauthorized { message } => assert!(message.contains("API key not valid")),
        other => panic!("unexpected error: {:?}", other),
    }

    let err = client
        .stream_generate_content("missing", "q")
        .await
        .err()
        .unwrap();
    match err {
        LlmError::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("model not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
