// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gemini REST client for embeddings, generation and page OCR

use async_trait::async_trait;
use base64::Engine as _;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::provider::{EmbeddingProvider, GenerationProvider, OcrProvider};
use super::sse::decode_events;
use super::types::{EmbedTask, LlmError, TokenStream};
use crate::config::GeminiConfig;

/// Instruction sent with a single scanned page
pub const OCR_PROMPT: &str =
    "Extract ALL text from this document page. Return only the extracted text, nothing else.";

// --- Gemini REST serde structs ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn pdf(bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: "application/pdf".to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: EmbedTask,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u32,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Resource path for a model, accepting names with or without the `models/` prefix
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Map non-success statuses onto typed errors
async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    match status.as_u16() {
        429 => Err(LlmError::RateLimited {
            provider: "gemini".to_string(),
        }),
        401 | 403 => Err(LlmError::Unauthorized { message }),
        code => Err(LlmError::Api {
            status: code,
            message,
        }),
    }
}

fn parse_stream_chunk(data: &str) -> Result<Option<String>, LlmError> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }
    let chunk: GenerateResponse = serde_json::from_str(data)
        .map_err(|e| LlmError::InvalidResponse(format!("stream chunk: {}", e)))?;
    let text = chunk.text();
    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Client for the Gemini REST API, bound to one API version
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_version: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a new client for `api_version` (e.g. "v1", "v1beta")
    pub fn new(config: &GeminiConfig, api_version: &str) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!(
            "Gemini client configured: base_url={}, api_version={}",
            base_url, api_version
        );

        Ok(Self {
            client,
            base_url,
            api_version: api_version.to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Get the API version this client talks to
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/{}/{}:{}",
            self.base_url,
            self.api_version,
            model_path(model),
            method
        )
    }

    /// Embed a batch of texts with `model`
    pub async fn embed_content(
        &self,
        model: &str,
        texts: &[String],
        task: EmbedTask,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        let start = Instant::now();
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: model_path(model),
                    content: Content {
                        role: None,
                        parts: vec![Part::text(text)],
                    },
                    task_type: task,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.model_url(model, "batchEmbedContents"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("embedding response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }
        if body.embeddings.iter().any(|e| e.values.is_empty()) {
            return Err(LlmError::InvalidResponse(
                "embedding response contained an empty vector".to_string(),
            ));
        }

        debug!(
            "batchEmbedContents on {} embedded {} texts as {} in {}ms",
            model,
            texts.len(),
            task.as_str(),
            start.elapsed().as_millis()
        );

        Ok(body.embeddings.into_iter().map(|e| e.values).collect())
    }

    async fn generate_parts(&self, model: &str, parts: Vec<Part>) -> Result<String, LlmError> {
        let start = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        };

        let response = self
            .client
            .post(self.model_url(model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("generate response: {}", e)))?;
        let tokens_used = body
            .usage_metadata
            .as_ref()
            .map(|u| u.total_token_count)
            .unwrap_or(0);
        debug!(
            "generateContent on {} finished in {}ms ({} tokens)",
            model,
            start.elapsed().as_millis(),
            tokens_used
        );

        Ok(body.text())
    }

    /// Generate a complete answer for a text prompt
    pub async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        self.generate_parts(model, vec![Part::text(prompt)]).await
    }

    /// Extract the text of a single-page PDF using the vision model
    pub async fn extract_page_text(&self, model: &str, page_pdf: &[u8]) -> Result<String, LlmError> {
        self.generate_parts(model, vec![Part::pdf(page_pdf), Part::text(OCR_PROMPT)])
            .await
    }

    /// Stream an answer for a text prompt
    pub async fn stream_generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<TokenStream, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
        };

        let response = self
            .client
            .post(self.model_url(model, "streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let stream = decode_events(response.bytes_stream()).filter_map(|event| async move {
            match event {
                Ok(data) => parse_stream_chunk(&data).transpose(),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(stream.boxed())
    }
}

/// Embedding provider backed by a probed Gemini model
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, texts: &[String], task: EmbedTask) -> Result<Vec<Vec<f32>>, LlmError> {
        self.client.embed_content(&self.model, texts, task).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Generation and OCR provider backed by a Gemini chat model
pub struct GeminiChat {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiChat {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        let model = model.into();
        info!(
            "Gemini chat model configured: model={}, api_version={}",
            model,
            client.api_version()
        );
        Self { client, model }
    }
}

#[async_trait]
impl GenerationProvider for GeminiChat {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.client.generate_content(&self.model, prompt).await
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, LlmError> {
        self.client.stream_generate_content(&self.model, prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl OcrProvider for GeminiChat {
    async fn extract_page_text(&self, page_pdf: &[u8]) -> Result<String, LlmError> {
        self.client.extract_page_text(&self.model, page_pdf).await
    }
}
