// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration for the ingestion/retrieval pipeline and the Gemini client
//!
//! Both configs load from environment variables (a `.env` file is honoured by
//! the binary) and fall back to the defaults below.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Gemini REST endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default chat/vision model
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Embedding models to try, in order of preference
pub const DEFAULT_EMBED_CANDIDATES: &[&str] = &[
    "gemini-embedding-001",
    "text-embedding-004",
    "embedding-001",
    "models/gemini-embedding-001",
    "models/text-embedding-004",
    "models/embedding-001",
];

/// API versions to probe, in order
pub const DEFAULT_API_VERSIONS: &[&str] = &["v1", "v1beta"];

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(value) => {
            let items: Vec<String> = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if items.is_empty() {
                default.iter().map(|s| s.to_string()).collect()
            } else {
                items
            }
        }
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Window size of a chunk, in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive windows
    pub chunk_overlap: usize,
    /// Chunks whose trimmed length is not above this are dropped
    pub min_chunk_chars: usize,
    /// Pages with fewer extracted characters than this are sent to OCR
    pub ocr_min_chars: usize,
    /// Texts per embedding request
    pub embed_batch_size: usize,
    /// Minimum spacing between embedding requests during ingestion
    pub batch_delay: Duration,
    /// Default number of chunks retrieved per question
    pub top_k: usize,
    /// Conversation turns included in the prompt
    pub history_turns: usize,
    /// Upper bound on vectors held in memory
    pub max_chunks: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            min_chunk_chars: 50,
            ocr_min_chars: 50,
            embed_batch_size: 50,
            batch_delay: Duration::from_millis(200),
            top_k: 6,
            history_turns: 6,
            max_chunks: 100_000,
        }
    }
}

impl RagConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chunk_size: env_parse("DOCMIND_CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_parse("DOCMIND_CHUNK_OVERLAP", defaults.chunk_overlap),
            min_chunk_chars: env_parse("DOCMIND_MIN_CHUNK_CHARS", defaults.min_chunk_chars),
            ocr_min_chars: env_parse("DOCMIND_OCR_MIN_CHARS", defaults.ocr_min_chars),
            embed_batch_size: env_parse("DOCMIND_EMBED_BATCH_SIZE", defaults.embed_batch_size),
            batch_delay: Duration::from_millis(env_parse(
                "DOCMIND_BATCH_DELAY_MS",
                defaults.batch_delay.as_millis() as u64,
            )),
            top_k: env_parse("DOCMIND_TOP_K", defaults.top_k),
            history_turns: env_parse("DOCMIND_HISTORY_TURNS", defaults.history_turns),
            max_chunks: env_parse("DOCMIND_MAX_CHUNKS", defaults.max_chunks),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.embed_batch_size == 0 {
            return Err("Embedding batch size must be greater than 0".to_string());
        }
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.max_chunks == 0 {
            return Err("max_chunks must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Connection settings for the Gemini REST API
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embed_candidates: Vec<String>,
    pub api_versions: Vec<String>,
    pub request_timeout: Duration,
}

// Keeps the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embed_candidates", &self.embed_candidates)
            .field("api_versions", &self.api_versions)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Config with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embed_candidates: DEFAULT_EMBED_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            api_versions: DEFAULT_API_VERSIONS.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Load configuration from environment variables
    ///
    /// The key is read from `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        let api_key = env::var("GOOGLE_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .unwrap_or_default();

        Self {
            api_key,
            base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            chat_model: env::var("DOCMIND_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            embed_candidates: env_list("DOCMIND_EMBED_MODELS", DEFAULT_EMBED_CANDIDATES),
            api_versions: env_list("DOCMIND_API_VERSIONS", DEFAULT_API_VERSIONS),
            request_timeout: Duration::from_secs(env_parse("DOCMIND_REQUEST_TIMEOUT_SECS", 120)),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err(
                "Gemini API key is missing (set GOOGLE_API_KEY or pass --api-key)".to_string(),
            );
        }
        if self.chat_model.trim().is_empty() {
            return Err("Chat model name cannot be empty".to_string());
        }
        if self.embed_candidates.is_empty() {
            return Err("At least one embedding model candidate is required".to_string());
        }
        if self.api_versions.is_empty() {
            return Err("At least one API version is required".to_string());
        }
        Ok(())
    }
}
