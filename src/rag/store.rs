// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// In-memory vector storage for document chunks
// Lives for the life of the process; nothing is persisted

use serde::Serialize;
use std::collections::HashMap;

use super::errors::RagError;
use super::similarity::cosine_similarity;

/// Metadata stored beside each vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    pub doc_id: String,
    pub doc_name: String,
    pub chunk_idx: usize,
    pub text: String,
}

/// Entry stored in the vector store
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: String,
    pub vector: Vec<f32>,
    pub record: ChunkRecord,
}

/// Result from a similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub id: String,
    pub similarity: f32,
    /// Cosine distance, `1 - similarity`
    pub distance: f32,
    pub record: ChunkRecord,
}

/// Vector store with cosine nearest-neighbour search
/// - Dimension is fixed by the first insert
/// - Entries keep insertion order, which breaks score ties
#[derive(Debug)]
pub struct VectorStore {
    entries: Vec<StoredChunk>,
    index: HashMap<String, usize>,
    dimension: Option<usize>,
    max_vectors: usize,
}

impl VectorStore {
    /// Create new vector store
    ///
    /// # Arguments
    /// * `max_vectors` - Maximum number of vectors allowed (memory limit)
    pub fn new(max_vectors: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            dimension: None,
            max_vectors,
        }
    }

    /// Add vector to store, replacing any entry with the same id
    ///
    /// # Returns
    /// * `Err` if the vector is empty, non-finite, of the wrong dimension, or
    ///   the store is full
    pub fn add(&mut self, id: String, vector: Vec<f32>, record: ChunkRecord) -> Result<(), RagError> {
        check_vector(&vector, self.dimension)?;

        if !self.index.contains_key(&id) && self.entries.len() >= self.max_vectors {
            return Err(RagError::CapacityExceeded {
                current: self.entries.len(),
                max: self.max_vectors,
            });
        }

        self.insert(StoredChunk { id, vector, record });
        Ok(())
    }

    /// Store a document's vectors, removing the document `replaces` in the
    /// same step
    ///
    /// Capacity is checked against the count once `replaces` is gone. On
    /// error the store is left unchanged.
    ///
    /// # Returns
    /// Number of vectors removed
    pub fn replace_document(
        &mut self,
        replaces: Option<&str>,
        chunks: Vec<StoredChunk>,
    ) -> Result<usize, RagError> {
        let freed = replaces.map(|doc_id| self.count_document(doc_id)).unwrap_or(0);
        let remaining = self.entries.len() - freed;

        let mut dimension = if remaining > 0 { self.dimension } else { None };
        for chunk in &chunks {
            check_vector(&chunk.vector, dimension)?;
            dimension = Some(chunk.vector.len());
        }

        if remaining + chunks.len() > self.max_vectors {
            return Err(RagError::CapacityExceeded {
                current: self.entries.len(),
                max: self.max_vectors,
            });
        }

        let removed = replaces
            .map(|doc_id| self.delete_document(doc_id))
            .unwrap_or(0);
        for chunk in chunks {
            self.insert(chunk);
        }
        Ok(removed)
    }

    fn insert(&mut self, chunk: StoredChunk) {
        self.dimension = Some(chunk.vector.len());
        match self.index.get(&chunk.id) {
            Some(&slot) => self.entries[slot] = chunk,
            None => {
                self.index.insert(chunk.id.clone(), self.entries.len());
                self.entries.push(chunk);
            }
        }
    }

    /// Find the `k` entries most similar to `query`
    ///
    /// `k` is capped at the number of stored vectors. Results are sorted by
    /// similarity descending.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| {
                let similarity = cosine_similarity(query, &entry.vector);
                ScoredChunk {
                    id: entry.id.clone(),
                    similarity,
                    distance: 1.0 - similarity,
                    record: entry.record.clone(),
                }
            })
            .collect();

        // sort_by is stable, so equal scores keep insertion order
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k.min(self.entries.len()));

        Ok(results)
    }

    /// Remove every vector belonging to a document
    ///
    /// # Returns
    /// Number of vectors removed
    pub fn delete_document(&mut self, doc_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.record.doc_id != doc_id);
        let removed = before - self.entries.len();

        if removed > 0 {
            self.rebuild_index();
        }
        removed
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, entry)| (entry.id.clone(), slot))
            .collect();
        if self.entries.is_empty() {
            self.dimension = None;
        }
    }

    /// Get count of vectors in store
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Count vectors of one document
    pub fn count_document(&self, doc_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.record.doc_id == doc_id)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all vectors from store
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.dimension = None;
    }

    /// Dimension fixed by the first insert, if any
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Get maximum vector capacity
    pub fn max_vectors(&self) -> usize {
        self.max_vectors
    }
}

fn check_vector(vector: &[f32], dimension: Option<usize>) -> Result<(), RagError> {
    if vector.is_empty() {
        return Err(RagError::InvalidVector("vector is empty".to_string()));
    }

    // NaN would poison every similarity score
    if vector.iter().any(|v| v.is_nan() || v.is_infinite()) {
        return Err(RagError::InvalidVector(
            "contains NaN or Infinity (all values must be finite numbers)".to_string(),
        ));
    }

    match dimension {
        Some(expected) if vector.len() != expected => Err(RagError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        _ => Ok(()),
    }
}
