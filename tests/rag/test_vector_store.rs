// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Vector store query and deletion tests

use docmind::rag::{ChunkRecord, VectorStore};

fn record(doc_id: &str, idx: usize) -> ChunkRecord {
    ChunkRecord {
        doc_id: doc_id.to_string(),
        doc_name: format!("{}.pdf", doc_id),
        chunk_idx: idx,
        text: format!("text of {} #{}", doc_id, idx),
    }
}

fn populated() -> VectorStore {
    let mut store = VectorStore::new(1000);
    store.add("a_0".to_string(), vec![1.0, 0.0, 0.0], record("a", 0)).unwrap();
    store.add("a_1".to_string(), vec![0.7, 0.7, 0.0], record("a", 1)).unwrap();
    store.add("b_0".to_string(), vec![0.0, 1.0, 0.0], record("b", 0)).unwrap();
    store.add("b_1".to_string(), vec![0.0, 0.0, 1.0], record("b", 1)).unwrap();
    store
}

#[test]
fn test_query_sorted_by_similarity() {
    let store = populated();
    let results = store.query(&[1.0, 0.1, 0.0], 4).unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a_0", "a_1", "b_0", "b_1"]);
    for result in &results {
        assert!((result.distance - (1.0 - result.similarity)).abs() < 1e-6);
    }
    assert!(results[0].similarity > 0.99);
}

#[test]
fn test_k_capped_at_count() {
    let store = populated();
    assert_eq!(store.query(&[1.0, 0.0, 0.0], 100).unwrap().len(), 4);
    assert_eq!(store.query(&[1.0, 0.0, 0.0], 2).unwrap().len(), 2);
    assert!(store.query(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn test_ties_keep_insertion_order() {
    let mut store = VectorStore::new(10);
    for i in 0..5 {
        store
            .add(format!("d_{}", i), vec![1.0, 1.0], record("d", i))
            .unwrap();
    }
    let results = store.query(&[1.0, 1.0], 5).unwrap();
    let indices: Vec<usize> = results.iter().map(|r| r.record.chunk_idx).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_empty_store_query() {
    let store = VectorStore::new(10);
    assert!(store.query(&[1.0, 2.0], 3).unwrap().is_empty());
}

#[test]
fn test_delete_document_removes_only_its_vectors() {
    let mut store = populated();
    assert_eq!(store.count_document("a"), 2);

    assert_eq!(store.delete_document("a"), 2);
    assert_eq!(store.count(), 2);
    assert_eq!(store.count_document("a"), 0);
    assert_eq!(store.count_document("b"), 2);

    let results = store.query(&[1.0, 0.0, 0.0], 10).unwrap();
    assert!(results.iter().all(|r| r.record.doc_id == "b"));

    assert_eq!(store.delete_document("a"), 0);
    assert_eq!(store.delete_document("missing"), 0);
}

#[test]
fn test_delete_last_document_resets_dimension() {
    let mut store = populated();
    store.delete_document("a");
    store.delete_document("b");
    assert!(store.is_empty());
    assert_eq!(store.dimension(), None);

    // a new dimension may be used after the store is emptied
    store.add("c_0".to_string(), vec![1.0; 5], record("c", 0)).unwrap();
    assert_eq!(store.dimension(), Some(5));
}
