use super::*;

#[test]
fn index_entry_structure() {
    let entry = IndexEntry {
        id: "row-1".to_string(),
        vector: vec![0.1, 0.2, 0.3],
        chunk: StoredChunk {
            source_path: "data/guide.md".to_string(),
            text: "Install the tool with cargo.".to_string(),
            sequence_index: 2,
            ordinal: 7,
        },
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };

    assert_eq!(entry.vector.len(), 3);
    assert_eq!(entry.chunk.sequence_index, 2);
    assert_eq!(entry.chunk.ordinal, 7);
}

#[test]
fn stored_chunk_serialization() {
    let chunk = StoredChunk {
        source_path: "notes.txt".to_string(),
        text: "Some text".to_string(),
        sequence_index: 0,
        ordinal: 0,
    };

    let json = serde_json::to_string(&chunk).expect("can serialize json");
    let deserialized: StoredChunk = serde_json::from_str(&json).expect("can parse json");
    assert_eq!(chunk, deserialized);
}

#[test]
fn dimension_mismatch_message() {
    let error = VectorStoreError::DimensionMismatch {
        expected: 384,
        actual: 768,
    };
    assert_eq!(
        error.to_string(),
        "Vector has 768 dimensions, table expects 384"
    );
}
