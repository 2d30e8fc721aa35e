// Database module
// Persistent vector storage for the embedding index (LanceDB)

pub mod lancedb;
