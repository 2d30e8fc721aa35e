
use super::{CHUNKS_TABLE, IndexEntry, StoredChunk, VectorStoreError};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, VectorStoreError>;

/// Vector database store using LanceDB for cosine similarity search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
}

/// A stored chunk matched by a similarity search
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: StoredChunk,
    /// Cosine distance to the query (0 is identical)
    pub distance: f32,
}

impl SearchHit {
    /// Convert distance to similarity score (higher is better)
    #[inline]
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

impl VectorStore {
    /// Connect to (or create) the LanceDB database at `db_path`
    #[inline]
    pub async fn connect(db_path: &Path) -> Result<Self> {
        debug!("Connecting to LanceDB at path: {:?}", db_path);
        std::fs::create_dir_all(db_path)?;

        let uri = db_path.to_string_lossy();
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(VectorStoreError::lance("Failed to connect to LanceDB"))?;

        Ok(Self {
            connection,
            table_name: CHUNKS_TABLE.to_string(),
        })
    }

    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Whether the chunks table has been created
    #[inline]
    pub async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(VectorStoreError::lance("Failed to list tables"))?;

        Ok(table_names.contains(&self.table_name))
    }

    /// Drop any existing table and create an empty one for `vector_dim` wide vectors
    #[inline]
    pub async fn recreate_table(&self, vector_dim: usize) -> Result<()> {
        info!("Recreating table with vector dimension: {}", vector_dim);

        self.drop_table_if_exists().await?;

        self.connection
            .create_empty_table(&self.table_name, create_schema(vector_dim))
            .execute()
            .await
            .map_err(VectorStoreError::lance("Failed to create table"))?;

        Ok(())
    }

    /// Drop the chunks table if it exists
    #[inline]
    pub async fn drop_table_if_exists(&self) -> Result<()> {
        if self.table_exists().await? {
            info!("Dropping existing {} table", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(VectorStoreError::lance("Failed to drop table"))?;
        }

        Ok(())
    }

    /// Read the vector width from the existing table schema
    #[inline]
    pub async fn vector_dimension(&self) -> Result<usize> {
        let table = self.open_table().await?;
        let schema = table
            .schema()
            .await
            .map_err(VectorStoreError::lance("Failed to get table schema"))?;

        schema
            .fields()
            .iter()
            .find(|field| field.name() == "vector")
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                VectorStoreError::Schema("missing fixed-size vector column".to_string())
            })
    }

    /// Append entries to the table; every vector must match the table width
    #[inline]
    pub async fn insert(&self, entries: &[IndexEntry]) -> Result<()> {
        if entries.is_empty() {
            debug!("No entries to store");
            return Ok(());
        }

        let vector_dim = self.vector_dimension().await?;
        let record_batch = create_record_batch(entries, vector_dim)?;

        let table = self.open_table().await?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(VectorStoreError::lance("Failed to insert entries"))?;

        debug!("Stored {} entries", entries.len());
        Ok(())
    }

    /// Total number of stored chunks
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        let table = self.open_table().await?;
        table
            .count_rows(None)
            .await
            .map_err(VectorStoreError::lance("Failed to count rows"))
    }

    /// Nearest chunks by cosine distance, closest first
    #[inline]
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self.open_table().await?;
        let mut results = table
            .vector_search(query_vector)
            .map_err(VectorStoreError::lance("Failed to create vector search"))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(VectorStoreError::lance("Failed to execute search"))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(VectorStoreError::lance("Failed to read result stream"))?
        {
            hits.extend(parse_search_batch(&batch)?);
        }

        debug!("Parsed {} search results", hits.len());
        Ok(hits)
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(VectorStoreError::lance("Failed to open table"))
    }
}

fn vector_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, false))
}

/// Create schema with the specified vector dimension
fn create_schema(vector_dim: usize) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(vector_field(), vector_dim as i32),
            false,
        ),
        Field::new("source_path", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("sequence_index", DataType::UInt32, false),
        Field::new("ordinal", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(entries: &[IndexEntry], vector_dim: usize) -> Result<RecordBatch> {
    let len = entries.len();

    let mut flat_values = Vec::with_capacity(len * vector_dim);
    for entry in entries {
        if entry.vector.len() != vector_dim {
            return Err(VectorStoreError::DimensionMismatch {
                expected: vector_dim,
                actual: entry.vector.len(),
            });
        }
        flat_values.extend_from_slice(&entry.vector);
    }

    let vector_array = FixedSizeListArray::try_new(
        vector_field(),
        vector_dim as i32,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(VectorStoreError::arrow("Failed to create vector array"))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.id.as_str()),
        )),
        Arc::new(vector_array),
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.chunk.source_path.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.chunk.text.as_str()),
        )),
        Arc::new(UInt32Array::from_iter_values(
            entries.iter().map(|e| e.chunk.sequence_index),
        )),
        Arc::new(UInt32Array::from_iter_values(
            entries.iter().map(|e| e.chunk.ordinal),
        )),
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.created_at.as_str()),
        )),
    ];

    RecordBatch::try_new(create_schema(vector_dim), arrays)
        .map_err(VectorStoreError::arrow("Failed to create record batch"))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| VectorStoreError::Schema(format!("missing or invalid {name} column")))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| VectorStoreError::Schema(format!("missing or invalid {name} column")))
}

/// Parse a single record batch from search results
fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let source_paths = string_column(batch, "source_path")?;
    let texts = string_column(batch, "text")?;
    let sequence_indices = u32_column(batch, "sequence_index")?;
    let ordinals = u32_column(batch, "ordinal")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| VectorStoreError::Schema("missing _distance column".to_string()))?;

    (0..batch.num_rows())
        .map(|row| {
            if distances.is_null(row) {
                return Err(VectorStoreError::Schema(format!(
                    "null _distance in search result row {row}"
                )));
            }
            Ok(SearchHit {
                chunk: StoredChunk {
                    source_path: source_paths.value(row).to_string(),
                    text: texts.value(row).to_string(),
                    sequence_index: sequence_indices.value(row),
                    ordinal: ordinals.value(row),
                },
                distance: distances.value(row),
            })
        })
        .collect()
}
