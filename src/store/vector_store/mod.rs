
use super::{EmbeddingEntry, SimilarVideo, VideoIndex};
use crate::record::VideoRecord;
use crate::{Result, ScraperError, config::Config};
use arrow::array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray,
    UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Vector database store using LanceDB, one row per video id
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    /// Vector width of the current table, `None` until the first write.
    /// Held for the whole of every write and every read, so a reader never
    /// sees an upsert between its delete and its add.
    vector_dimension: Mutex<Option<usize>>,
}

fn db_error(action: &str, error: impl std::fmt::Display) -> ScraperError {
    ScraperError::Upstream(format!("Failed to {}: {}", action, error))
}

fn id_predicate(id: &str) -> String {
    format!("id = '{}'", id.replace('\'', "''"))
}

impl VectorStore {
    /// Open the store under the configured home directory
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        Self::open(&config.vector_database_path(), &config.store.table_name).await
    }

    /// Open (or create) a store at `db_path` using `table_name`
    #[inline]
    pub async fn open(db_path: &Path, table_name: &str) -> Result<Self> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(db_path)
            .map_err(|e| db_error("create vector database directory", e))?;

        let connection = lancedb::connect(&db_path.to_string_lossy())
            .execute()
            .await
            .map_err(|e| db_error("connect to LanceDB", e))?;

        let store = Self {
            connection,
            table_name: table_name.to_string(),
            vector_dimension: Mutex::new(None),
        };

        let existing = store.detect_existing_vector_dimension().await?;
        match existing {
            Some(dim) => info!(
                "Opened table {} with vector dimension {}",
                store.table_name, dim
            ),
            None => debug!(
                "Table {} does not exist yet, it will be created on first write",
                store.table_name
            ),
        }
        *store.vector_dimension.lock().await = existing;

        Ok(store)
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| db_error("list tables", e))?;
        Ok(table_names.contains(&self.table_name))
    }

    async fn open_table(&self) -> Result<Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| db_error("open table", e))
    }

    /// Detect vector dimension from existing table schema
    async fn detect_existing_vector_dimension(&self) -> Result<Option<usize>> {
        if !self.table_exists().await? {
            return Ok(None);
        }

        let schema = self
            .open_table()
            .await?
            .schema()
            .await
            .map_err(|e| db_error("get table schema", e))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(usize::try_from(*size).ok());
                }
            }
        }

        Err(ScraperError::Upstream(format!(
            "Table {} has no fixed-size vector column",
            self.table_name
        )))
    }

    fn create_schema(vector_dim: i32) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim,
                ),
                false,
            ),
            Field::new("url", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("channel", DataType::Utf8, false),
            // JSON-encoded list of strings
            Field::new("tags", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, true),
            Field::new("published", DataType::Utf8, false),
            Field::new("duration", DataType::Utf8, false),
            Field::new("views", DataType::UInt64, false),
            Field::new("likes", DataType::UInt64, false),
            Field::new("comments", DataType::UInt64, false),
            Field::new("indexed_at", DataType::Utf8, false),
        ]))
    }

    /// Drop any existing table and create an empty one with the given vector width
    async fn recreate_table(&self, vector_dim: usize) -> Result<()> {
        let width = i32::try_from(vector_dim)
            .map_err(|_| ScraperError::Upstream(format!("Vector too wide: {}", vector_dim)))?;

        if self.table_exists().await? {
            info!("Dropping existing table {}", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| db_error("drop table", e))?;
        }

        self.connection
            .create_empty_table(&self.table_name, Self::create_schema(width))
            .execute()
            .await
            .map_err(|e| db_error("create table", e))?;

        info!(
            "Created table {} with {} dimensions",
            self.table_name, vector_dim
        );
        Ok(())
    }

    fn create_record_batch(entry: &EmbeddingEntry, vector_dim: usize) -> Result<RecordBatch> {
        let width = i32::try_from(vector_dim)
            .map_err(|_| ScraperError::Upstream(format!("Vector too wide: {}", vector_dim)))?;
        let record = &entry.metadata;

        let tags = serde_json::to_string(&record.tags).map_err(|e| db_error("encode tags", e))?;
        let indexed_at = chrono::Utc::now().to_rfc3339();

        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let values = Float32Array::from(entry.vector.clone());
        let vector_array = FixedSizeListArray::try_new(field, width, Arc::new(values), None)
            .map_err(|e| db_error("create vector array", e))?;

        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![entry.id.as_str()])),
            Arc::new(vector_array),
            Arc::new(StringArray::from(vec![record.url.as_str()])),
            Arc::new(StringArray::from(vec![record.title.as_str()])),
            Arc::new(StringArray::from(vec![record.description.as_str()])),
            Arc::new(StringArray::from(vec![record.channel.as_str()])),
            Arc::new(StringArray::from(vec![tags.as_str()])),
            Arc::new(StringArray::from(vec![record.category.as_deref()])),
            Arc::new(StringArray::from(vec![record.published.as_str()])),
            Arc::new(StringArray::from(vec![record.duration.as_str()])),
            Arc::new(UInt64Array::from(vec![record.views])),
            Arc::new(UInt64Array::from(vec![record.likes])),
            Arc::new(UInt64Array::from(vec![record.comments])),
            Arc::new(StringArray::from(vec![indexed_at.as_str()])),
        ];

        RecordBatch::try_new(Self::create_schema(width), arrays)
            .map_err(|e| db_error("create record batch", e))
    }

    /// Total number of stored videos
    #[inline]
    pub async fn count_entries(&self) -> Result<u64> {
        self.count_where(None).await
    }

    /// Number of rows stored under `id`; 0 or 1 while upserts hold
    #[inline]
    pub async fn count_entries_for(&self, id: &str) -> Result<u64> {
        self.count_where(Some(id_predicate(id))).await
    }

    async fn count_where(&self, filter: Option<String>) -> Result<u64> {
        let _guard = self.vector_dimension.lock().await;
        if !self.table_exists().await? {
            return Ok(0);
        }

        let count = self
            .open_table()
            .await?
            .count_rows(filter)
            .await
            .map_err(|e| db_error("count rows", e))?;

        Ok(count as u64)
    }

    /// Load the stored entry for one video
    #[inline]
    pub async fn get_entry(&self, id: &str) -> Result<Option<EmbeddingEntry>> {
        let _guard = self.vector_dimension.lock().await;
        if !self.table_exists().await? {
            return Ok(None);
        }

        let stream = self
            .open_table()
            .await?
            .query()
            .only_if(id_predicate(id))
            .limit(1)
            .execute()
            .await
            .map_err(|e| db_error("query entry", e))?;

        let rows = Self::collect_rows(stream).await?;
        Ok(rows.into_iter().next().map(|(entry, _)| entry))
    }

    /// Nearest stored videos to `query_vector`, closest first
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarVideo>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let _guard = self.vector_dimension.lock().await;
        if !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let stream = self
            .open_table()
            .await?
            .vector_search(query_vector)
            .map_err(|e| db_error("create vector search", e))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| db_error("execute search", e))?;

        let results = Self::collect_rows(stream)
            .await?
            .into_iter()
            .map(|(entry, distance)| SimilarVideo {
                record: entry.metadata,
                distance: distance.unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        debug!("Found {} similar videos", results.len());
        Ok(results)
    }

    async fn collect_rows(
        mut stream: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<(EmbeddingEntry, Option<f32>)>> {
        let mut rows = Vec::new();

        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| db_error("read result stream", e))?
        {
            rows.extend(Self::parse_batch(&batch)?);
        }

        Ok(rows)
    }

    fn parse_batch(batch: &RecordBatch) -> Result<Vec<(EmbeddingEntry, Option<f32>)>> {
        let ids = string_column(batch, "id")?;
        let vectors = batch
            .column_by_name("vector")
            .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| ScraperError::Upstream("Missing or invalid vector column".to_string()))?;
        let urls = string_column(batch, "url")?;
        let titles = string_column(batch, "title")?;
        let descriptions = string_column(batch, "description")?;
        let channels = string_column(batch, "channel")?;
        let tags = string_column(batch, "tags")?;
        let categories = string_column(batch, "category")?;
        let published = string_column(batch, "published")?;
        let durations = string_column(batch, "duration")?;
        let views = u64_column(batch, "views")?;
        let likes = u64_column(batch, "likes")?;
        let comments = u64_column(batch, "comments")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let vector = vectors
                .value(row)
                .as_any()
                .downcast_ref::<Float32Array>()
                .map(|values| values.values().to_vec())
                .ok_or_else(|| ScraperError::Upstream("Invalid vector item type".to_string()))?;

            let record = VideoRecord {
                video_id: ids.value(row).to_string(),
                url: urls.value(row).to_string(),
                title: titles.value(row).to_string(),
                description: descriptions.value(row).to_string(),
                channel: channels.value(row).to_string(),
                tags: serde_json::from_str(tags.value(row))
                    .map_err(|e| db_error("decode tags", e))?,
                category: (!categories.is_null(row)).then(|| categories.value(row).to_string()),
                published: published.value(row).to_string(),
                duration: durations.value(row).to_string(),
                views: views.value(row),
                likes: likes.value(row),
                comments: comments.value(row),
            };

            let distance = distances.and_then(|d| (!d.is_null(row)).then(|| d.value(row)));

            rows.push((EmbeddingEntry::new(vector, record), distance));
        }

        Ok(rows)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ScraperError::Upstream(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ScraperError::Upstream(format!("Invalid {} column type", name)))
}

fn u64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ScraperError::Upstream(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| ScraperError::Upstream(format!("Invalid {} column type", name)))
}

#[async_trait]
impl VideoIndex for VectorStore {
    async fn upsert(&self, entry: EmbeddingEntry) -> Result<()> {
        let vector_dim = entry.vector.len();
        if vector_dim == 0 {
            return Err(ScraperError::Upstream(format!(
                "Refusing to store an empty embedding for video {}",
                entry.id
            )));
        }

        let mut dimension = self.vector_dimension.lock().await;

        if *dimension != Some(vector_dim) {
            if let Some(previous) = *dimension {
                warn!(
                    "Vector dimension changed from {} to {}, recreating table {}",
                    previous, vector_dim, self.table_name
                );
            }
            self.recreate_table(vector_dim).await?;
            *dimension = Some(vector_dim);
        }

        let table = self.open_table().await?;

        // Replace, never append: clear any previous row for this id first
        table
            .delete(&id_predicate(&entry.id))
            .await
            .map_err(|e| db_error("delete previous entry", e))?;

        let record_batch = Self::create_record_batch(&entry, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| db_error("insert entry", e))?;

        debug!("Upserted embedding for video {}", entry.id);
        Ok(())
    }
}
