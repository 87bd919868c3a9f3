//! Persistent chunk collection with cosine-distance lookup.
//!
//! One collection is active at a time. It lives in memory and is mirrored to
//! `<dir>/<name>.json` after every mutation. The only mutations are `add` and
//! `reset`; there is no selective delete.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::embedder::{EmbeddingError, EmbeddingGenerator, cosine_similarity};
use crate::documents::{ChunkId, ChunkMetadata};

/// Errors from vector store operations.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Duplicate chunk id: {0}")]
    DuplicateChunkId(ChunkId),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Collection '{collection}' was built with {stored}, but the configured embedder is {configured}; reset the collection"
    )]
    ModelMismatch {
        collection: String,
        stored: String,
        configured: String,
    },
}

/// Result type for vector store operations.
pub type StoreResult<T> = Result<T, VectorStoreError>;

/// One stored chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: ChunkId,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A query hit. Lower distance means closer.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

impl SearchHit {
    /// Cosine similarity (`1 - distance`).
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// On-disk form of a collection.
#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    model: String,
    dimension: usize,
    entries: Vec<VectorEntry>,
}

/// The active collection plus the embedder used for both ingestion and queries.
pub struct VectorStore {
    name: String,
    file: Option<PathBuf>,
    entries: Vec<VectorEntry>,
    ids: HashSet<ChunkId>,
    embedder: Box<dyn EmbeddingGenerator>,
}

impl VectorStore {
    /// Open (or create) the collection `name` under `dir`.
    ///
    /// Fails if the stored collection was built with a different model or
    /// dimension than `embedder`.
    pub fn open(
        dir: &Path,
        name: &str,
        embedder: Box<dyn EmbeddingGenerator>,
    ) -> StoreResult<Self> {
        std::fs::create_dir_all(dir)?;
        let file = dir.join(format!("{name}.json"));

        let entries = if file.exists() {
            let raw = std::fs::read_to_string(&file)?;
            let stored: CollectionFile = serde_json::from_str(&raw)?;

            if stored.model != embedder.model_name() || stored.dimension != embedder.dimension() {
                return Err(VectorStoreError::ModelMismatch {
                    collection: name.to_string(),
                    stored: format!("{} ({} dims)", stored.model, stored.dimension),
                    configured: format!(
                        "{} ({} dims)",
                        embedder.model_name(),
                        embedder.dimension()
                    ),
                });
            }
            stored.entries
        } else {
            Vec::new()
        };

        let store = Self {
            name: name.to_string(),
            file: Some(file),
            ids: entries.iter().map(|e| e.id).collect(),
            entries,
            embedder,
        };
        store.persist()?;

        tracing::debug!(
            target: "vector",
            "opened collection '{}' with {} entries",
            store.name,
            store.count()
        );
        Ok(store)
    }

    /// A collection that is never written to disk.
    pub fn in_memory(name: &str, embedder: Box<dyn EmbeddingGenerator>) -> Self {
        Self {
            name: name.to_string(),
            file: None,
            entries: Vec::new(),
            ids: HashSet::new(),
            embedder,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The embedder attached to this collection.
    pub fn embedder(&self) -> &dyn EmbeddingGenerator {
        self.embedder.as_ref()
    }

    /// Number of entries in the active collection.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the whole collection and start an empty one.
    pub fn reset(&mut self) -> StoreResult<()> {
        if let Some(file) = &self.file
            && file.exists()
        {
            std::fs::remove_file(file)?;
        }
        self.entries.clear();
        self.ids.clear();
        self.persist()?;

        tracing::info!(target: "vector", "reset collection '{}'", self.name);
        Ok(())
    }

    /// Append a batch of entries.
    ///
    /// The batch is all-or-nothing: if any id already exists (or repeats
    /// within the batch), or any embedding has the wrong dimension, nothing is
    /// added.
    pub fn add(&mut self, batch: Vec<VectorEntry>) -> StoreResult<()> {
        let expected = self.embedder.dimension();
        let mut incoming = HashSet::with_capacity(batch.len());

        for entry in &batch {
            if entry.embedding.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: entry.embedding.len(),
                });
            }
            if self.ids.contains(&entry.id) || !incoming.insert(entry.id) {
                return Err(VectorStoreError::DuplicateChunkId(entry.id));
            }
        }

        self.ids.extend(incoming);
        self.entries.extend(batch);
        self.persist()
    }

    /// Embed `text` and return the `k` nearest entries, closest first.
    ///
    /// An empty collection yields an empty result.
    pub fn query(&self, text: &str, k: usize) -> StoreResult<Vec<SearchHit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.generate_embedding(text)?;
        Ok(self.query_embedding(&embedding, k))
    }

    /// Nearest entries to a precomputed embedding.
    ///
    /// Ties keep insertion order.
    pub fn query_embedding(&self, embedding: &[f32], k: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(f32, &VectorEntry)> = self
            .entries
            .iter()
            .map(|entry| (1.0 - cosine_similarity(embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| SearchHit {
                id: entry.id,
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                distance,
            })
            .collect()
    }

    /// Write the collection to disk via a temporary file and rename.
    fn persist(&self) -> StoreResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let snapshot = CollectionFile {
            name: self.name.clone(),
            model: self.embedder.model_name().to_string(),
            dimension: self.embedder.dimension(),
            entries: self.entries.clone(),
        };

        let tmp = file.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&snapshot)?)?;
        std::fs::rename(&tmp, file)?;
        Ok(())
    }
}
