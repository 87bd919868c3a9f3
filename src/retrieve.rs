//! Context retrieval for the answer prompt.

use std::path::Path;

use crate::error::Result;
use crate::ingest::{IngestStats, Ingestor, NoProgress};
use crate::vector::{SearchHit, VectorStore};

/// Supplies retrieved context for a query and can rebuild its corpus.
pub trait ContextRetriever: Send {
    /// Context text for `query`; empty when nothing is indexed.
    fn retrieve(&mut self, query: &str) -> Result<String>;

    /// Drop the indexed corpus and ingest `corpus` afresh.
    fn rebuild(&mut self, corpus: &Path) -> Result<IngestStats>;
}

/// Top-k nearest chunks from a [`VectorStore`].
pub struct Retriever {
    store: VectorStore,
    ingestor: Ingestor,
    top_k: usize,
}

impl Retriever {
    pub fn new(store: VectorStore, ingestor: Ingestor, top_k: usize) -> Self {
        Self {
            store,
            ingestor,
            top_k: top_k.max(1),
        }
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VectorStore {
        &mut self.store
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    /// Nearest chunks for `query`, closest first.
    pub fn hits(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        Ok(self.store.query(query, k)?)
    }

    /// The top-k chunk texts concatenated in distance order, without a
    /// separator.
    pub fn context(&self, query: &str) -> Result<String> {
        let count = self.store.count();
        tracing::debug!(target: "retrieve", "collection '{}' holds {count} chunk(s)", self.store.name());
        if count == 0 {
            return Ok(String::new());
        }

        let hits = self.hits(query, self.top_k)?;
        for hit in &hits {
            tracing::debug!(
                target: "retrieve",
                "{} similarity {:.3} ({})",
                hit.id,
                hit.similarity(),
                hit.metadata.source_doc
            );
        }

        Ok(hits.into_iter().map(|hit| hit.text).collect())
    }
}

impl ContextRetriever for Retriever {
    fn retrieve(&mut self, query: &str) -> Result<String> {
        self.context(query)
    }

    fn rebuild(&mut self, corpus: &Path) -> Result<IngestStats> {
        self.ingestor
            .reingest(&mut self.store, corpus, &NoProgress)
    }
}
