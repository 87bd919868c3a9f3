//! Corpus ingestion: read → chunk → embed → store.

use std::num::NonZeroU32;
use std::path::Path;

use crate::config::Settings;
use crate::documents::{
    ChunkId, ChunkMetadata, Chunker, ChunkingConfig, DocumentReader, PdfiumExtractor,
    RecursiveChunker,
};
use crate::error::{Error, Result};
use crate::vector::{VectorEntry, VectorStore};

/// Chunks embedded per call to the embedder.
pub const EMBED_BATCH_SIZE: usize = 64;

/// Totals for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub documents: usize,
    pub chunks: usize,
}

/// Progress callbacks for long ingestions.
pub trait IngestProgress {
    /// Called once the documents have been read.
    fn started(&self, _documents: usize) {}

    /// Called after each document has been stored.
    fn document_done(&self, _path: &Path, _chunks: usize) {}
}

/// Progress sink that ignores everything.
pub struct NoProgress;

impl IngestProgress for NoProgress {}

/// Turns a corpus path into entries of a [`VectorStore`].
pub struct Ingestor {
    reader: DocumentReader,
    chunker: Box<dyn Chunker>,
    config: ChunkingConfig,
}

impl Ingestor {
    /// Ingestor using the recursive chunker.
    pub fn new(reader: DocumentReader, config: ChunkingConfig) -> Result<Self> {
        Self::with_chunker(reader, Box::new(RecursiveChunker::new()), config)
    }

    pub fn with_chunker(
        reader: DocumentReader,
        chunker: Box<dyn Chunker>,
        config: ChunkingConfig,
    ) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        Ok(Self {
            reader,
            chunker,
            config,
        })
    }

    /// Pdfium-backed ingestor with the configured chunking.
    ///
    /// Pdfium is bound on the first PDF read, not here.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let extractor = PdfiumExtractor::new(settings.pdf.library_dir.as_deref());
        Self::new(
            DocumentReader::new(Box::new(extractor)),
            settings.chunking.clone(),
        )
    }

    /// Reset the collection, then ingest `path` into it.
    pub fn reingest(
        &self,
        store: &mut VectorStore,
        path: &Path,
        progress: &dyn IngestProgress,
    ) -> Result<IngestStats> {
        store.reset()?;
        self.ingest(store, path, progress)
    }

    /// Ingest every PDF at `path`.
    ///
    /// Chunk ids run from `chunk_1` across all documents of this call, so
    /// ingesting into a non-empty collection fails with a duplicate id.
    pub fn ingest(
        &self,
        store: &mut VectorStore,
        path: &Path,
        progress: &dyn IngestProgress,
    ) -> Result<IngestStats> {
        let documents = self.reader.read(path)?;
        progress.started(documents.len());

        let mut stats = IngestStats {
            documents: documents.len(),
            chunks: 0,
        };
        let mut next_id = NonZeroU32::MIN;

        for (doc_index, document) in documents.iter().enumerate() {
            let chunks = self.chunker.chunk(document.text(), &self.config);
            let metadata = ChunkMetadata::for_document(doc_index, document.source_path());

            for batch in chunks.chunks(EMBED_BATCH_SIZE) {
                let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
                let embeddings = store.embedder().generate_embeddings(&texts)?;

                let entries = batch
                    .iter()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| {
                        let id = ChunkId::new(next_id);
                        next_id = next_id.saturating_add(1);
                        VectorEntry {
                            id,
                            text: chunk.content.clone(),
                            embedding,
                            metadata: metadata.clone(),
                        }
                    })
                    .collect();
                store.add(entries)?;
            }

            tracing::debug!(
                target: "ingest",
                "{} -> {} chunk(s) as {}",
                document.source_path().display(),
                chunks.len(),
                metadata.source_doc
            );
            stats.chunks += chunks.len();
            progress.document_done(document.source_path(), chunks.len());
        }

        tracing::info!(
            target: "ingest",
            "ingested {} document(s), {} chunk(s) into '{}'",
            stats.documents,
            stats.chunks,
            store.name()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentResult, TextExtractor};
    use crate::vector::{HashingGenerator, VectorStoreError};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract_pages(&self, path: &Path) -> DocumentResult<Vec<String>> {
            Ok(vec![fs::read_to_string(path)?])
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: RefCell<Option<usize>>,
        done: RefCell<Vec<usize>>,
    }

    impl IngestProgress for Recorder {
        fn started(&self, documents: usize) {
            *self.started.borrow_mut() = Some(documents);
        }

        fn document_done(&self, _path: &Path, chunks: usize) {
            self.done.borrow_mut().push(chunks);
        }
    }

    fn ingestor() -> Ingestor {
        Ingestor::new(
            DocumentReader::new(Box::new(PlainTextExtractor)),
            ChunkingConfig::default(),
        )
        .unwrap()
    }

    fn store() -> VectorStore {
        VectorStore::in_memory("knowledge-docs", Box::new(HashingGenerator::new(256)))
    }

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "EduTrack FAQ. ".repeat(80)).unwrap();
        fs::write(dir.path().join("b.pdf"), "Short second document.").unwrap();
        dir
    }

    #[test]
    fn test_ids_run_across_documents() {
        let dir = corpus();
        let mut store = store();
        let recorder = Recorder::default();

        let stats = ingestor().ingest(&mut store, dir.path(), &recorder).unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, store.count());
        assert_eq!(*recorder.started.borrow(), Some(2));
        let per_doc = recorder.done.borrow().clone();
        assert_eq!(per_doc.iter().sum::<usize>(), stats.chunks);
        assert_eq!(*per_doc.last().unwrap(), 1);

        let hit = store.query("Short second document.", 1).unwrap();
        assert_eq!(hit[0].id.value() as usize, stats.chunks);
        assert_eq!(hit[0].metadata.source_doc, "doc_2");
    }

    #[test]
    fn test_second_ingest_without_reset_is_rejected() {
        let dir = corpus();
        let mut store = store();
        let ingestor = ingestor();
        let first = ingestor.ingest(&mut store, dir.path(), &NoProgress).unwrap();

        let err = ingestor
            .ingest(&mut store, dir.path(), &NoProgress)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::VectorStore(VectorStoreError::DuplicateChunkId(_))
        ));
        assert_eq!(store.count(), first.chunks);
    }

    #[test]
    fn test_reingest_replaces_collection() {
        let dir = corpus();
        let mut store = store();
        let ingestor = ingestor();
        let first = ingestor.ingest(&mut store, dir.path(), &NoProgress).unwrap();

        let second = ingestor
            .reingest(&mut store, dir.path(), &NoProgress)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count(), second.chunks);
    }

    #[test]
    fn test_missing_corpus_leaves_collection_empty() {
        let dir = corpus();
        let empty = TempDir::new().unwrap();
        let mut store = store();
        let ingestor = ingestor();
        ingestor.ingest(&mut store, dir.path(), &NoProgress).unwrap();

        let err = ingestor
            .reingest(&mut store, empty.path(), &NoProgress)
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_invalid_chunking_config_is_rejected() {
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        };
        let result = Ingestor::new(DocumentReader::new(Box::new(PlainTextExtractor)), config);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
