//! Document reading and chunking for the retrieval corpus.
//!
//! This module provides:
//! - PDF discovery and text extraction
//! - Recursive, overlap-preserving chunking
//! - Chunk identifiers and metadata

pub mod chunker;
pub mod config;
pub mod reader;
pub mod types;

pub use chunker::{Chunker, RawChunk, RecursiveChunker};
pub use config::ChunkingConfig;
pub use reader::{
    DocumentError, DocumentReader, DocumentResult, PdfiumExtractor, TextExtractor, discover_pdfs,
};
pub use types::{ChunkId, ChunkMetadata, Document};
