//! Core types for document ingestion.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of the textual chunk identifier (`chunk_<sequence>`).
const CHUNK_ID_PREFIX: &str = "chunk_";

/// Identifier for a chunk, unique within one ingestion run.
///
/// Rendered and persisted as `chunk_<sequence>`; sequences start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(NonZeroU32);

impl ChunkId {
    /// Create a new ChunkId from a non-zero value.
    pub fn new(value: NonZeroU32) -> Self {
        Self(value)
    }

    /// Create a ChunkId from a u32, returning None if zero.
    pub fn from_u32(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Get the sequence number.
    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CHUNK_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for ChunkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(CHUNK_ID_PREFIX)
            .and_then(|n| n.parse::<u32>().ok())
            .and_then(Self::from_u32)
            .ok_or_else(|| format!("invalid chunk id: {s}"))
    }
}

impl Serialize for ChunkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Text extracted from one source file.
///
/// Lives only for the duration of an ingestion run; the chunks derived from it
/// are what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source_path: PathBuf,
    text: String,
}

impl Document {
    pub fn new(source_path: PathBuf, text: String) -> Self {
        Self { source_path, text }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Metadata stored alongside each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document tag (`doc_<index>`, 1-based within the run).
    pub source_doc: String,

    /// Path of the file the chunk was cut from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl ChunkMetadata {
    /// Metadata for a chunk of the `doc_index`-th document (0-based input).
    pub fn for_document(doc_index: usize, source_path: &Path) -> Self {
        Self {
            source_doc: format!("doc_{}", doc_index + 1),
            source_path: Some(source_path.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_display_and_parse() {
        let id = ChunkId::from_u32(42).unwrap();
        assert_eq!(id.to_string(), "chunk_42");
        assert_eq!("chunk_42".parse::<ChunkId>().unwrap(), id);
    }

    #[test]
    fn test_chunk_id_rejects_zero_and_garbage() {
        assert!(ChunkId::from_u32(0).is_none());
        assert!("chunk_0".parse::<ChunkId>().is_err());
        assert!("block_3".parse::<ChunkId>().is_err());
        assert!("chunk_x".parse::<ChunkId>().is_err());
    }

    #[test]
    fn test_chunk_id_serializes_as_string() {
        let id = ChunkId::from_u32(7).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"chunk_7\"");
        let back: ChunkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_metadata_tags_document_index() {
        let meta = ChunkMetadata::for_document(0, Path::new("docs/faq.pdf"));
        assert_eq!(meta.source_doc, "doc_1");
        assert_eq!(meta.source_path.as_deref(), Some(Path::new("docs/faq.pdf")));
    }
}
