//! Text embedding generators.
//!
//! [`FastEmbedGenerator`] wraps a pretrained sentence-embedding model;
//! [`HashingGenerator`] is a deterministic, offline feature-hashing fallback.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from embedding generation.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    ModelInit(String),

    #[error("Failed to generate embedding: {0}")]
    Generation(String),

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be deterministic for a fixed model version: the same
/// generator embeds both ingested chunks and incoming queries.
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn generate_embedding(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.generate_embeddings(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Generation("model returned no embedding".to_string()))
    }

    /// Vector dimension.
    fn dimension(&self) -> usize;

    /// Name recorded with persisted collections.
    fn model_name(&self) -> &str;
}

/// Parse a model name from settings into a fastembed model.
pub fn parse_embedding_model(name: &str) -> Option<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Some(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Some(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Some(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Some(EmbeddingModel::BGEBaseENV15),
        "MultilingualE5Small" => Some(EmbeddingModel::MultilingualE5Small),
        "ParaphraseMLMiniLML12V2" => Some(EmbeddingModel::ParaphraseMLMiniLML12V2),
        _ => None,
    }
}

/// Sentence-embedding model loaded through fastembed.
///
/// Weights are downloaded (or read from the cache directory) once, at
/// construction. Inference needs `&mut`, hence the mutex.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

impl FastEmbedGenerator {
    /// Create a generator with the default model (AllMiniLML6V2).
    pub fn new() -> EmbeddingResult<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2, "AllMiniLML6V2", None, false)
    }

    /// Create a generator from a model name in settings.
    pub fn from_settings(
        model: &str,
        cache_dir: Option<PathBuf>,
        show_progress: bool,
    ) -> EmbeddingResult<Self> {
        let embedding_model = parse_embedding_model(model)
            .ok_or_else(|| EmbeddingError::UnknownModel(model.to_string()))?;
        Self::with_model(embedding_model, model, cache_dir, show_progress)
    }

    fn with_model(
        model: EmbeddingModel,
        model_name: &str,
        cache_dir: Option<PathBuf>,
        show_progress: bool,
    ) -> EmbeddingResult<Self> {
        let mut options = InitOptions::new(model).with_show_download_progress(show_progress);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let mut text_model =
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

        // Probe once to learn the dimension.
        let dimension = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::ModelInit("model produced no probe vector".to_string()))?;

        tracing::info!(target: "vector", "loaded embedding model {model_name} ({dimension} dims)");

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
            model_name: model_name.to_string(),
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Name under which hashing collections are persisted.
pub const HASHING_MODEL_NAME: &str = "hashing";

/// Feature-hashing embedder.
///
/// Lowercased alphanumeric tokens are hashed into signed buckets and the
/// vector is L2-normalised. Texts sharing vocabulary land close together,
/// which is enough for offline use without model weights.
#[derive(Debug, Clone)]
pub struct HashingGenerator {
    dimension: usize,
}

impl HashingGenerator {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl EmbeddingGenerator for HashingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        HASHING_MODEL_NAME
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
