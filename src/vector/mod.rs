//! Embeddings and the chunk vector store.

pub mod embedder;
pub mod store;

pub use embedder::{
    EmbeddingError, EmbeddingGenerator, EmbeddingResult, FastEmbedGenerator, HASHING_MODEL_NAME,
    HashingGenerator, cosine_similarity, parse_embedding_model,
};
pub use store::{SearchHit, StoreResult, VectorEntry, VectorStore, VectorStoreError};

use crate::config::{EmbeddingConfig, Settings};

/// Build the embedder named in settings.
///
/// `hashing` selects the offline [`HashingGenerator`]; anything else is
/// treated as a fastembed model name.
pub fn generator_from_settings(
    config: &EmbeddingConfig,
    show_progress: bool,
) -> EmbeddingResult<Box<dyn EmbeddingGenerator>> {
    if config.model == HASHING_MODEL_NAME {
        return Ok(Box::new(HashingGenerator::new(config.hashing_dimension)));
    }

    let generator =
        FastEmbedGenerator::from_settings(&config.model, config.cache_dir.clone(), show_progress)?;
    Ok(Box::new(generator))
}

/// Open the configured collection with the configured embedder.
pub fn open_store(settings: &Settings, show_progress: bool) -> crate::error::Result<VectorStore> {
    let embedder = generator_from_settings(&settings.embedding, show_progress)?;
    let dir = settings.resolve(&settings.store.path);
    Ok(VectorStore::open(&dir, &settings.store.collection, embedder)?)
}
