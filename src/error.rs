//! Crate-level error type.
//!
//! Each module owns its error enum; this type gathers them so the pipeline can
//! propagate with `?` and the orchestrator can route on the kind.

use thiserror::Error;

use crate::documents::DocumentError;
use crate::guard::GuardError;
use crate::llm::LlmError;
use crate::memory::MemoryError;
use crate::prompt::PromptError;
use crate::vector::{EmbeddingError, VectorStoreError};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// A corpus or instructions file that does not exist.
    ///
    /// The display text of these errors is shown to the user as-is.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Document(DocumentError::CorpusNotFound { .. })
                | Error::Prompt(PromptError::InstructionsNotFound { .. })
        )
    }
}

/// Result type using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
