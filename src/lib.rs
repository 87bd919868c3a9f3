//! Retrieval-augmented question answering over a local PDF corpus.
//!
//! Queries are screened for personal data, answered from the nearest corpus
//! chunks by a hosted model, and remembered in a conversation log.

pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod guard;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod messages;
pub mod orchestrator;
pub mod prompt;
pub mod retrieve;
pub mod vector;

pub use config::Settings;
pub use error::{Error, Result};
pub use guard::{Guard, PiiGuard};
pub use ingest::{IngestStats, Ingestor};
pub use llm::ChatModel;
pub use memory::ConversationMemory;
pub use orchestrator::{ChatRequest, FailureKind, Orchestrator, OrchestratorOptions, Outcome};
pub use retrieve::{ContextRetriever, Retriever};
pub use vector::{EmbeddingGenerator, VectorStore};
